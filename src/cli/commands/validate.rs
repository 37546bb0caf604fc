//! Validate command
//!
//! Checks a secret descriptor offline.

use super::{read_document, CommandContext};
use anyhow::Result;
use clap::Parser;
use keydra_iam::iam::{AwsIamClient, IamProvider};
use keydra_iam::provider::RotationProvider;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Secret descriptor (YAML or JSON)
    pub secret_file: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let document = match read_document(Some(self.secret_file.as_path())) {
            Ok(doc) => doc,
            Err(e) => {
                ctx.output.error(&format!("{:#}", e));
                return Ok(1);
            }
        };

        let (valid, message) = IamProvider::<AwsIamClient>::validate_spec(&document);
        if valid {
            ctx.output.plain(&message);
            Ok(0)
        } else {
            ctx.output.error(&message);
            Ok(1)
        }
    }
}
