//! Redact command

use super::{read_document, CommandContext};
use anyhow::Result;
use clap::Parser;
use keydra_iam::iam::{AwsIamClient, IamProvider};
use keydra_iam::provider::RotationProvider;
use std::path::PathBuf;

/// Arguments for the redact command
#[derive(Parser, Debug, Clone)]
pub struct RedactArgs {
    /// Rotation result envelope; read from stdin when omitted
    pub result_file: Option<PathBuf>,
}

impl RedactArgs {
    /// Execute the redact command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let result = match read_document(self.result_file.as_deref()) {
            Ok(doc) => doc,
            Err(e) => {
                ctx.output.error(&format!("{:#}", e));
                return Ok(1);
            }
        };

        let redacted = IamProvider::<AwsIamClient>::redact_result(result, None);
        ctx.output.result(&redacted)?;
        Ok(0)
    }
}
