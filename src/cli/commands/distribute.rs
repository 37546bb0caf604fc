//! Distribute command
//!
//! IAM keys are never pushed anywhere by this provider; the command exists
//! so pipelines get the same answer from the CLI as from the library.

use super::{read_document, CommandContext};
use anyhow::{Context, Result};
use clap::Parser;
use keydra_iam::iam::IamProvider;
use keydra_iam::provider::{RotationProvider, RotationResult};
use serde_json::Value;
use std::path::PathBuf;

/// Arguments for the distribute command
#[derive(Parser, Debug, Clone)]
pub struct DistributeArgs {
    /// Rotation result envelope
    pub result_file: PathBuf,

    /// Destination descriptor as inline JSON
    #[arg(long, default_value = "{}")]
    pub destination: String,
}

impl DistributeArgs {
    /// Execute the distribute command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let envelope = read_document(Some(self.result_file.as_path()))?;
        let result = RotationResult::from_envelope(&envelope)?;
        let destination: Value =
            serde_json::from_str(&self.destination).context("Invalid --destination JSON")?;

        let provider = IamProvider::from_config(&ctx.config).await;
        match provider.distribute(&result, &destination).await {
            Ok(()) => Ok(0),
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(1)
            }
        }
    }
}
