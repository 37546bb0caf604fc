//! Rotate command
//!
//! Loads a secret descriptor, rotates the user's access keys and prints
//! the result envelope.

use super::{read_document, CommandContext};
use anyhow::Result;
use clap::Parser;
use keydra_iam::iam::{
    AwsIamClient, IamProvider, IamSecretSpec, Outcome, RotationReport, PROVIDER_NAME,
};
use keydra_iam::provider::{RotationProvider, SecretSpec};
use std::path::PathBuf;

/// Arguments for the rotate command
#[derive(Parser, Debug, Clone)]
pub struct RotateArgs {
    /// Secret descriptor (YAML or JSON)
    pub secret_file: PathBuf,

    /// Print the new secret instead of masking it
    #[arg(long)]
    pub reveal: bool,
}

impl RotateArgs {
    /// Execute the rotate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let document = match read_document(Some(self.secret_file.as_path())) {
            Ok(doc) => doc,
            Err(e) => {
                ctx.output.error(&format!("{:#}", e));
                return Ok(1);
            }
        };

        let (valid, message) = IamProvider::<AwsIamClient>::validate_spec(&document);
        if !valid {
            ctx.output.error(&format!("Invalid secret spec: {}", message));
            return Ok(1);
        }

        let secret: IamSecretSpec = match SecretSpec::from_value(document) {
            Ok(secret) => secret,
            Err(e) => {
                ctx.output.error(&e.to_string());
                return Ok(1);
            }
        };
        if let Some(provider) = &secret.provider {
            if !provider.eq_ignore_ascii_case(PROVIDER_NAME) {
                ctx.output.error(&format!(
                    "Secret '{}' is for provider '{}', not '{}'",
                    secret.key, provider, PROVIDER_NAME
                ));
                return Ok(1);
            }
        }

        let provider = IamProvider::from_config(&ctx.config).await;
        let report = match provider.rotate_with_report(&secret).await {
            Ok(report) => report,
            Err(e) => {
                ctx.output.error(&e.to_string());
                return Ok(1);
            }
        };

        print_summary(ctx, &secret.key, &report);

        let envelope = report.result.into_envelope();
        let envelope = if self.reveal {
            envelope
        } else {
            IamProvider::<AwsIamClient>::redact_result(envelope, None)
        };
        ctx.output.result(&envelope)?;
        Ok(0)
    }
}

fn print_summary(ctx: &CommandContext, user: &str, report: &RotationReport) {
    ctx.output.info(&format!("User '{}': {:?}", user, report.user));

    if let Some(candidate) = &report.candidate {
        ctx.output.info(&format!(
            "Deleted access key {} ({})",
            candidate.key.access_key_id, candidate.reason
        ));
    }
    if let Some(key) = &report.deactivated {
        ctx.output.info(&format!("Deactivated access key {}", key));
    }

    for (step, outcome) in [("groups", &report.groups), ("policies", &report.policies)] {
        if let Some(reason) = &outcome.skipped {
            ctx.output
                .warning(&format!("Skipped {} reconciliation: {}", step, reason));
        }
        for item in &outcome.outcomes {
            match &item.outcome {
                Outcome::Ok => ctx
                    .output
                    .info(&format!("{} {}", item.action, item.target)),
                Outcome::Failed(reason) => ctx.output.warning(&format!(
                    "{} {} failed: {}",
                    item.action, item.target, reason
                )),
            }
        }
    }
}
