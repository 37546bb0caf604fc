//! CLI module for keydra-iam
//!
//! Argument parsing, global overrides and subcommand dispatch.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use keydra_iam::config::Config;
use keydra_iam::telemetry::LogFormat;
use std::path::PathBuf;

/// keydra-iam - rotate IAM user access keys
///
/// Each secret descriptor names one IAM user. Rotation keeps the user,
/// its tags, groups and managed policies in shape and issues a new key.
#[derive(Parser, Debug, Clone)]
#[command(name = "keydra-iam")]
#[command(author = "Keydra Contributors")]
#[command(version)]
#[command(about = "Rotate AWS IAM user access keys", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "KEYDRA_IAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// AWS region override
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Rotate the access keys of the user described by a secret file
    Rotate(commands::rotate::RotateArgs),

    /// Check a secret file without touching AWS
    Validate(commands::validate::ValidateArgs),

    /// Mask the secret in a rotation result
    Redact(commands::redact::RedactArgs),

    /// Push a rotation result to a destination (not supported by IAM)
    Distribute(commands::distribute::DistributeArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(region) = &self.region {
            config.aws.region = Some(region.clone());
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if self.no_color || std::env::var("NO_COLOR").is_ok() {
            config.logging.ansi_colors = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["keydra-iam", "rotate", "secret.yml"]).unwrap();
        assert!(matches!(cli.command, Commands::Rotate(ref args) if !args.reveal));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["keydra-iam", "-vvvv", "validate", "secret.yml"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_redact_file_is_optional() {
        let cli = Cli::try_parse_from(["keydra-iam", "redact"]).unwrap();
        assert!(matches!(cli.command, Commands::Redact(ref args) if args.result_file.is_none()));
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "keydra-iam",
            "rotate",
            "secret.yml",
            "--reveal",
            "--region",
            "eu-west-1",
            "--log-format",
            "json",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Rotate(ref args) if args.reveal));
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        assert!(Cli::try_parse_from(["keydra-iam", "--log-format", "xml", "redact"]).is_err());
    }
}
