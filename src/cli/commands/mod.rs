//! Subcommands module for keydra-iam CLI
//!
//! This module contains all the subcommand implementations.

pub mod distribute;
pub mod redact;
pub mod rotate;
pub mod validate;

use crate::cli::output::OutputFormatter;
use anyhow::{Context, Result};
use keydra_iam::config::Config;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Verbosity level
    pub verbosity: u8,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let output = OutputFormatter::new(config.logging.ansi_colors, cli.verbosity());

        Self {
            config,
            output,
            verbosity: cli.verbosity(),
        }
    }
}

/// Read a YAML or JSON document from `path`, or from stdin when absent.
pub fn read_document(path: Option<&Path>) -> Result<Value> {
    let (content, source) = match path {
        Some(path) => (
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            (content, "stdin".to_string())
        }
    };

    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", source))
}
