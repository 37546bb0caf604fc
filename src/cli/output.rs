//! Terminal output for keydra-iam
//!
//! Command results go to stdout as JSON. Messages go to stderr so that
//! stdout can be piped straight into another tool.

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

/// Output formatter for command results and messages
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            verbosity,
        }
    }

    /// Print a JSON document on stdout
    pub fn result(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a plain line on stdout
    pub fn plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }
}
