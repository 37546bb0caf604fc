//! Error types for keydra-iam.
//!
//! Provider and identity-service failures have their own error types
//! ([`ProviderError`], [`IamError`](crate::iam::IamError)); this one covers
//! the layers around them: configuration, files and logging setup.

use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

/// Result type alias for keydra-iam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for keydra-iam.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration or logging setup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration file could not be parsed.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // File Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// Rotation, distribution or descriptor failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl Error {
    /// Creates a new config parse error.
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::ConfigParse { .. } | Error::FileNotFound(_) => 2,
            _ => 1,
        }
    }
}
