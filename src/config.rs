//! Configuration module for keydra-iam
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/keydra/keydra-iam.toml)
//! - User configuration (~/.keydra/keydra-iam.toml)
//! - Project configuration (./keydra-iam.toml)
//! - Environment variables
//! - Command-line arguments (applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::iam::DEFAULT_PARTITION;
use crate::telemetry::LoggingConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS client settings
    pub aws: AwsSettings,

    /// Retry settings for rotations
    pub retry: RetrySettings,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// AWS client settings. Unset values fall back to the standard AWS chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    /// Region override
    pub region: Option<String>,

    /// Named profile from the shared config files
    pub profile: Option<String>,

    /// Endpoint override, for IAM-compatible test services
    pub endpoint_url: Option<String>,

    /// Partition used to build policy ARNs
    pub partition: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            endpoint_url: None,
            partition: DEFAULT_PARTITION.to_string(),
        }
    }
}

/// Retry settings. `max_attempts` counts the first call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total number of calls per rotation
    pub max_attempts: u32,

    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Upper bound for any delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Growth factor between delays
    pub multiplier: f64,

    /// Randomize delays
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
        }

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/keydra/keydra-iam.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".keydra/keydra-iam.toml"));
        }

        paths.push(PathBuf::from("keydra-iam.toml"));
        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let parse_error = |message: String| Error::config_parse(path, message);

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            _ => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one. Values set in `other` win.
    fn merge(&self, other: Config) -> Config {
        let aws = AwsSettings {
            region: other.aws.region.or_else(|| self.aws.region.clone()),
            profile: other.aws.profile.or_else(|| self.aws.profile.clone()),
            endpoint_url: other
                .aws
                .endpoint_url
                .or_else(|| self.aws.endpoint_url.clone()),
            partition: if other.aws.partition != DEFAULT_PARTITION {
                other.aws.partition
            } else {
                self.aws.partition.clone()
            },
        };

        Config {
            aws,
            retry: if other.retry != RetrySettings::default() {
                other.retry
            } else {
                self.retry.clone()
            },
            logging: if other.logging != LoggingConfig::default() {
                other.logging
            } else {
                self.logging.clone()
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // KEYDRA_IAM_REGION
        if let Ok(region) = std::env::var("KEYDRA_IAM_REGION") {
            self.aws.region = Some(region);
        }

        // KEYDRA_IAM_PROFILE
        if let Ok(profile) = std::env::var("KEYDRA_IAM_PROFILE") {
            self.aws.profile = Some(profile);
        }

        // KEYDRA_IAM_ENDPOINT_URL
        if let Ok(endpoint) = std::env::var("KEYDRA_IAM_ENDPOINT_URL") {
            self.aws.endpoint_url = Some(endpoint);
        }

        // KEYDRA_IAM_PARTITION
        if let Ok(partition) = std::env::var("KEYDRA_IAM_PARTITION") {
            self.aws.partition = partition;
        }

        // KEYDRA_IAM_MAX_ATTEMPTS
        if let Ok(attempts) = std::env::var("KEYDRA_IAM_MAX_ATTEMPTS") {
            match attempts.parse() {
                Ok(n) => self.retry.max_attempts = n,
                Err(_) => tracing::warn!(value = %attempts, "Ignoring invalid KEYDRA_IAM_MAX_ATTEMPTS"),
            }
        }

        // KEYDRA_IAM_LOG_FORMAT
        if let Ok(format) = std::env::var("KEYDRA_IAM_LOG_FORMAT") {
            match format.parse() {
                Ok(f) => self.logging.format = f,
                Err(e) => tracing::warn!(error = %e, "Ignoring invalid KEYDRA_IAM_LOG_FORMAT"),
            }
        }
    }

    /// Load from a specific file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}
