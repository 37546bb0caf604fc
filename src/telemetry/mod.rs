//! Logging setup.
//!
//! Everything in the crate logs through `tracing` macros with structured
//! fields. This module installs the subscriber that renders them.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use keydra_iam::telemetry::{self, LogFormat, LogLevel, LoggingConfig};
//!
//! telemetry::init(&LoggingConfig {
//!     level: LogLevel::Info,
//!     format: LogFormat::Json,
//!     ..LoggingConfig::default()
//! })?;
//!
//! tracing::info!(user = %user, "Rotating access keys");
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use logging::{init, init_from_verbosity, layer};
