//! # keydra-iam - IAM access-key rotation for Keydra
//!
//! keydra-iam is the IAM provider of a secret rotation pipeline. For each
//! secret it manages one IAM user: the user is created on first use and
//! tagged `managedby=keydra`, at most one old key is retired per run, the
//! surviving key is deactivated, and a fresh key is issued. Group
//! memberships and managed policy attachments are reconciled to the
//! configured sets on the way.
//!
//! ## Architecture Overview
//!
//! ```text
//! +-----------------------------------------------------------+
//! |                      CLI (keydra-iam)                     |
//! |            rotate / validate / redact / distribute        |
//! +-----------------------------------------------------------+
//!                              |
//!                              v
//! +-----------------------------------------------------------+
//! |                 provider::RotationProvider                |
//! +-----------------------------------------------------------+
//!                              |
//!                              v
//! +-----------------------------------------------------------+
//! |   iam::IamProvider  (retry -> user -> keys -> reconcile)  |
//! +-----------------------------------------------------------+
//!                              |
//!                              v
//! +-----------------------------------------------------------+
//! |        iam::IamApi  (AwsIamClient: aws-sdk-iam/sts)       |
//! +-----------------------------------------------------------+
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use keydra_iam::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let provider = IamProvider::from_config(&config).await;
//!
//!     let secret = IamSecretSpec::new("svc-a")
//!         .with_config(IamOptions::default().with_groups(["readers"]));
//!
//!     let result = provider.rotate(&secret).await?;
//!     println!("{}", IamProvider::<AwsIamClient>::redact_result(result.into_envelope(), None));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod iam;
pub mod provider;
pub mod retry;
pub mod telemetry;

/// Commonly used types.
pub mod prelude {
    pub use crate::config::{AwsSettings, Config, RetrySettings};
    pub use crate::error::{Error, Result};
    pub use crate::iam::{
        AwsIamClient, IamApi, IamError, IamOptions, IamProvider, IamSecretSpec, RotationReport,
    };
    pub use crate::provider::{
        ProviderError, ProviderResult, RotationProvider, RotationResult, SecretSpec,
        SensitiveString,
    };
    pub use crate::retry::RetryPolicy;
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
