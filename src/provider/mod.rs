//! The rotation provider contract.
//!
//! A provider knows how to rotate one kind of secret. The pipeline hands it
//! a [`SecretSpec`], gets back a [`RotationResult`], and uses the provider's
//! stateless helpers to validate descriptors up front and to redact results
//! before they are printed.
//!
//! ```text
//! +-------------------+
//! |  pipeline / CLI   |
//! +-------------------+
//!     | validate_spec     | rotate            | redact_result
//!     v                   v                   v
//! +-----------------------------------------------------+
//! |            RotationProvider (trait)                 |
//! +-----------------------------------------------------+
//!                         ^
//!                         |
//!                 +---------------+      +---------+
//!                 |  IamProvider  |----->| IamApi  |
//!                 +---------------+      +---------+
//! ```

mod error;
mod no_log;
mod result;
mod spec;

pub use error::{ProviderError, ProviderResult};
pub use no_log::{SensitiveString, REDACTED_PLACEHOLDER};
pub use result::{redact_envelope, RotationResult, SECRET_FIELD};
pub use spec::{parse_spec_document, validate_base_spec, SecretSpec, VALID_SPEC_MESSAGE};

pub(crate) use spec::is_blank;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for rotation provider implementations.
#[async_trait]
pub trait RotationProvider: Send + Sync {
    /// Provider-specific options carried in `SecretSpec::config`.
    type Config: DeserializeOwned + Send + Sync;

    /// Provider name, as written in result envelopes.
    fn name(&self) -> &'static str;

    /// Replace the credentials described by `secret` with new ones.
    async fn rotate(&self, secret: &SecretSpec<Self::Config>) -> ProviderResult<RotationResult>;

    /// Push rotated credentials to a destination.
    async fn distribute(&self, secret: &RotationResult, destination: &Value)
        -> ProviderResult<()>;

    /// Check a raw descriptor. Returns `(true, "All good!")` or `(false, reason)`.
    fn validate_spec(spec: &Value) -> (bool, String)
    where
        Self: Sized;

    /// Mask secret material in a result envelope for safe printing.
    fn redact_result(result: Value, spec: Option<&Value>) -> Value
    where
        Self: Sized;

    /// Whether the provider needs credentials supplied by the pipeline.
    fn has_creds() -> bool
    where
        Self: Sized;
}
