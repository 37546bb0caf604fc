//! Error types for rotation providers.

use thiserror::Error;

use crate::iam::IamError;

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while rotating or distributing a secret.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Secret rotation failed.
    #[error("Rotation failed for secret '{secret}': {message}")]
    Rotation {
        /// The secret key
        secret: String,
        /// Error message
        message: String,
        /// Underlying service error
        #[source]
        source: Option<IamError>,
    },

    /// The provider cannot distribute secrets.
    #[error("Distribution not supported: {0}")]
    Distribution(String),

    /// The secret descriptor is malformed.
    #[error("Invalid secret spec: {0}")]
    InvalidSpec(String),
}

impl ProviderError {
    /// Create a new rotation error.
    pub fn rotation(secret: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rotation {
            secret: secret.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an identity-service failure as a rotation error.
    pub fn from_iam(secret: impl Into<String>, err: IamError) -> Self {
        Self::Rotation {
            secret: secret.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Check if the whole call may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Rotation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_rotation_error_display() {
        let err = ProviderError::rotation("svc-a", "boom");
        assert_eq!(err.to_string(), "Rotation failed for secret 'svc-a': boom");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rotation_error_keeps_source() {
        let err = ProviderError::from_iam("svc-a", IamError::service("ListAccessKeys", "denied"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("ListAccessKeys failed: denied"));
    }

    #[test]
    fn test_distribution_not_retryable() {
        let err = ProviderError::Distribution("IAM does not support distribution".into());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("not supported"));
    }
}
