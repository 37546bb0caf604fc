//! Error types for calls against the identity service.

use thiserror::Error;

/// Result type for identity-service operations.
pub type IamResult<T> = std::result::Result<T, IamError>;

/// Errors returned by an [`IamApi`](super::api::IamApi) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IamError {
    /// The requested entity does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Entity kind (user, access key, ...)
        kind: &'static str,
        /// Entity name or id
        name: String,
    },

    /// The service rejected or failed the call.
    #[error("{operation} failed: {message}")]
    Service {
        /// The API operation that failed
        operation: &'static str,
        /// Error message from the service
        message: String,
    },

    /// The service answered without a field the caller depends on.
    #[error("{operation} response is missing '{field}'")]
    MissingField {
        /// The API operation
        operation: &'static str,
        /// The absent field
        field: &'static str,
    },
}

impl IamError {
    /// Create a not-found error for a user.
    pub fn user_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "user",
            name: name.into(),
        }
    }

    /// Create a service error.
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IamError::NotFound { .. })
    }

    /// Name of the operation that produced this error, if known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            IamError::Service { operation, .. } | IamError::MissingField { operation, .. } => {
                Some(operation)
            }
            IamError::NotFound { .. } => None,
        }
    }
}
