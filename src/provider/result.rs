//! Rotation results and their redaction.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use super::error::{ProviderError, ProviderResult};
use super::no_log::{SensitiveString, REDACTED_PLACEHOLDER};

/// Field of a result that holds the secret material.
pub const SECRET_FIELD: &str = "secret";

/// Fresh credentials produced by a rotation.
///
/// Serializes with the secret in clear: the serialized form is what the
/// pipeline stores. Use [`redact_envelope`] before printing or logging it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationResult {
    /// Provider that produced the credentials
    pub provider: String,
    /// Public part (for IAM, the access key id)
    pub key: String,
    /// Secret part
    pub secret: SensitiveString,
}

impl RotationResult {
    /// Create a result.
    pub fn new(
        provider: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<SensitiveString>,
    ) -> Self {
        Self {
            provider: provider.into(),
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Wrap the result the way the pipeline passes results around: `{"value": {...}}`.
    pub fn into_envelope(self) -> Value {
        json!({
            "value": {
                "provider": self.provider,
                "key": self.key,
                SECRET_FIELD: self.secret.into_inner(),
            }
        })
    }

    /// Read a result back from its envelope.
    pub fn from_envelope(envelope: &Value) -> ProviderResult<Self> {
        let value = envelope
            .get("value")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::InvalidSpec("result has no 'value' mapping".into()))?;

        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| ProviderError::InvalidSpec(format!("result is missing '{}'", name)))
        };

        Ok(Self::new(field("provider")?, field("key")?, field(SECRET_FIELD)?))
    }
}

impl Serialize for RotationResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("RotationResult", 3)?;
        state.serialize_field("provider", &self.provider)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field(SECRET_FIELD, self.secret.expose())?;
        state.end()
    }
}

/// Mask `value.secret` in a result envelope. Anything else is left as is.
pub fn redact_envelope(mut result: Value) -> Value {
    if let Some(secret) = result
        .get_mut("value")
        .and_then(Value::as_object_mut)
        .and_then(|value| value.get_mut(SECRET_FIELD))
    {
        *secret = Value::String(REDACTED_PLACEHOLDER.to_string());
    }
    result
}
