//! Secret descriptors and the structural checks shared by every provider.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ProviderError, ProviderResult};

/// Message returned for a spec that passes validation.
pub const VALID_SPEC_MESSAGE: &str = "All good!";

/// A logical secret handed to a provider by the rotation pipeline.
///
/// `key` names the thing being rotated (for IAM, the user name); `config`
/// carries provider-specific options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretSpec<C> {
    /// Identifier of the secret within its provider
    pub key: String,

    /// Provider name, when the descriptor names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider-specific options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<C>,
}

impl<C> SecretSpec<C> {
    /// Create a spec without options.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            provider: None,
            config: None,
        }
    }

    /// Attach provider options.
    pub fn with_config(mut self, config: C) -> Self {
        self.config = Some(config);
        self
    }
}

impl<C: DeserializeOwned> SecretSpec<C> {
    /// Build a typed spec from a raw descriptor.
    pub fn from_value(value: Value) -> ProviderResult<Self> {
        serde_json::from_value(value).map_err(|e| ProviderError::InvalidSpec(e.to_string()))
    }
}

/// Parse a descriptor document. YAML is accepted, and so JSON is too.
pub fn parse_spec_document(content: &str) -> ProviderResult<Value> {
    serde_yaml::from_str::<Value>(content).map_err(|e| ProviderError::InvalidSpec(e.to_string()))
}

/// Structural checks every provider applies before its own.
pub fn validate_base_spec(spec: &Value) -> (bool, String) {
    let Some(map) = spec.as_object() else {
        return (false, "Secret spec must be a mapping".to_string());
    };

    match map.get("key") {
        None => return (false, "Missing required field 'key'".to_string()),
        Some(Value::String(key)) if !key.trim().is_empty() => {}
        Some(_) => return (false, "'key' must be a non-empty string".to_string()),
    }

    if let Some(provider) = map.get("provider") {
        if !provider.is_string() {
            return (false, "'provider' must be a string".to_string());
        }
    }

    if let Some(config) = map.get("config") {
        if !config.is_object() && !config.is_null() {
            return (false, "'config' must be a mapping".to_string());
        }
    }

    (true, VALID_SPEC_MESSAGE.to_string())
}

/// Whether a value counts as "not provided" for option type checks.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_spec_valid() {
        let (valid, msg) = validate_base_spec(&json!({"key": "svc-a", "provider": "iam"}));
        assert!(valid);
        assert_eq!(msg, "All good!");
    }

    #[test]
    fn test_base_spec_requires_mapping() {
        let (valid, msg) = validate_base_spec(&json!(["svc-a"]));
        assert!(!valid);
        assert!(msg.contains("mapping"));
    }

    #[test]
    fn test_base_spec_requires_key() {
        assert!(!validate_base_spec(&json!({"provider": "iam"})).0);
        assert!(!validate_base_spec(&json!({"key": ""})).0);
        assert!(!validate_base_spec(&json!({"key": 42})).0);
    }

    #[test]
    fn test_base_spec_rejects_non_mapping_config() {
        let (valid, msg) = validate_base_spec(&json!({"key": "svc-a", "config": "nope"}));
        assert!(!valid);
        assert_eq!(msg, "'config' must be a mapping");

        assert!(validate_base_spec(&json!({"key": "svc-a", "config": null})).0);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct NoDefault {
        level: u8,
    }

    #[test]
    fn test_from_value_without_default_options() {
        let spec: SecretSpec<NoDefault> = SecretSpec::from_value(json!({"key": "svc-a"})).unwrap();
        assert_eq!(spec.config, None);

        let spec: SecretSpec<NoDefault> =
            SecretSpec::from_value(json!({"key": "svc-a", "config": {"level": 2}})).unwrap();
        assert_eq!(spec.config, Some(NoDefault { level: 2 }));
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = "key: svc-a\nconfig:\n  groups: [g1]\n";
        assert_eq!(
            parse_spec_document(yaml).unwrap(),
            json!({"key": "svc-a", "config": {"groups": ["g1"]}})
        );

        let doc = r#"{"key": "svc-a"}"#;
        assert_eq!(parse_spec_document(doc).unwrap(), json!({"key": "svc-a"}));
    }

    #[test]
    fn test_blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(is_blank(&json!("")));
        assert!(!is_blank(&json!("g1")));
        assert!(!is_blank(&json!({"a": "b"})));
    }
}
