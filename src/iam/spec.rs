//! IAM-specific descriptor options and their validation.
//!
//! ```yaml
//! key: svc-a
//! provider: iam
//! config:
//!   tags:
//!     team: infra
//!   groups: [readers]
//!   policies: [team/ReadOnly]
//! ```

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::provider::{is_blank, validate_base_spec, SecretSpec, VALID_SPEC_MESSAGE};

/// A secret descriptor for the IAM provider.
pub type IamSecretSpec = SecretSpec<IamOptions>;

/// Options under `config` for an IAM secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IamOptions {
    /// Extra tags for the user, on top of the ownership tag
    #[serde(deserialize_with = "blank_as_default")]
    pub tags: IndexMap<String, String>,

    /// Groups the user must belong to, and only those
    #[serde(deserialize_with = "blank_as_default")]
    pub groups: GroupSelection,

    /// Managed policy names (or ARNs) the user must have attached, and only those
    #[serde(deserialize_with = "blank_as_default")]
    pub policies: Vec<String>,
}

impl IamOptions {
    /// Builder-style tag setter.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder-style group list setter.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = GroupSelection::Many(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style policy list setter.
    pub fn with_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policies = policies.into_iter().map(Into::into).collect();
        self
    }
}

/// A single group name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSelection {
    /// One group
    One(String),
    /// Any number of groups
    Many(Vec<String>),
}

impl Default for GroupSelection {
    fn default() -> Self {
        GroupSelection::Many(Vec::new())
    }
}

impl GroupSelection {
    /// The selected groups as a set. Empty names are dropped.
    pub fn to_set(&self) -> BTreeSet<String> {
        let names: Vec<&String> = match self {
            GroupSelection::One(name) => vec![name],
            GroupSelection::Many(names) => names.iter().collect(),
        };
        names
            .into_iter()
            .filter(|n| !n.is_empty())
            .cloned()
            .collect()
    }
}

/// Blank values (`null`, `false`, `0`, `""`, empty containers) mean "not
/// provided", matching what [`validate_iam_spec`] skips.
fn blank_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if is_blank(&value) {
        return Ok(T::default());
    }
    T::deserialize(value).map_err(de::Error::custom)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKind {
    Mapping,
    Sequence,
}

impl OptionKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            OptionKind::Mapping => value.is_object(),
            OptionKind::Sequence => value.is_array(),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Mapping => write!(f, "mapping"),
            OptionKind::Sequence => write!(f, "sequence"),
        }
    }
}

const ALLOWED_OPTIONS: [(&str, OptionKind); 3] = [
    ("tags", OptionKind::Mapping),
    ("groups", OptionKind::Sequence),
    ("policies", OptionKind::Sequence),
];

fn all_strings<'a>(mut values: impl Iterator<Item = &'a Value>) -> bool {
    values.all(Value::is_string)
}

/// Validate a raw IAM descriptor.
///
/// Options that are absent or empty are not type checked.
pub fn validate_iam_spec(spec: &Value) -> (bool, String) {
    let (valid, message) = validate_base_spec(spec);
    if !valid {
        return (false, message);
    }

    let Some(config) = spec.get("config").and_then(Value::as_object) else {
        return (true, VALID_SPEC_MESSAGE.to_string());
    };

    for (name, kind) in ALLOWED_OPTIONS {
        let Some(value) = config.get(name) else {
            continue;
        };
        if is_blank(value) {
            continue;
        }
        if !kind.matches(value) {
            return (false, format!("{} must be a {}", name, kind));
        }

        let elements_ok = match value {
            Value::Object(map) => all_strings(map.values()),
            Value::Array(items) => all_strings(items.iter()),
            _ => true,
        };
        if !elements_ok {
            return (false, format!("{} must only contain strings", name));
        }
    }

    let mut unknown: Vec<&str> = config
        .keys()
        .map(String::as_str)
        .filter(|k| !ALLOWED_OPTIONS.iter().any(|(name, _)| name == k))
        .collect();

    if !unknown.is_empty() {
        unknown.sort_unstable();
        return (
            false,
            format!(
                "Unsupported values in provider config: {}",
                unknown.join(", ")
            ),
        );
    }

    (true, VALID_SPEC_MESSAGE.to_string())
}
