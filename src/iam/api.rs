//! The identity-service surface consumed by the IAM provider.
//!
//! [`IamApi`] is the seam between rotation logic and the cloud: the
//! production implementation is [`AwsIamClient`](super::client::AwsIamClient),
//! tests plug in a recording fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::IamResult;
use crate::provider::SensitiveString;

/// A single user tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// An IAM user as returned by the user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamUser {
    /// User name
    pub user_name: String,
    /// Tags currently set on the user, in service order
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Access key status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyStatus {
    /// The key can be used to sign requests
    Active,
    /// The key is disabled
    Inactive,
    /// A status this crate does not know about
    Unknown(String),
}

impl KeyStatus {
    /// Whether the key is usable.
    pub fn is_active(&self) -> bool {
        matches!(self, KeyStatus::Active)
    }

    /// The service representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            KeyStatus::Active => "Active",
            KeyStatus::Inactive => "Inactive",
            KeyStatus::Unknown(s) => s,
        }
    }
}

impl From<&str> for KeyStatus {
    fn from(s: &str) -> Self {
        match s {
            "Active" => KeyStatus::Active,
            "Inactive" => KeyStatus::Inactive,
            other => KeyStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for an existing access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyRecord {
    /// Access key id
    pub access_key_id: String,
    /// Owning user
    pub user_name: String,
    /// Current status
    pub status: KeyStatus,
    /// Creation timestamp
    pub create_date: Option<DateTime<Utc>>,
    /// Last time the key signed a request, filled in during candidate selection
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

impl AccessKeyRecord {
    /// Create a record with no timestamps.
    pub fn new(
        access_key_id: impl Into<String>,
        user_name: impl Into<String>,
        status: KeyStatus,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            user_name: user_name.into(),
            status,
            create_date: None,
            last_used: None,
        }
    }

    /// Set the last-used timestamp.
    pub fn with_last_used(mut self, last_used: DateTime<Utc>) -> Self {
        self.last_used = Some(last_used);
        self
    }
}

/// A freshly issued access key, including its secret.
#[derive(Debug, Clone)]
pub struct NewAccessKey {
    /// Access key id
    pub access_key_id: String,
    /// Owning user
    pub user_name: String,
    /// Secret access key, only available at creation time
    pub secret_access_key: SensitiveString,
}

/// Operations the provider needs from the identity service.
///
/// Every method maps to exactly one service call. Implementations must
/// report a missing user from [`get_user`](IamApi::get_user) as
/// [`IamError::NotFound`](super::error::IamError::NotFound).
#[async_trait]
pub trait IamApi: Send + Sync {
    /// Look up a user.
    async fn get_user(&self, user_name: &str) -> IamResult<IamUser>;

    /// Create a user with the given tags.
    async fn create_user(&self, user_name: &str, tags: &[Tag]) -> IamResult<()>;

    /// Set tags on a user, overwriting values of existing keys.
    async fn tag_user(&self, user_name: &str, tags: &[Tag]) -> IamResult<()>;

    /// List the access keys of a user, in service order.
    async fn list_access_keys(&self, user_name: &str) -> IamResult<Vec<AccessKeyRecord>>;

    /// When the key last signed a request, if ever.
    async fn get_access_key_last_used(
        &self,
        access_key_id: &str,
    ) -> IamResult<Option<DateTime<Utc>>>;

    /// Issue a new access key.
    async fn create_access_key(&self, user_name: &str) -> IamResult<NewAccessKey>;

    /// Delete an access key.
    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> IamResult<()>;

    /// Change the status of an access key.
    async fn update_access_key(
        &self,
        user_name: &str,
        access_key_id: &str,
        status: KeyStatus,
    ) -> IamResult<()>;

    /// Names of the groups the user belongs to.
    async fn list_groups_for_user(&self, user_name: &str) -> IamResult<Vec<String>>;

    /// Add the user to a group.
    async fn add_user_to_group(&self, user_name: &str, group_name: &str) -> IamResult<()>;

    /// Remove the user from a group.
    async fn remove_user_from_group(&self, user_name: &str, group_name: &str) -> IamResult<()>;

    /// ARNs of the managed policies attached to the user.
    async fn list_attached_user_policies(&self, user_name: &str) -> IamResult<Vec<String>>;

    /// Attach a managed policy.
    async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> IamResult<()>;

    /// Detach a managed policy.
    async fn detach_user_policy(&self, user_name: &str, policy_arn: &str) -> IamResult<()>;

    /// Account id of the calling identity.
    async fn caller_account_id(&self) -> IamResult<String>;
}
