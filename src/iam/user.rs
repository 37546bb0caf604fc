//! User provisioning: create-if-absent and tag reconciliation.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

use super::api::{IamApi, Tag};
use super::error::{IamError, IamResult};

/// Tag key marking users owned by the rotation pipeline.
pub const MANAGED_BY_KEY: &str = "managedby";

/// Value of the ownership tag.
pub const MANAGED_BY_VALUE: &str = "keydra";

/// What provisioning had to do to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserProvisioning {
    /// The user did not exist and was created
    Created,
    /// The user existed with different tags and was re-tagged
    Retagged,
    /// The user existed with the expected tags
    Unchanged,
}

/// Tags a managed user must carry: the ownership tag, then `extra` in order.
///
/// An `extra` entry for the ownership key is dropped.
pub fn expected_tags(extra: &IndexMap<String, String>) -> Vec<Tag> {
    let mut tags = vec![Tag::new(MANAGED_BY_KEY, MANAGED_BY_VALUE)];

    for (key, value) in extra {
        if key == MANAGED_BY_KEY {
            tracing::warn!(
                value = %value,
                "Ignoring configured '{}' tag, it is reserved",
                MANAGED_BY_KEY
            );
            continue;
        }
        tags.push(Tag::new(key, value));
    }

    tags
}

/// Order-insensitive tag comparison.
pub fn tags_match(current: &[Tag], expected: &[Tag]) -> bool {
    let current: BTreeSet<&Tag> = current.iter().collect();
    let expected: BTreeSet<&Tag> = expected.iter().collect();
    current == expected
}

/// Make sure `user_name` exists and carries `expected_tags(extra)`.
pub async fn ensure_user(
    api: &dyn IamApi,
    user_name: &str,
    extra: &IndexMap<String, String>,
) -> IamResult<UserProvisioning> {
    let expected = expected_tags(extra);

    match api.get_user(user_name).await {
        Ok(user) => {
            if tags_match(&user.tags, &expected) {
                return Ok(UserProvisioning::Unchanged);
            }

            tracing::info!(user = %user_name, "Updating user tags");
            api.tag_user(user_name, &expected).await?;
            Ok(UserProvisioning::Retagged)
        }
        Err(IamError::NotFound { .. }) => {
            tracing::warn!(
                user = %user_name,
                "User does not exist, attempting to create"
            );
            api.create_user(user_name, &expected).await?;
            tracing::info!(user = %user_name, "User created successfully");
            Ok(UserProvisioning::Created)
        }
        Err(e) => Err(e),
    }
}
