//! Lazily memoized caller account id.

use once_cell::sync::OnceCell;

use super::api::IamApi;
use super::error::IamResult;

/// Account id of the calling identity, fetched at most once per holder.
///
/// Concurrent first use may fetch more than once; the value is the same
/// for every fetch and the first stored one wins.
#[derive(Debug, Default)]
pub struct AccountId {
    cell: OnceCell<String>,
}

impl AccountId {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memo that already holds an account id.
    pub fn preset(account_id: impl Into<String>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(account_id.into());
        Self { cell }
    }

    /// The cached value, if it was fetched already.
    pub fn cached(&self) -> Option<&str> {
        self.cell.get().map(String::as_str)
    }

    /// Return the cached account id, fetching it through `api` on first use.
    pub async fn get(&self, api: &dyn IamApi) -> IamResult<&str> {
        if let Some(id) = self.cell.get() {
            return Ok(id);
        }

        let fetched = api.caller_account_id().await?;
        tracing::debug!(account_id = %fetched, "Resolved caller account id");

        // A racing fetch may have stored first; both values are identical.
        Ok(self.cell.get_or_init(|| fetched).as_str())
    }
}

/// Qualify a managed policy name into a full ARN.
///
/// Names may carry a path (`team/ReadOnly`). Values that are already ARNs
/// are returned unchanged.
pub fn policy_arn(partition: &str, account_id: &str, policy: &str) -> String {
    if policy.starts_with("arn:") {
        return policy.to_string();
    }
    format!("arn:{}:iam::{}:policy/{}", partition, account_id, policy)
}
