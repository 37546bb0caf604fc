//! Shared test utilities for the keydra-iam test suite.
//!
//! This module provides:
//! - `MockIam`, an in-memory identity service that records every call
//! - Failure injection per operation
//! - Helpers to build providers and descriptors
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;

use keydra_iam::iam::{
    AccessKeyRecord, IamApi, IamError, IamOptions, IamProvider, IamResult, IamSecretSpec,
    IamUser, KeyStatus, NewAccessKey, Tag,
};
use keydra_iam::provider::SecretSpec;
use keydra_iam::retry::RetryPolicy;

// ============================================================================
// Operation names
// ============================================================================

pub const GET_USER: &str = "GetUser";
pub const CREATE_USER: &str = "CreateUser";
pub const TAG_USER: &str = "TagUser";
pub const LIST_ACCESS_KEYS: &str = "ListAccessKeys";
pub const GET_ACCESS_KEY_LAST_USED: &str = "GetAccessKeyLastUsed";
pub const CREATE_ACCESS_KEY: &str = "CreateAccessKey";
pub const DELETE_ACCESS_KEY: &str = "DeleteAccessKey";
pub const UPDATE_ACCESS_KEY: &str = "UpdateAccessKey";
pub const LIST_GROUPS_FOR_USER: &str = "ListGroupsForUser";
pub const ADD_USER_TO_GROUP: &str = "AddUserToGroup";
pub const REMOVE_USER_FROM_GROUP: &str = "RemoveUserFromGroup";
pub const LIST_ATTACHED_USER_POLICIES: &str = "ListAttachedUserPolicies";
pub const ATTACH_USER_POLICY: &str = "AttachUserPolicy";
pub const DETACH_USER_POLICY: &str = "DetachUserPolicy";
pub const GET_CALLER_IDENTITY: &str = "GetCallerIdentity";

/// Account id reported by the mock unless overridden.
pub const ACCOUNT_ID: &str = "123456789012";

// ============================================================================
// Mock identity service
// ============================================================================

/// A recorded call: operation name plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub args: Vec<String>,
}

impl Call {
    /// Render as `Operation arg1 arg2`.
    pub fn render(&self) -> String {
        let mut out = self.operation.to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

#[derive(Debug, Clone)]
struct MockKey {
    record: AccessKeyRecord,
    last_used: Option<DateTime<Utc>>,
}

/// An in-memory identity service.
///
/// Behaves like IAM for the calls the provider makes: keys are capped at
/// two per user, adding an existing membership is a no-op, tagging
/// overwrites values of existing keys.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockIam::new();
/// mock.add_user("svc-a", &[("managedby", "keydra")]);
/// mock.add_key("svc-a", "AKIA1", KeyStatus::Active, None);
/// mock.fail_times(CREATE_ACCESS_KEY, 1);
/// ```
#[derive(Debug)]
pub struct MockIam {
    account_id: String,
    users: RwLock<HashMap<String, Vec<Tag>>>,
    keys: RwLock<HashMap<String, Vec<MockKey>>>,
    groups: RwLock<HashMap<String, Vec<String>>>,
    policies: RwLock<HashMap<String, Vec<String>>>,
    calls: RwLock<Vec<Call>>,
    failures: RwLock<HashMap<&'static str, u32>>,
    key_counter: AtomicU32,
}

impl Default for MockIam {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIam {
    /// Create an empty account.
    pub fn new() -> Self {
        Self::with_account_id(ACCOUNT_ID)
    }

    /// Create an empty account with a specific id.
    pub fn with_account_id(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            users: RwLock::new(HashMap::new()),
            keys: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            policies: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            failures: RwLock::new(HashMap::new()),
            key_counter: AtomicU32::new(0),
        }
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    /// Add a user with tags.
    pub fn add_user(&self, user: &str, tags: &[(&str, &str)]) {
        self.users.write().insert(
            user.to_string(),
            tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
        );
    }

    /// Add an access key to a user.
    pub fn add_key(
        &self,
        user: &str,
        access_key_id: &str,
        status: KeyStatus,
        last_used: Option<DateTime<Utc>>,
    ) {
        self.keys
            .write()
            .entry(user.to_string())
            .or_default()
            .push(MockKey {
                record: AccessKeyRecord::new(access_key_id, user, status),
                last_used,
            });
    }

    /// Put a user in a group.
    pub fn add_group(&self, user: &str, group: &str) {
        self.groups
            .write()
            .entry(user.to_string())
            .or_default()
            .push(group.to_string());
    }

    /// Attach a managed policy to a user.
    pub fn add_policy(&self, user: &str, policy_arn: &str) {
        self.policies
            .write()
            .entry(user.to_string())
            .or_default()
            .push(policy_arn.to_string());
    }

    // ------------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------------

    /// Fail the next `times` calls to `operation`.
    pub fn fail_times(&self, operation: &'static str, times: u32) {
        self.failures.write().insert(operation, times);
    }

    /// Fail every call to `operation`.
    pub fn fail_always(&self, operation: &'static str) {
        self.fail_times(operation, u32::MAX);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Every call, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.read().clone()
    }

    /// Every call rendered as `Operation args...`, in order.
    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls.read().iter().map(Call::render).collect()
    }

    /// Calls to one operation, rendered.
    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        self.calls
            .read()
            .iter()
            .filter(|c| c.operation == operation)
            .map(Call::render)
            .collect()
    }

    /// Number of calls to one operation.
    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Position of the first call matching `rendered`.
    pub fn position(&self, rendered: &str) -> Option<usize> {
        self.rendered_calls().iter().position(|c| c == rendered)
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().clear();
    }

    /// Whether the user exists.
    pub fn has_user(&self, user: &str) -> bool {
        self.users.read().contains_key(user)
    }

    /// Tags of a user.
    pub fn user_tags(&self, user: &str) -> Vec<Tag> {
        self.users.read().get(user).cloned().unwrap_or_default()
    }

    /// Keys of a user as `(id, status)`.
    pub fn keys(&self, user: &str) -> Vec<(String, KeyStatus)> {
        self.keys
            .read()
            .get(user)
            .map(|keys| {
                keys.iter()
                    .map(|k| (k.record.access_key_id.clone(), k.record.status.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Groups of a user, sorted.
    pub fn groups(&self, user: &str) -> Vec<String> {
        let mut groups = self.groups.read().get(user).cloned().unwrap_or_default();
        groups.sort();
        groups
    }

    /// Attached policy ARNs of a user, sorted.
    pub fn policies(&self, user: &str) -> Vec<String> {
        let mut policies = self.policies.read().get(user).cloned().unwrap_or_default();
        policies.sort();
        policies
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn record(&self, operation: &'static str, args: &[&str]) -> IamResult<()> {
        self.calls.write().push(Call {
            operation,
            args: args.iter().map(|a| a.to_string()).collect(),
        });

        let mut failures = self.failures.write();
        if let Some(remaining) = failures.get_mut(operation) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(IamError::service(operation, "injected failure"));
            }
        }
        Ok(())
    }

    fn require_user(&self, user: &str) -> IamResult<()> {
        if self.users.read().contains_key(user) {
            Ok(())
        } else {
            Err(IamError::user_not_found(user))
        }
    }

    fn key_not_found(access_key_id: &str) -> IamError {
        IamError::NotFound {
            kind: "access key",
            name: access_key_id.to_string(),
        }
    }
}

#[async_trait]
impl IamApi for MockIam {
    async fn get_user(&self, user_name: &str) -> IamResult<IamUser> {
        self.record(GET_USER, &[user_name])?;
        self.users
            .read()
            .get(user_name)
            .map(|tags| IamUser {
                user_name: user_name.to_string(),
                tags: tags.clone(),
            })
            .ok_or_else(|| IamError::user_not_found(user_name))
    }

    async fn create_user(&self, user_name: &str, tags: &[Tag]) -> IamResult<()> {
        self.record(CREATE_USER, &[user_name])?;
        let mut users = self.users.write();
        if users.contains_key(user_name) {
            return Err(IamError::service(CREATE_USER, "EntityAlreadyExists"));
        }
        users.insert(user_name.to_string(), tags.to_vec());
        Ok(())
    }

    async fn tag_user(&self, user_name: &str, tags: &[Tag]) -> IamResult<()> {
        self.record(TAG_USER, &[user_name])?;
        let mut users = self.users.write();
        let current = users
            .get_mut(user_name)
            .ok_or_else(|| IamError::user_not_found(user_name))?;
        for tag in tags {
            match current.iter_mut().find(|t| t.key == tag.key) {
                Some(existing) => existing.value = tag.value.clone(),
                None => current.push(tag.clone()),
            }
        }
        Ok(())
    }

    async fn list_access_keys(&self, user_name: &str) -> IamResult<Vec<AccessKeyRecord>> {
        self.record(LIST_ACCESS_KEYS, &[user_name])?;
        self.require_user(user_name)?;
        Ok(self
            .keys
            .read()
            .get(user_name)
            .map(|keys| keys.iter().map(|k| k.record.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_access_key_last_used(
        &self,
        access_key_id: &str,
    ) -> IamResult<Option<DateTime<Utc>>> {
        self.record(GET_ACCESS_KEY_LAST_USED, &[access_key_id])?;
        self.keys
            .read()
            .values()
            .flatten()
            .find(|k| k.record.access_key_id == access_key_id)
            .map(|k| k.last_used)
            .ok_or_else(|| Self::key_not_found(access_key_id))
    }

    async fn create_access_key(&self, user_name: &str) -> IamResult<NewAccessKey> {
        self.record(CREATE_ACCESS_KEY, &[user_name])?;
        self.require_user(user_name)?;

        let mut keys = self.keys.write();
        let user_keys = keys.entry(user_name.to_string()).or_default();
        if user_keys.len() >= 2 {
            return Err(IamError::service(
                CREATE_ACCESS_KEY,
                "LimitExceeded: Cannot exceed quota for AccessKeysPerUser: 2",
            ));
        }

        let n = self.key_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let access_key_id = format!("AKIAMOCK{:08}", n);
        let mut record = AccessKeyRecord::new(&access_key_id, user_name, KeyStatus::Active);
        record.create_date = Some(Utc::now());
        user_keys.push(MockKey {
            record,
            last_used: None,
        });

        Ok(NewAccessKey {
            access_key_id,
            user_name: user_name.to_string(),
            secret_access_key: format!("mock-secret-{}", n).into(),
        })
    }

    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> IamResult<()> {
        self.record(DELETE_ACCESS_KEY, &[user_name, access_key_id])?;
        let mut keys = self.keys.write();
        let user_keys = keys
            .get_mut(user_name)
            .ok_or_else(|| Self::key_not_found(access_key_id))?;
        let before = user_keys.len();
        user_keys.retain(|k| k.record.access_key_id != access_key_id);
        if user_keys.len() == before {
            return Err(Self::key_not_found(access_key_id));
        }
        Ok(())
    }

    async fn update_access_key(
        &self,
        user_name: &str,
        access_key_id: &str,
        status: KeyStatus,
    ) -> IamResult<()> {
        self.record(UPDATE_ACCESS_KEY, &[user_name, access_key_id, status.as_str()])?;
        let mut keys = self.keys.write();
        let key = keys
            .get_mut(user_name)
            .and_then(|keys| keys.iter_mut().find(|k| k.record.access_key_id == access_key_id))
            .ok_or_else(|| Self::key_not_found(access_key_id))?;
        key.record.status = status;
        Ok(())
    }

    async fn list_groups_for_user(&self, user_name: &str) -> IamResult<Vec<String>> {
        self.record(LIST_GROUPS_FOR_USER, &[user_name])?;
        Ok(self.groups.read().get(user_name).cloned().unwrap_or_default())
    }

    async fn add_user_to_group(&self, user_name: &str, group_name: &str) -> IamResult<()> {
        self.record(ADD_USER_TO_GROUP, &[user_name, group_name])?;
        let mut groups = self.groups.write();
        let user_groups = groups.entry(user_name.to_string()).or_default();
        if !user_groups.iter().any(|g| g == group_name) {
            user_groups.push(group_name.to_string());
        }
        Ok(())
    }

    async fn remove_user_from_group(&self, user_name: &str, group_name: &str) -> IamResult<()> {
        self.record(REMOVE_USER_FROM_GROUP, &[user_name, group_name])?;
        if let Some(user_groups) = self.groups.write().get_mut(user_name) {
            user_groups.retain(|g| g != group_name);
        }
        Ok(())
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> IamResult<Vec<String>> {
        self.record(LIST_ATTACHED_USER_POLICIES, &[user_name])?;
        Ok(self
            .policies
            .read()
            .get(user_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> IamResult<()> {
        self.record(ATTACH_USER_POLICY, &[user_name, policy_arn])?;
        let mut policies = self.policies.write();
        let user_policies = policies.entry(user_name.to_string()).or_default();
        if !user_policies.iter().any(|p| p == policy_arn) {
            user_policies.push(policy_arn.to_string());
        }
        Ok(())
    }

    async fn detach_user_policy(&self, user_name: &str, policy_arn: &str) -> IamResult<()> {
        self.record(DETACH_USER_POLICY, &[user_name, policy_arn])?;
        if let Some(user_policies) = self.policies.write().get_mut(user_name) {
            user_policies.retain(|p| p != policy_arn);
        }
        Ok(())
    }

    async fn caller_account_id(&self) -> IamResult<String> {
        self.record(GET_CALLER_IDENTITY, &[])?;
        Ok(self.account_id.clone())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// A retry policy with the default attempt count and millisecond delays.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3).with_delays(Duration::from_millis(1), Duration::from_millis(5))
}

/// A provider over `mock` that retries quickly.
pub fn provider(mock: MockIam) -> IamProvider<MockIam> {
    IamProvider::new(mock).with_retry_policy(fast_retry())
}

/// A descriptor without options.
pub fn secret(user: &str) -> IamSecretSpec {
    SecretSpec::new(user)
}

/// A descriptor with options.
pub fn secret_with(user: &str, options: IamOptions) -> IamSecretSpec {
    SecretSpec::new(user).with_config(options)
}

/// A fixed timestamp on day `day` of January 2024.
pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

/// The policy ARN the provider builds for `name` in the mock account.
pub fn arn(name: &str) -> String {
    format!("arn:aws:iam::{}:policy/{}", ACCOUNT_ID, name)
}
