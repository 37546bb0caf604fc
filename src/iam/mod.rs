//! IAM access-key rotation.
//!
//! [`IamProvider`] keeps one IAM user per secret: it makes sure the user
//! exists and is tagged as managed, retires one of the user's access keys
//! when two are present, reconciles group memberships and managed policy
//! attachments, then issues a fresh key.
//!
//! Every call against the identity service goes through the [`IamApi`]
//! seam. [`AwsIamClient`] is the production implementation.

mod account;
mod api;
mod client;
mod error;
mod keys;
mod reconcile;
mod spec;
mod user;

pub use account::{policy_arn, AccountId};
pub use api::{AccessKeyRecord, IamApi, IamUser, KeyStatus, NewAccessKey, Tag};
pub use client::AwsIamClient;
pub use error::{IamError, IamResult};
pub use keys::{describe_keys, pick_rotation_candidate, CandidateReason, RotationCandidate};
pub use reconcile::{
    reconcile_groups, reconcile_policies, MembershipPlan, Outcome, ReconcileAction,
    ReconcileOutcome, ReconcileReport,
};
pub use spec::{validate_iam_spec, GroupSelection, IamOptions, IamSecretSpec};
pub use user::{
    ensure_user, expected_tags, tags_match, UserProvisioning, MANAGED_BY_KEY, MANAGED_BY_VALUE,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::provider::{
    redact_envelope, ProviderError, ProviderResult, RotationProvider, RotationResult,
};
use crate::retry::RetryPolicy;

/// Name of this provider in result envelopes.
pub const PROVIDER_NAME: &str = "iam";

/// Default partition used to qualify policy names.
pub const DEFAULT_PARTITION: &str = "aws";

/// Everything a successful rotation did.
#[derive(Debug, Clone)]
pub struct RotationReport {
    /// The fresh credentials
    pub result: RotationResult,
    /// What user provisioning had to do
    pub user: UserProvisioning,
    /// The key that was deleted, and why
    pub candidate: Option<RotationCandidate>,
    /// The key that was marked Inactive
    pub deactivated: Option<String>,
    /// Group membership changes
    pub groups: ReconcileReport,
    /// Managed policy changes
    pub policies: ReconcileReport,
}

/// Rotation provider for IAM user access keys.
#[derive(Debug)]
pub struct IamProvider<A> {
    api: A,
    account: AccountId,
    partition: String,
    retry: RetryPolicy,
}

impl<A: IamApi> IamProvider<A> {
    /// Create a provider over `api` with the default retry policy.
    pub fn new(api: A) -> Self {
        Self {
            api,
            account: AccountId::new(),
            partition: DEFAULT_PARTITION.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy wrapping each rotation.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Qualify policy names for another partition (`aws-cn`, `aws-us-gov`).
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Use a known account id instead of asking the service for it.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account = AccountId::preset(account_id);
        self
    }

    /// The underlying identity-service client.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Rotate `secret` and report every step taken.
    ///
    /// The whole call is retried under the provider's retry policy; the
    /// returned error is the one from the last attempt.
    pub async fn rotate_with_report(
        &self,
        secret: &IamSecretSpec,
    ) -> ProviderResult<RotationReport> {
        if secret.key.trim().is_empty() {
            return Err(ProviderError::InvalidSpec(
                "'key' must be a non-empty string".to_string(),
            ));
        }

        self.retry
            .run(|| self.rotate_once(secret), ProviderError::is_retryable)
            .await
            .map_err(|e| {
                warn!(
                    user = %secret.key,
                    attempts = e.attempts(),
                    "Giving up on rotation"
                );
                e.into_inner()
            })
    }

    async fn rotate_once(&self, secret: &IamSecretSpec) -> ProviderResult<RotationReport> {
        let user_name = secret.key.as_str();
        let fail = |e: IamError| ProviderError::from_iam(user_name, e);
        let options = secret.config.clone().unwrap_or_default();

        let user = ensure_user(&self.api, user_name, &options.tags)
            .await
            .map_err(fail)?;

        let mut keys = self.api.list_access_keys(user_name).await.map_err(fail)?;
        info!(user = %user_name, keys = %describe_keys(&keys), "Listed access keys");

        let mut candidate = None;
        if keys.len() > 1 {
            // An inactive key wins outright, so usage data is only needed
            // when every key is active.
            if keys.iter().all(|k| k.status.is_active()) {
                for key in keys.iter_mut() {
                    key.last_used = self
                        .api
                        .get_access_key_last_used(&key.access_key_id)
                        .await
                        .map_err(fail)?;
                }
            }

            if let Some(picked) = pick_rotation_candidate(&keys) {
                info!(
                    user = %user_name,
                    access_key_id = %picked.key.access_key_id,
                    reason = %picked.reason,
                    "Deleting access key"
                );
                self.api
                    .delete_access_key(user_name, &picked.key.access_key_id)
                    .await
                    .map_err(fail)?;
                keys.retain(|k| k.access_key_id != picked.key.access_key_id);
                candidate = Some(picked);
            }
        }

        let mut deactivated = None;
        if let [remaining] = keys.as_slice() {
            info!(
                user = %user_name,
                access_key_id = %remaining.access_key_id,
                "Marking access key inactive"
            );
            self.api
                .update_access_key(user_name, &remaining.access_key_id, KeyStatus::Inactive)
                .await
                .map_err(fail)?;
            deactivated = Some(remaining.access_key_id.clone());
        }

        let groups = reconcile_groups(&self.api, user_name, &options.groups.to_set()).await;
        let policies = self.reconcile_user_policies(user_name, &options.policies).await;

        let new_key = self.api.create_access_key(user_name).await.map_err(fail)?;
        info!(
            user = %user_name,
            access_key_id = %new_key.access_key_id,
            "Created access key"
        );

        Ok(RotationReport {
            result: RotationResult::new(
                PROVIDER_NAME,
                new_key.access_key_id,
                new_key.secret_access_key,
            ),
            user,
            candidate,
            deactivated,
            groups,
            policies,
        })
    }

    async fn reconcile_user_policies(
        &self,
        user_name: &str,
        policies: &[String],
    ) -> ReconcileReport {
        match self.qualify_policies(policies).await {
            Ok(arns) => reconcile_policies(&self.api, user_name, &arns).await,
            Err(e) => {
                warn!(
                    user = %user_name,
                    error = %e,
                    "Could not resolve account id, skipping policy reconciliation"
                );
                ReconcileReport::skipped(e.to_string())
            }
        }
    }

    /// Turn configured policy names into ARNs. The account id is only
    /// fetched when a name actually needs qualifying.
    async fn qualify_policies(&self, policies: &[String]) -> IamResult<BTreeSet<String>> {
        let mut arns = BTreeSet::new();
        for policy in policies.iter().filter(|p| !p.trim().is_empty()) {
            if policy.starts_with("arn:") {
                arns.insert(policy.clone());
                continue;
            }
            let account_id = self.account.get(&self.api).await?;
            arns.insert(policy_arn(&self.partition, account_id, policy));
        }
        debug!(policies = ?arns, "Qualified managed policies");
        Ok(arns)
    }
}

impl IamProvider<AwsIamClient> {
    /// Build a provider over the AWS SDK from loaded configuration.
    pub async fn from_config(config: &Config) -> Self {
        let client = AwsIamClient::from_settings(&config.aws).await;
        Self::new(client)
            .with_partition(config.aws.partition.clone())
            .with_retry_policy(RetryPolicy::from_settings(&config.retry))
    }
}

#[async_trait]
impl<A: IamApi> RotationProvider for IamProvider<A> {
    type Config = IamOptions;

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn rotate(&self, secret: &IamSecretSpec) -> ProviderResult<RotationResult> {
        self.rotate_with_report(secret).await.map(|report| report.result)
    }

    async fn distribute(
        &self,
        _secret: &RotationResult,
        _destination: &Value,
    ) -> ProviderResult<()> {
        Err(ProviderError::Distribution(
            "IAM does not support distribution".to_string(),
        ))
    }

    fn validate_spec(spec: &Value) -> (bool, String) {
        validate_iam_spec(spec)
    }

    fn redact_result(result: Value, _spec: Option<&Value>) -> Value {
        redact_envelope(result)
    }

    fn has_creds() -> bool {
        false
    }
}
