//! Best-effort reconciliation of group memberships and managed policies.
//!
//! Both follow the same pattern: list what the user currently has, diff it
//! against the configured set, then apply each change on its own. A failed
//! change is recorded in the [`ReconcileReport`] and does not stop the
//! others; a failed listing skips the whole step.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use super::api::IamApi;
use super::error::IamResult;

/// A single membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Add the user to a group
    AddToGroup,
    /// Remove the user from a group
    RemoveFromGroup,
    /// Attach a managed policy to the user
    AttachPolicy,
    /// Detach a managed policy from the user
    DetachPolicy,
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileAction::AddToGroup => write!(f, "add_to_group"),
            ReconcileAction::RemoveFromGroup => write!(f, "remove_from_group"),
            ReconcileAction::AttachPolicy => write!(f, "attach_policy"),
            ReconcileAction::DetachPolicy => write!(f, "detach_policy"),
        }
    }
}

/// Result of applying one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// The change was applied
    Ok,
    /// The change failed; reconciliation carried on
    Failed(String),
}

/// One attempted change and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Group name or policy ARN
    pub target: String,
    /// What was attempted
    pub action: ReconcileAction,
    /// How it went
    pub outcome: Outcome,
}

/// Everything a reconciliation step did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Attempted changes, in the order they were applied
    pub outcomes: Vec<ReconcileOutcome>,
    /// Set when the step could not run at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl ReconcileReport {
    /// A report for a step that did not run.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            outcomes: Vec::new(),
            skipped: Some(reason.into()),
        }
    }

    /// Changes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ReconcileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
    }

    /// True when the step ran and every change was applied.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_none() && self.failures().next().is_none()
    }

    /// Targets of successful changes of the given kind.
    pub fn applied(&self, action: ReconcileAction) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.action == action && o.outcome == Outcome::Ok)
            .map(|o| o.target.as_str())
            .collect()
    }
}

/// The changes needed to move from `current` to `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    /// In `desired`, not in `current`
    pub to_add: Vec<String>,
    /// In `current`, not in `desired`
    pub to_remove: Vec<String>,
}

impl MembershipPlan {
    /// Diff two sets. Items in both are left alone.
    pub fn between(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            to_add: desired.difference(current).cloned().collect(),
            to_remove: current.difference(desired).cloned().collect(),
        }
    }

    /// True when nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

async fn apply(
    api: &dyn IamApi,
    user_name: &str,
    action: ReconcileAction,
    target: &str,
) -> IamResult<()> {
    match action {
        ReconcileAction::AddToGroup => api.add_user_to_group(user_name, target).await,
        ReconcileAction::RemoveFromGroup => api.remove_user_from_group(user_name, target).await,
        ReconcileAction::AttachPolicy => api.attach_user_policy(user_name, target).await,
        ReconcileAction::DetachPolicy => api.detach_user_policy(user_name, target).await,
    }
}

async fn apply_all(
    api: &dyn IamApi,
    user_name: &str,
    action: ReconcileAction,
    targets: &[String],
    report: &mut ReconcileReport,
) {
    for target in targets {
        let outcome = match apply(api, user_name, action, target).await {
            Ok(()) => {
                tracing::info!(user = %user_name, target = %target, action = %action, "Applied");
                Outcome::Ok
            }
            Err(e) => {
                tracing::warn!(
                    user = %user_name,
                    target = %target,
                    action = %action,
                    error = %e,
                    "Failed, skipping"
                );
                Outcome::Failed(e.to_string())
            }
        };

        report.outcomes.push(ReconcileOutcome {
            target: target.clone(),
            action,
            outcome,
        });
    }
}

/// Make the user's group memberships equal `desired`.
///
/// Removals run before additions.
pub async fn reconcile_groups(
    api: &dyn IamApi,
    user_name: &str,
    desired: &BTreeSet<String>,
) -> ReconcileReport {
    let current: BTreeSet<String> = match api.list_groups_for_user(user_name).await {
        Ok(groups) => groups.into_iter().collect(),
        Err(e) => {
            tracing::warn!(user = %user_name, error = %e, "Not able to list groups for user");
            return ReconcileReport::skipped(e.to_string());
        }
    };

    let plan = MembershipPlan::between(&current, desired);
    tracing::debug!(
        user = %user_name,
        current = ?current,
        desired = ?desired,
        "Reconciling group membership"
    );

    let mut report = ReconcileReport::default();
    apply_all(api, user_name, ReconcileAction::RemoveFromGroup, &plan.to_remove, &mut report).await;
    apply_all(api, user_name, ReconcileAction::AddToGroup, &plan.to_add, &mut report).await;
    report
}

/// Make the user's attached managed policies equal `desired_arns`.
///
/// Attachments run before detachments.
pub async fn reconcile_policies(
    api: &dyn IamApi,
    user_name: &str,
    desired_arns: &BTreeSet<String>,
) -> ReconcileReport {
    let current: BTreeSet<String> = match api.list_attached_user_policies(user_name).await {
        Ok(arns) => arns.into_iter().collect(),
        Err(e) => {
            tracing::warn!(
                user = %user_name,
                error = %e,
                "Failed to fetch managed policies attached to user"
            );
            return ReconcileReport::skipped(e.to_string());
        }
    };

    let plan = MembershipPlan::between(&current, desired_arns);
    tracing::debug!(
        user = %user_name,
        current = ?current,
        desired = ?desired_arns,
        "Reconciling managed policies"
    );

    let mut report = ReconcileReport::default();
    apply_all(api, user_name, ReconcileAction::AttachPolicy, &plan.to_add, &mut report).await;
    apply_all(api, user_name, ReconcileAction::DetachPolicy, &plan.to_remove, &mut report).await;
    report
}
