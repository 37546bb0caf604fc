//! Selection of the access key to retire.

use serde::Serialize;
use std::fmt;

use super::api::AccessKeyRecord;

/// Why a key was elected for retirement. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateReason {
    /// The key was not active
    Inactive,
    /// First key seen, no usage comparison applied
    InitialOption,
    /// The key was used less recently than the others
    LastUsed,
}

impl fmt::Display for CandidateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateReason::Inactive => write!(f, "inactive"),
            CandidateReason::InitialOption => write!(f, "initial_option"),
            CandidateReason::LastUsed => write!(f, "last_used"),
        }
    }
}

/// A key elected for retirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationCandidate {
    /// The elected key
    pub key: AccessKeyRecord,
    /// Why it was elected
    pub reason: CandidateReason,
}

/// Pick the key to retire among `keys`, in service order.
///
/// A key that is not active wins immediately. Otherwise the key with the
/// earliest `last_used` wins; keys without usage data never displace the
/// current candidate and are never displaced by comparison, so the first
/// key is the default.
pub fn pick_rotation_candidate(keys: &[AccessKeyRecord]) -> Option<RotationCandidate> {
    let mut candidate: Option<RotationCandidate> = None;

    for key in keys {
        if !key.status.is_active() {
            return Some(RotationCandidate {
                key: key.clone(),
                reason: CandidateReason::Inactive,
            });
        }

        let Some(current) = candidate.as_ref() else {
            candidate = Some(RotationCandidate {
                key: key.clone(),
                reason: CandidateReason::InitialOption,
            });
            continue;
        };

        if let (Some(used), Some(current_used)) = (key.last_used, current.key.last_used) {
            if used < current_used {
                candidate = Some(RotationCandidate {
                    key: key.clone(),
                    reason: CandidateReason::LastUsed,
                });
            }
        }
    }

    candidate
}

/// One-line summary of keys for logging, e.g. `AKIA1 (Active), AKIA2 (Inactive)`.
pub fn describe_keys(keys: &[AccessKeyRecord]) -> String {
    keys.iter()
        .map(|k| format!("{} ({})", k.access_key_id, k.status))
        .collect::<Vec<_>>()
        .join(", ")
}
