//! Per-identifier deletion lifecycle
//!
//! ```text
//! Discovered ──submit──▶ Submitted ──wait──▶ Confirmed | WaitFailed | WaitTimedOut
//!      └──────────────▶ SubmitFailed
//! ```
//!
//! A [`SubmittedDeletion`] can only be produced by the executor and is
//! consumed by the waiter, so a resource whose submission failed can never be
//! waited on.

use crate::types::ResourceIdentifier;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Cause recorded for identifiers skipped because the run was cancelled
pub const CANCELLED_CAUSE: &str = "cancelled";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeletionState {
    /// Deletion requested, completion not (yet) confirmed
    Submitted,
    SubmitFailed,
    Confirmed,
    WaitFailed,
    WaitTimedOut,
}

impl DeletionState {
    pub fn is_success(self) -> bool {
        self == DeletionState::Confirmed
    }
}

/// Final record for one identifier in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub identifier: ResourceIdentifier,
    pub state: DeletionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeletionOutcome {
    pub(crate) fn submit_failed(identifier: ResourceIdentifier, cause: impl Into<String>) -> Self {
        Self {
            identifier,
            state: DeletionState::SubmitFailed,
            error: Some(cause.into()),
        }
    }

    pub(crate) fn cancelled(identifier: ResourceIdentifier) -> Self {
        Self::submit_failed(identifier, CANCELLED_CAUSE)
    }
}

/// A resource whose delete request the provider accepted (or which was
/// already gone).
#[derive(Debug, PartialEq, Eq)]
pub struct SubmittedDeletion {
    identifier: ResourceIdentifier,
}

impl SubmittedDeletion {
    pub(crate) fn new(identifier: ResourceIdentifier) -> Self {
        Self { identifier }
    }

    pub fn identifier(&self) -> &ResourceIdentifier {
        &self.identifier
    }

    pub(crate) fn confirm(self) -> DeletionOutcome {
        self.finish(DeletionState::Confirmed, None)
    }

    pub(crate) fn fail(self, cause: impl Into<String>) -> DeletionOutcome {
        self.finish(DeletionState::WaitFailed, Some(cause.into()))
    }

    pub(crate) fn time_out(self, cause: impl Into<String>) -> DeletionOutcome {
        self.finish(DeletionState::WaitTimedOut, Some(cause.into()))
    }

    /// Stop tracking without a terminal state (the wait was cancelled)
    pub(crate) fn unconfirmed(self) -> DeletionOutcome {
        self.finish(
            DeletionState::Submitted,
            Some("wait cancelled before deletion was confirmed".to_string()),
        )
    }

    fn finish(self, state: DeletionState, error: Option<String>) -> DeletionOutcome {
        DeletionOutcome {
            identifier: self.identifier,
            state,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_from_submitted() {
        let submitted = || SubmittedDeletion::new("lb-1".into());

        let confirmed = submitted().confirm();
        assert_eq!(confirmed.state, DeletionState::Confirmed);
        assert!(confirmed.error.is_none());

        let failed = submitted().fail("provider reported failure");
        assert_eq!(failed.state, DeletionState::WaitFailed);
        assert_eq!(failed.error.as_deref(), Some("provider reported failure"));

        assert_eq!(submitted().time_out("deadline").state, DeletionState::WaitTimedOut);
        assert_eq!(submitted().unconfirmed().state, DeletionState::Submitted);
    }

    #[test]
    fn test_cancelled_is_submit_failure() {
        let outcome = DeletionOutcome::cancelled("i-1".into());
        assert_eq!(outcome.state, DeletionState::SubmitFailed);
        assert_eq!(outcome.error.as_deref(), Some(CANCELLED_CAUSE));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(DeletionState::WaitTimedOut.to_string(), "wait_timed_out");
        assert_eq!(
            serde_json::to_string(&DeletionState::SubmitFailed).unwrap(),
            "\"submit_failed\""
        );
    }
}
