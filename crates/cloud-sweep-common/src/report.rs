//! Run report
//!
//! One [`NukeReport`] per (kind, region) run. It is assembled once by the
//! orchestrator and never mutated afterwards.

use crate::age_filter::AgeCutoff;
use crate::outcome::{DeletionOutcome, DeletionState};
use crate::resource_kind::ResourceKind;
use crate::types::ResourceIdentifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NukeReport {
    pub resource_kind: ResourceKind,
    pub region: String,
    /// `None` for explicit-identifier runs
    pub cutoff: Option<AgeCutoff>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<DeletionOutcome>,
}

/// Number of outcomes in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub submitted: usize,
    pub submit_failed: usize,
    pub confirmed: usize,
    pub wait_failed: usize,
    pub wait_timed_out: usize,
}

impl StateCounts {
    fn record(&mut self, state: DeletionState) {
        match state {
            DeletionState::Submitted => self.submitted += 1,
            DeletionState::SubmitFailed => self.submit_failed += 1,
            DeletionState::Confirmed => self.confirmed += 1,
            DeletionState::WaitFailed => self.wait_failed += 1,
            DeletionState::WaitTimedOut => self.wait_timed_out += 1,
        }
    }

    pub fn get(&self, state: DeletionState) -> usize {
        match state {
            DeletionState::Submitted => self.submitted,
            DeletionState::SubmitFailed => self.submit_failed,
            DeletionState::Confirmed => self.confirmed,
            DeletionState::WaitFailed => self.wait_failed,
            DeletionState::WaitTimedOut => self.wait_timed_out,
        }
    }

    pub fn total(&self) -> usize {
        self.submitted + self.submit_failed + self.confirmed + self.wait_failed + self.wait_timed_out
    }

    pub fn failed(&self) -> usize {
        self.total() - self.confirmed
    }
}

/// A resource that was not confirmed deleted, with enough detail to retry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedResource {
    pub identifier: ResourceIdentifier,
    pub state: DeletionState,
    pub cause: String,
}

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunSummary {
    NothingToDo,
    Succeeded { total: usize },
    PartiallyFailed { failed: usize, total: usize },
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSummary::NothingToDo => write!(f, "nothing to do"),
            RunSummary::Succeeded { total } => write!(f, "all {total} deleted"),
            RunSummary::PartiallyFailed { failed, total } => {
                write!(f, "partially failed ({failed} of {total})")
            }
        }
    }
}

impl NukeReport {
    pub fn new(
        resource_kind: ResourceKind,
        region: impl Into<String>,
        cutoff: Option<AgeCutoff>,
        started_at: DateTime<Utc>,
        outcomes: Vec<DeletionOutcome>,
    ) -> Self {
        Self {
            resource_kind,
            region: region.into(),
            cutoff,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for outcome in &self.outcomes {
            counts.record(outcome.state);
        }
        counts
    }

    /// Every outcome that is not `Confirmed`
    pub fn failures(&self) -> Vec<FailedResource> {
        self.outcomes
            .iter()
            .filter(|o| !o.state.is_success())
            .map(|o| FailedResource {
                identifier: o.identifier.clone(),
                state: o.state,
                cause: o
                    .error
                    .clone()
                    .unwrap_or_else(|| "deletion not confirmed".to_string()),
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| !o.state.is_success())
    }

    pub fn summary(&self) -> RunSummary {
        let counts = self.counts();
        let total = counts.total();
        match (total, counts.failed()) {
            (0, _) => RunSummary::NothingToDo,
            (total, 0) => RunSummary::Succeeded { total },
            (total, failed) => RunSummary::PartiallyFailed { failed, total },
        }
    }

    /// Identifiers to pass to a follow-up explicit-identifier run
    pub fn retry_identifiers(&self) -> Vec<ResourceIdentifier> {
        self.failures().into_iter().map(|f| f.identifier).collect()
    }

    pub fn outcome(&self, identifier: &str) -> Option<&DeletionOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.identifier.as_str() == identifier)
    }

    /// Identifiers currently in `state`, as a set
    pub fn identifiers_in(&self, state: DeletionState) -> BTreeSet<ResourceIdentifier> {
        self.outcomes
            .iter()
            .filter(|o| o.state == state)
            .map(|o| o.identifier.clone())
            .collect()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
