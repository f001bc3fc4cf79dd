//! Age cutoff predicate
//!
//! A resource is eligible iff it was created strictly before the cutoff.
//! Resources without a usable creation time are excluded unless the caller
//! opts in, so an incomplete listing never widens what gets deleted.

use crate::types::ResourceDescriptor;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Resources created strictly before this instant are eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgeCutoff(DateTime<Utc>);

impl AgeCutoff {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Cutoff for "older than `min_age`" measured from `now`
    pub fn older_than(min_age: Duration, now: DateTime<Utc>) -> Self {
        Self(now - min_age)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

/// What to do with a resource whose creation time is missing or unparsable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTimestampPolicy {
    /// Treat it as too new to delete
    #[default]
    Exclude,
    /// Treat it as eligible
    Include,
}

/// Eligibility predicate used by the lister
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeFilter {
    pub cutoff: AgeCutoff,
    pub missing_timestamp: MissingTimestampPolicy,
}

impl AgeFilter {
    pub fn new(cutoff: AgeCutoff) -> Self {
        Self {
            cutoff,
            missing_timestamp: MissingTimestampPolicy::default(),
        }
    }

    pub fn with_missing_timestamp(mut self, policy: MissingTimestampPolicy) -> Self {
        self.missing_timestamp = policy;
        self
    }

    /// Whether a resource created at `created_at` may be deleted
    pub fn is_eligible(&self, created_at: Option<DateTime<Utc>>) -> bool {
        match created_at {
            Some(created) => created < self.cutoff.instant(),
            None => self.missing_timestamp == MissingTimestampPolicy::Include,
        }
    }

    pub fn matches(&self, resource: &ResourceDescriptor) -> bool {
        self.is_eligible(resource.created_at)
    }
}
