//! Nuke orchestrator
//!
//! Composes lister, executor and waiter for one adapter:
//!
//! 1. List and age-filter the inventory (a failure here aborts the run)
//! 2. Submit every deletion
//! 3. Wait on every successful submission
//! 4. Assemble the [`NukeReport`]
//!
//! There is no rollback. Per-resource failures end up in the report.

use crate::adapter::ResourceAdapter;
use crate::age_filter::{AgeCutoff, AgeFilter, MissingTimestampPolicy};
use crate::defaults::DEFAULT_MAX_CONCURRENCY;
use crate::error::NukeError;
use crate::executor::{DeletionExecutor, Submission};
use crate::lister::ResourceLister;
use crate::report::NukeReport;
use crate::retry::RetryPolicy;
use crate::types::{ResourceDescriptor, ResourceIdentifier};
use crate::wait::WaitConfig;
use crate::waiter::CompletionWaiter;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Tuning knobs shared by every phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NukeSettings {
    /// Maximum in-flight provider operations per phase
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    pub wait: WaitConfig,
    pub missing_timestamp: MissingTimestampPolicy,
}

impl Default for NukeSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry: RetryPolicy::default(),
            wait: WaitConfig::default(),
            missing_timestamp: MissingTimestampPolicy::default(),
        }
    }
}

impl NukeSettings {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait = self.wait.with_timeout(timeout);
        self
    }

    pub fn with_missing_timestamp(mut self, policy: MissingTimestampPolicy) -> Self {
        self.missing_timestamp = policy;
        self
    }
}

/// Runs nuke operations for a single adapter (one kind in one region)
pub struct NukeOrchestrator<A> {
    adapter: A,
    settings: NukeSettings,
    cancel: CancellationToken,
}

impl<A: ResourceAdapter> NukeOrchestrator<A> {
    pub fn new(adapter: A, settings: NukeSettings) -> Self {
        Self {
            adapter,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Share an external cancellation token with this orchestrator
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn settings(&self) -> &NukeSettings {
        &self.settings
    }

    pub fn filter_for(&self, cutoff: AgeCutoff) -> AgeFilter {
        AgeFilter::new(cutoff).with_missing_timestamp(self.settings.missing_timestamp)
    }

    fn lister(&self) -> ResourceLister {
        ResourceLister::new(self.settings.retry)
    }

    /// List what `nuke` would delete, without deleting anything
    #[instrument(skip_all, fields(kind = %self.adapter.kind(), region = %self.adapter.region()))]
    pub async fn inspect(&self, cutoff: AgeCutoff) -> Result<Vec<ResourceDescriptor>, NukeError> {
        self.lister()
            .list(&self.adapter, &self.filter_for(cutoff), &self.cancel)
            .await
    }

    /// Delete every resource created strictly before `cutoff`
    #[instrument(skip_all, fields(kind = %self.adapter.kind(), region = %self.adapter.region()))]
    pub async fn nuke(&self, cutoff: AgeCutoff) -> Result<NukeReport, NukeError> {
        let started_at = Utc::now();
        let eligible = self
            .lister()
            .list(&self.adapter, &self.filter_for(cutoff), &self.cancel)
            .await?;

        let identifiers = eligible.into_iter().map(|r| r.identifier).collect();
        Ok(self
            .delete_and_wait(identifiers, Some(cutoff), started_at)
            .await)
    }

    /// Delete a known set of identifiers, skipping listing and filtering.
    ///
    /// Duplicates in the input are dropped.
    #[instrument(skip_all, fields(kind = %self.adapter.kind(), region = %self.adapter.region()))]
    pub async fn nuke_identifiers<I>(&self, identifiers: I) -> NukeReport
    where
        I: IntoIterator<Item = ResourceIdentifier>,
    {
        let started_at = Utc::now();
        let mut seen = HashSet::new();
        let unique: Vec<_> = identifiers
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        self.delete_and_wait(unique, None, started_at).await
    }

    async fn delete_and_wait(
        &self,
        identifiers: Vec<ResourceIdentifier>,
        cutoff: Option<AgeCutoff>,
        started_at: DateTime<Utc>,
    ) -> NukeReport {
        let kind = self.adapter.kind();
        let region = self.adapter.region();

        if identifiers.is_empty() {
            info!("No eligible resources, nothing to do");
            return NukeReport::new(kind, region, cutoff, started_at, Vec::new());
        }

        let total = identifiers.len();
        info!(count = total, "Submitting deletions");

        let executor = DeletionExecutor::new(self.settings.max_concurrency, self.settings.retry);
        let submissions = executor
            .submit(&self.adapter, identifiers, &self.cancel)
            .await;

        let mut outcomes = Vec::with_capacity(total);
        let mut submitted = Vec::new();
        for submission in submissions {
            match submission {
                Submission::Submitted(deletion) => submitted.push(deletion),
                Submission::Failed(outcome) => outcomes.push(outcome),
            }
        }
        info!(
            submitted = submitted.len(),
            failed = outcomes.len(),
            "Deletions submitted"
        );

        let waiter = CompletionWaiter::new(
            self.settings.wait,
            self.settings.max_concurrency,
            self.settings.retry,
        );
        outcomes.extend(
            waiter
                .await_terminal(&self.adapter, submitted, &self.cancel)
                .await,
        );

        let report = NukeReport::new(kind, region, cutoff, started_at, outcomes);
        info!(
            summary = %report.summary(),
            elapsed_ms = report.duration().num_milliseconds(),
            "Nuke finished"
        );
        report
    }
}
