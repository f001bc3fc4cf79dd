//! Completion waiter
//!
//! Polls each submitted deletion until the provider reports it gone, reports
//! a failure, or the shared batch deadline passes.

use crate::adapter::{ResourceAdapter, ResourceState};
use crate::outcome::{DeletionOutcome, SubmittedDeletion};
use crate::retry::{RetryError, RetryPolicy, with_retry};
use crate::wait::{WaitConfig, WaitError, wait_until};
use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Terminal state of a polled deletion
enum Terminal {
    Gone,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CompletionWaiter {
    config: WaitConfig,
    max_concurrency: usize,
    retry: RetryPolicy,
}

impl CompletionWaiter {
    pub fn new(config: WaitConfig, max_concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            config,
            max_concurrency: max_concurrency.max(1),
            retry,
        }
    }

    /// Wait for every submitted deletion to reach a terminal state.
    ///
    /// All identifiers share one absolute deadline computed when this is
    /// called. Returns one outcome per input.
    pub async fn await_terminal<A: ResourceAdapter>(
        &self,
        adapter: &A,
        submitted: Vec<SubmittedDeletion>,
        cancel: &CancellationToken,
    ) -> Vec<DeletionOutcome> {
        if submitted.is_empty() {
            return Vec::new();
        }

        let deadline = self.config.deadline();
        info!(
            kind = %adapter.kind(),
            count = submitted.len(),
            timeout = ?self.config.timeout,
            "Waiting for deletions to complete"
        );

        stream::iter(submitted)
            .map(|deletion| self.await_one(adapter, deletion, deadline, cancel))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await
    }

    async fn await_one<A: ResourceAdapter>(
        &self,
        adapter: &A,
        deletion: SubmittedDeletion,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> DeletionOutcome {
        let id = deletion.identifier().clone();
        let (id_ref, retry) = (&id, &self.retry);

        let result = wait_until(&self.config, deadline, cancel, id.as_str(), move || async move {
            let state = with_retry(retry, cancel, "describe", id_ref.as_str(), move || {
                adapter.describe_state(id_ref)
            })
            .await?;
            Ok::<_, RetryError>(match state {
                ResourceState::Exists => None,
                ResourceState::NotFound => Some(Terminal::Gone),
                ResourceState::DeleteFailed(reason) => Some(Terminal::Failed(reason)),
            })
        })
        .await;

        match result {
            Ok(Terminal::Gone) => {
                debug!(resource_id = %id, "Deletion confirmed");
                deletion.confirm()
            }
            Ok(Terminal::Failed(reason)) => {
                warn!(resource_id = %id, reason = %reason, "Provider reported deletion failure");
                deletion.fail(reason)
            }
            Err(WaitError::TimedOut { attempts, .. }) => {
                warn!(resource_id = %id, attempts, "Timed out waiting for deletion");
                deletion.time_out(format!(
                    "deletion not confirmed within {:?} ({attempts} checks)",
                    self.config.timeout
                ))
            }
            Err(WaitError::Cancelled { .. })
            | Err(WaitError::Check {
                source: RetryError::Cancelled,
                ..
            }) => {
                debug!(resource_id = %id, "Wait cancelled");
                deletion.unconfirmed()
            }
            Err(WaitError::Check {
                source: RetryError::Provider(source),
                ..
            }) => {
                warn!(resource_id = %id, error = %source, "Failed to check deletion state");
                deletion.fail(source.to_string())
            }
        }
    }
}
