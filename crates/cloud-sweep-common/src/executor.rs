//! Deletion executor
//!
//! Issues one delete request per identifier with bounded parallelism. A
//! failure on one identifier never stops the others.

use crate::adapter::{DeleteResponse, ResourceAdapter};
use crate::outcome::{DeletionOutcome, SubmittedDeletion};
use crate::retry::{RetryError, RetryPolicy, with_retry};
use crate::types::ResourceIdentifier;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of submitting one deletion
#[derive(Debug)]
pub enum Submission {
    Submitted(SubmittedDeletion),
    Failed(DeletionOutcome),
}

#[derive(Debug, Clone)]
pub struct DeletionExecutor {
    max_concurrency: usize,
    retry: RetryPolicy,
}

impl DeletionExecutor {
    pub fn new(max_concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            retry,
        }
    }

    /// Request deletion of every identifier, at most `max_concurrency` at a time.
    ///
    /// Returns exactly one [`Submission`] per input identifier, in no
    /// particular order. Identifiers not yet started when `cancel` fires are
    /// recorded as failed with cause "cancelled".
    pub async fn submit<A: ResourceAdapter>(
        &self,
        adapter: &A,
        identifiers: Vec<ResourceIdentifier>,
        cancel: &CancellationToken,
    ) -> Vec<Submission> {
        stream::iter(identifiers)
            .map(|id| self.submit_one(adapter, id, cancel))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await
    }

    async fn submit_one<A: ResourceAdapter>(
        &self,
        adapter: &A,
        id: ResourceIdentifier,
        cancel: &CancellationToken,
    ) -> Submission {
        if cancel.is_cancelled() {
            debug!(resource_id = %id, "Run cancelled, skipping deletion");
            return Submission::Failed(DeletionOutcome::cancelled(id));
        }

        let id_ref = &id;
        let result = with_retry(&self.retry, cancel, "delete", id.as_str(), move || {
            adapter.delete_one(id_ref)
        })
        .await;

        match result {
            Ok(DeleteResponse::Deleted) => {
                info!(kind = %adapter.kind(), resource_id = %id, "Deletion requested");
                Submission::Submitted(SubmittedDeletion::new(id))
            }
            Ok(DeleteResponse::NotFound) => {
                debug!(kind = %adapter.kind(), resource_id = %id, "Resource already deleted");
                Submission::Submitted(SubmittedDeletion::new(id))
            }
            Err(RetryError::Cancelled) => {
                debug!(resource_id = %id, "Run cancelled while retrying, giving up on deletion");
                Submission::Failed(DeletionOutcome::cancelled(id))
            }
            Err(RetryError::Provider(e)) => {
                warn!(
                    kind = %adapter.kind(),
                    resource_id = %id,
                    error = %e,
                    "Failed to submit deletion"
                );
                Submission::Failed(DeletionOutcome::submit_failed(id, e.to_string()))
            }
        }
    }
}
