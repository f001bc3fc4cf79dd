//! Resource lister
//!
//! Pages through an adapter's inventory and returns the age-filtered set.
//! The result is all-or-nothing: any unrecoverable page failure aborts the
//! listing, since acting on an incomplete inventory is unsafe.

use crate::adapter::ResourceAdapter;
use crate::age_filter::{AgeFilter, MissingTimestampPolicy};
use crate::error::{NukeError, ProviderError};
use crate::retry::{RetryError, RetryPolicy, with_retry};
use crate::types::{ResourceDescriptor, ResourceIdentifier};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct ResourceLister {
    retry: RetryPolicy,
}

impl ResourceLister {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// List every resource eligible under `filter`.
    ///
    /// Identifiers repeated across pages are kept once (first occurrence).
    pub async fn list<A: ResourceAdapter>(
        &self,
        adapter: &A,
        filter: &AgeFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceDescriptor>, NukeError> {
        let kind = adapter.kind();
        let region = adapter.region();
        let list_error = |source: ProviderError| NukeError::List {
            kind,
            region: region.to_string(),
            source,
        };

        let mut seen_ids: HashSet<ResourceIdentifier> = HashSet::new();
        let mut seen_tokens: HashSet<String> = HashSet::new();
        let mut eligible = Vec::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;
        let mut undated = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(NukeError::Cancelled {
                    kind,
                    region: region.to_string(),
                });
            }

            let token = continuation.take();
            let page = with_retry(&self.retry, cancel, "list", region, move || {
                adapter.list_page(token.clone())
            })
            .await
            .map_err(|e| match e {
                RetryError::Provider(source) => list_error(source),
                RetryError::Cancelled => NukeError::Cancelled {
                    kind,
                    region: region.to_string(),
                },
            })?;
            pages += 1;

            debug!(
                kind = %kind,
                region,
                page = pages,
                resources = page.resources.len(),
                has_more = page.next_token.is_some(),
                "Listed page"
            );

            for resource in page.resources {
                if !seen_ids.insert(resource.identifier.clone()) {
                    continue;
                }
                if resource.created_at.is_none() {
                    undated += 1;
                }
                if filter.matches(&resource) {
                    eligible.push(resource);
                }
            }

            match page.next_token.filter(|t| !t.is_empty()) {
                Some(next) => {
                    if !seen_tokens.insert(next.clone()) {
                        return Err(list_error(ProviderError::failed(format!(
                            "pagination token {next} returned twice"
                        ))));
                    }
                    continuation = Some(next);
                }
                None => break,
            }
        }

        if undated > 0 {
            match filter.missing_timestamp {
                MissingTimestampPolicy::Exclude => warn!(
                    kind = %kind,
                    region,
                    count = undated,
                    "Excluding resources without a creation timestamp"
                ),
                MissingTimestampPolicy::Include => warn!(
                    kind = %kind,
                    region,
                    count = undated,
                    "Including resources without a creation timestamp"
                ),
            }
        }

        info!(
            kind = %kind,
            region,
            pages,
            listed = seen_ids.len(),
            eligible = eligible.len(),
            cutoff = %filter.cutoff.instant(),
            "Listed resources"
        );
        Ok(eligible)
    }
}
