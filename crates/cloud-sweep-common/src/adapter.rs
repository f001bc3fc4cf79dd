//! Per-kind capability trait
//!
//! Each supported resource kind supplies one implementation bound to a single
//! region. The orchestrator is written once against this trait.

use crate::error::ProviderError;
use crate::resource_kind::ResourceKind;
use crate::types::{ResourceDescriptor, ResourceIdentifier};
use std::future::Future;

/// One page of a provider listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub resources: Vec<ResourceDescriptor>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

impl ListPage {
    pub fn last(resources: Vec<ResourceDescriptor>) -> Self {
        Self {
            resources,
            next_token: None,
        }
    }

    pub fn with_next(resources: Vec<ResourceDescriptor>, next_token: impl Into<String>) -> Self {
        Self {
            resources,
            next_token: Some(next_token.into()),
        }
    }
}

/// Successful response to a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResponse {
    /// The provider accepted the deletion
    Deleted,
    /// The resource was already gone
    NotFound,
}

/// Provider-reported state of a resource whose deletion was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Still present (possibly mid-deletion)
    Exists,
    /// Gone; deletion is complete
    NotFound,
    /// The provider gave up deleting it
    DeleteFailed(String),
}

impl ResourceState {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResourceState::Exists)
    }
}

/// Capabilities the core needs from a resource kind.
///
/// Implementations should classify provider errors into [`ProviderError`]
/// variants and map "not found" to the `NotFound` responses rather than to
/// errors.
pub trait ResourceAdapter: Send + Sync {
    /// The kind of resource this adapter manages
    fn kind(&self) -> ResourceKind;

    /// The region this adapter is bound to
    fn region(&self) -> &str;

    /// Fetch one page of the inventory, starting at `continuation`
    fn list_page(
        &self,
        continuation: Option<String>,
    ) -> impl Future<Output = Result<ListPage, ProviderError>> + Send;

    /// Request deletion of one resource
    fn delete_one(
        &self,
        id: &ResourceIdentifier,
    ) -> impl Future<Output = Result<DeleteResponse, ProviderError>> + Send;

    /// Look up the current state of one resource
    fn describe_state(
        &self,
        id: &ResourceIdentifier,
    ) -> impl Future<Output = Result<ResourceState, ProviderError>> + Send;
}
