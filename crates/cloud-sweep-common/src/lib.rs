//! cloud-sweep-common - Discovery and bulk-deletion orchestration
//!
//! This crate holds everything about a sweep that does not depend on a
//! particular cloud SDK. Provider adapters plug in through [`ResourceAdapter`].
//!
//! ## Modules
//!
//! - [`adapter`]: Per-kind capability trait (list page, delete, describe)
//! - [`age_filter`]: Cutoff predicate applied to listed resources
//! - [`defaults`]: Default configuration values
//! - [`error`]: Provider and run-level error types
//! - [`executor`]: Bounded-concurrency delete submission
//! - [`lister`]: Paginated, age-filtered inventory
//! - [`orchestrator`]: Lister → Executor → Waiter composition
//! - [`outcome`]: Per-identifier deletion state machine
//! - [`report`]: Aggregated run report
//! - [`resource_kind`]: Supported resource kinds
//! - [`retry`]: Backoff for throttled/transient provider calls
//! - [`types`]: Identifiers and descriptors
//! - [`wait`]: Polling with backoff, deadline, and cancellation
//! - [`waiter`]: Completion tracking for submitted deletions

pub mod adapter;
pub mod age_filter;
pub mod defaults;
pub mod error;
pub mod executor;
pub mod lister;
pub mod orchestrator;
pub mod outcome;
pub mod report;
pub mod resource_kind;
pub mod retry;
pub mod types;
pub mod wait;
pub mod waiter;

// Re-export commonly used types
pub use adapter::{DeleteResponse, ListPage, ResourceAdapter, ResourceState};
pub use age_filter::{AgeCutoff, AgeFilter, MissingTimestampPolicy};
pub use error::{NukeError, ProviderError};
pub use executor::{DeletionExecutor, Submission};
pub use lister::ResourceLister;
pub use orchestrator::{NukeOrchestrator, NukeSettings};
pub use outcome::{CANCELLED_CAUSE, DeletionOutcome, DeletionState, SubmittedDeletion};
pub use report::{FailedResource, NukeReport, RunSummary, StateCounts};
pub use resource_kind::ResourceKind;
pub use retry::{RetryError, RetryPolicy, with_retry};
pub use types::{ResourceDescriptor, ResourceIdentifier};
pub use wait::{WaitConfig, WaitError, wait_until};
pub use waiter::CompletionWaiter;
