//! Shared test utilities for cloud-sweep
//!
//! - [`fake`]: scriptable in-memory [`ResourceAdapter`](cloud_sweep_common::ResourceAdapter)
//! - [`fixtures`]: inventory builders relative to "now"
//! - [`aws`]: region selection for credential-gated tests

pub mod aws;
pub mod fake;
pub mod fixtures;

pub use fake::{DeleteBehavior, DescribeBehavior, FakeProvider};
