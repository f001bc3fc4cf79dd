//! AWS adapters for cloud-sweep
//!
//! This module provides:
//! - context: shared SDK configuration and client construction
//! - account: caller identity checks before a destructive sweep
//! - error: AWS error code classification
//! - elbv2: ELBv2 load balancer adapter
//! - ec2: EC2 instance adapter

pub mod account;
pub mod context;
pub mod ec2;
pub mod elbv2;
pub mod error;

pub use account::{AccountId, CallerIdentity, caller_identity, validate_account};
pub use context::AwsContext;
pub use ec2::InstanceAdapter;
pub use elbv2::LoadBalancerAdapter;
pub use error::{AwsError, classify_aws_error, classify_sdk_error};

use chrono::{DateTime, Utc};

/// Convert an AWS timestamp to chrono, `None` if out of range
pub(crate) fn smithy_to_utc(dt: &aws_sdk_ec2::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
