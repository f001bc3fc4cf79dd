//! Provider and run-level error types
//!
//! Provider errors are classified once by the adapter so the core can decide
//! between retrying and recording a per-resource failure without looking at
//! provider-specific codes.

use crate::resource_kind::ResourceKind;
use thiserror::Error;

/// Failure reported by a resource adapter
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded: {0}")]
    Throttled(String),

    /// Network/timeout/5xx style failure (retryable)
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Resource is still referenced by another resource (retryable)
    #[error("Resource has dependent objects: {0}")]
    DependencyViolation(String),

    /// Caller lacks permission for the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Any other provider error
    #[error("Provider error{}: {message}", code_suffix(.code))]
    Failed {
        code: Option<String>,
        message: String,
    },
}

impl ProviderError {
    /// Create a generic failure without an error code
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            code: None,
            message: message.into(),
        }
    }

    /// Whether the core should retry the call with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Throttled(_)
                | ProviderError::Transient(_)
                | ProviderError::DependencyViolation(_)
        )
    }

    /// Whether this is a rate-limit error
    pub fn is_throttled(&self) -> bool {
        matches!(self, ProviderError::Throttled(_))
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

/// Run-level failure of a nuke operation
///
/// Only listing failures (and cancellation before an inventory exists) abort
/// a run; per-resource problems end up in the report instead.
#[derive(Debug, Error)]
pub enum NukeError {
    /// The inventory could not be listed completely
    #[error("Failed to list {kind} resources in {region}")]
    List {
        kind: ResourceKind,
        region: String,
        #[source]
        source: ProviderError,
    },

    /// The run was cancelled before an inventory was available
    #[error("Listing {kind} resources in {region} was cancelled")]
    Cancelled { kind: ResourceKind, region: String },
}

impl NukeError {
    pub fn kind(&self) -> ResourceKind {
        match self {
            NukeError::List { kind, .. } | NukeError::Cancelled { kind, .. } => *kind,
        }
    }

    pub fn region(&self) -> &str {
        match self {
            NukeError::List { region, .. } | NukeError::Cancelled { region, .. } => region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Throttled("slow down".into()).is_retryable());
        assert!(ProviderError::Transient("connection reset".into()).is_retryable());
        assert!(ProviderError::DependencyViolation("eni attached".into()).is_retryable());
        assert!(!ProviderError::AccessDenied("nope".into()).is_retryable());
        assert!(!ProviderError::failed("boom").is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ProviderError::Failed {
                code: Some("OperationNotPermitted".into()),
                message: "deletion protection is enabled".into()
            }
            .to_string(),
            "Provider error (OperationNotPermitted): deletion protection is enabled"
        );
        assert_eq!(ProviderError::failed("boom").to_string(), "Provider error: boom");
    }

    #[test]
    fn test_list_error_keeps_cause() {
        let err = NukeError::List {
            kind: ResourceKind::LoadBalancerV2,
            region: "us-east-1".into(),
            source: ProviderError::AccessDenied("elasticloadbalancing:Describe*".into()),
        };
        assert_eq!(err.to_string(), "Failed to list elbv2 resources in us-east-1");
        assert!(err.source().unwrap().to_string().contains("Access denied"));
        assert_eq!(err.kind(), ResourceKind::LoadBalancerV2);
        assert_eq!(err.region(), "us-east-1");
    }
}
