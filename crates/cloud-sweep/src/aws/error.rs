//! AWS error classification
//!
//! Classifies AWS SDK errors by their `.code()` instead of string matching on
//! the Debug format, and maps the result onto [`ProviderError`].

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use cloud_sweep_common::ProviderError;
use thiserror::Error;

/// AWS error categories for retry and nuke logic
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Resource was not found (deletion goal already reached)
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded: {0}")]
    Throttled(String),

    /// Resource has dependent objects (retryable, e.g. instance with attached ENI)
    #[error("Resource has dependent objects: {0}")]
    DependencyViolation(String),

    /// Caller is not allowed to perform the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Timeout, connection failure, or AWS-side 5xx (retryable)
    #[error("Transient AWS error: {0}")]
    Transient(String),

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }
}

impl From<AwsError> for ProviderError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Throttled(msg) => ProviderError::Throttled(msg),
            AwsError::DependencyViolation(msg) => ProviderError::DependencyViolation(msg),
            AwsError::AccessDenied(msg) => ProviderError::AccessDenied(msg),
            AwsError::Transient(msg) => ProviderError::Transient(msg),
            // Adapters turn not-found into DeleteResponse/ResourceState before converting
            AwsError::NotFound { code, message } => ProviderError::Failed {
                code: Some(code),
                message,
            },
            AwsError::Sdk { code, message } => ProviderError::Failed { code, message },
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "LoadBalancerNotFound",
    "InvalidInstanceID.NotFound",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Known AWS error codes for dependency violations (resource still in use)
const DEPENDENCY_CODES: &[&str] = &["DependencyViolation", "ResourceInUse"];

/// Known AWS error codes for missing permissions
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "AuthFailure",
];

/// Known AWS error codes for server-side failures worth retrying
const TRANSIENT_CODES: &[&str] = &[
    "InternalError",
    "InternalFailure",
    "ServiceUnavailable",
    "Unavailable",
    "RequestTimeout",
];

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled(message),
        Some(c) if DEPENDENCY_CODES.contains(&c) => AwsError::DependencyViolation(message),
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied(message),
        Some(c) if TRANSIENT_CODES.contains(&c) => AwsError::Transient(message),
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK error from any AWS service client.
///
/// Timeouts and dispatch failures never reached AWS and are transient;
/// everything else is classified by its error code.
pub fn classify_sdk_error<E, R>(err: &SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::TimeoutError(_) => AwsError::Transient("request timed out".to_string()),
        SdkError::DispatchFailure(_) => {
            AwsError::Transient("failed to dispatch request".to_string())
        }
        SdkError::ResponseError(_) => {
            AwsError::Transient("unparsable response from AWS".to_string())
        }
        _ => classify_aws_error(err.code(), err.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert!(!ProviderError::from(err).is_retryable());
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::Throttled(_)));
            let mapped = ProviderError::from(err);
            assert!(mapped.is_throttled(), "Expected throttled for code: {code}");
            assert!(mapped.is_retryable());
        }
    }

    #[test]
    fn dependency_violation() {
        for code in DEPENDENCY_CODES {
            let mapped = ProviderError::from(classify_aws_error(Some(code), Some("ENI attached")));
            assert!(mapped.is_retryable());
            assert!(matches!(mapped, ProviderError::DependencyViolation(_)));
        }
    }

    #[test]
    fn access_denied_is_not_retryable() {
        for code in ACCESS_DENIED_CODES {
            let mapped = ProviderError::from(classify_aws_error(Some(code), Some("not authorized")));
            assert!(!mapped.is_retryable(), "Expected non-retryable for code: {code}");
            assert!(matches!(mapped, ProviderError::AccessDenied(_)));
        }
    }

    #[test]
    fn transient_codes() {
        for code in TRANSIENT_CODES {
            let err = classify_aws_error(Some(code), Some("try again"));
            assert!(ProviderError::from(err).is_retryable());
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("OperationNotPermitted"), Some("protected"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        match ProviderError::from(err) {
            ProviderError::Failed { code, message } => {
                assert_eq!(code.as_deref(), Some("OperationNotPermitted"));
                assert_eq!(message, "protected");
            }
            other => panic!("unexpected classification: {other:?}"),
        }

        let err2 = classify_aws_error(None, None);
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
        assert_eq!(err2.to_string(), "AWS error: Unknown error");
    }
}
