//! Bounded retries for provider calls

use crate::defaults::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_SECS, DEFAULT_RETRY_MIN_DELAY_MS};
use crate::error::ProviderError;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Backoff applied to retryable provider errors (throttling, transient, in-use)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            min_delay: Duration::from_millis(DEFAULT_RETRY_MIN_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_RETRY_MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
            .with_jitter()
    }
}

/// Why a retried call gave up
#[derive(Debug, Clone, Error)]
pub enum RetryError {
    /// The last attempt failed with this error
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Cancellation fired before the next attempt was sent
    #[error("cancelled before the call was sent")]
    Cancelled,
}

impl RetryError {
    fn is_retryable(&self) -> bool {
        match self {
            RetryError::Provider(e) => e.is_retryable(),
            RetryError::Cancelled => false,
        }
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, the
/// policy runs out of attempts, or `cancel` fires.
///
/// Cancellation cuts the current backoff short and no further attempt is
/// sent. An attempt already in flight is allowed to finish.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: &str,
    resource: &str,
    mut call: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let attempt = || {
        let cancelled = cancel.is_cancelled();
        // Not polled (so nothing is sent) when already cancelled
        let pending = call();
        async move {
            if cancelled {
                return Err(RetryError::Cancelled);
            }
            pending.await.map_err(RetryError::Provider)
        }
    };

    let token = cancel.clone();
    let interruptible_sleep = move |delay: Duration| {
        let token = token.clone();
        async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = token.cancelled() => {}
            }
        }
    };

    attempt
        .retry(policy.backoff())
        .sleep(interruptible_sleep)
        .when(RetryError::is_retryable)
        .notify(|e, dur| {
            warn!(
                operation,
                resource,
                delay = ?dur,
                error = %e,
                "Provider call failed, retrying..."
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retries_throttling_until_success() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let result = with_retry(&fast_policy(3), &cancel, "delete", "lb-1", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ProviderError::Throttled("Rate exceeded".into()))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let result: Result<(), _> = with_retry(&fast_policy(3), &cancel, "delete", "lb-1", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Transient("connection reset".into()))
        })
        .await;

        assert!(matches!(
            result,
            Err(RetryError::Provider(ProviderError::Transient(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let result: Result<(), _> = with_retry(&fast_policy(5), &cancel, "delete", "lb-1", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::AccessDenied("not authorized".into()))
        })
        .await;

        assert!(matches!(
            result,
            Err(RetryError::Provider(ProviderError::AccessDenied(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let _: Result<(), _> =
            with_retry(&RetryPolicy::no_retry(), &cancel, "list", "us-east-1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::Throttled("slow down".into()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), _> = with_retry(&fast_policy(3), &cancel, "delete", "lb-1", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_cuts_backoff_short() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let slow = RetryPolicy {
            max_attempts: 5,
            min_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let result: Result<(), _> = with_retry(&slow, &cancel, "delete", "lb-1", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Throttled("Rate exceeded".into()))
        })
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
