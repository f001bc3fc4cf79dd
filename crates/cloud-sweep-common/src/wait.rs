//! Deadline-bounded polling with exponential backoff and cancellation support.
//!
//! Every wait performs at least one check. Later checks are spaced out with
//! exponential backoff and never scheduled past the deadline.

use crate::defaults::{
    DEFAULT_CHECK_TIMEOUT_SECS, DEFAULT_POLL_INITIAL_DELAY_MS, DEFAULT_POLL_MAX_DELAY_SECS,
    DEFAULT_WAIT_TIMEOUT_SECS,
};
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Configuration for polling with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
    /// Upper bound for a single check
    pub check_timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_POLL_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_POLL_MAX_DELAY_SECS),
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            check_timeout: Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute deadline for a wait starting now
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }
}

/// Why a wait ended without reaching its condition
#[derive(Debug, Error)]
pub enum WaitError<E> {
    #[error("Timed out waiting for {resource} after {attempts} checks")]
    TimedOut { resource: String, attempts: u32 },

    #[error("Wait for {resource} cancelled")]
    Cancelled { resource: String },

    #[error("Check for {resource} failed")]
    Check {
        resource: String,
        #[source]
        source: E,
    },
}

/// Poll `check` until it yields a value, fails, the deadline passes, or
/// `cancel` fires.
///
/// * `Ok(Some(value))` from `check` ends the wait successfully
/// * `Ok(None)` means "not yet", and so does a check exceeding `check_timeout`
/// * `Err(e)` ends the wait with [`WaitError::Check`]
///
/// # Example
/// ```ignore
/// let deadline = config.deadline();
/// let state = wait_until(&config, deadline, &cancel, "lb-1", || async {
///     Ok::<_, ProviderError>(lookup().await.filter(|s| s.is_terminal()))
/// })
/// .await?;
/// ```
pub async fn wait_until<T, E, F, Fut>(
    config: &WaitConfig,
    deadline: Instant,
    cancel: &CancellationToken,
    resource: &str,
    mut check: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let mut attempts = 0u32;

    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    loop {
        if cancel.is_cancelled() {
            return Err(WaitError::Cancelled {
                resource: resource.to_string(),
            });
        }

        attempts += 1;

        // The first check always runs in full, later ones are clipped to the deadline
        let check_started = Instant::now();
        let mut check_deadline = check_started + config.check_timeout;
        if attempts > 1 {
            check_deadline = check_deadline.min(deadline);
        }

        match tokio::time::timeout_at(check_deadline, check()).await {
            Ok(Ok(Some(value))) => {
                debug!(resource, attempts, "Condition reached");
                return Ok(value);
            }
            Ok(Ok(None)) => {}
            Ok(Err(source)) => {
                return Err(WaitError::Check {
                    resource: resource.to_string(),
                    source,
                });
            }
            Err(_) => {
                debug!(
                    resource,
                    attempt = attempts,
                    check_timeout = ?config.check_timeout,
                    "Check timed out, treating as not ready"
                );
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::TimedOut {
                resource: resource.to_string(),
                attempts,
            });
        }

        let delay = delays
            .next()
            .unwrap_or(config.max_delay)
            .min(deadline - now);
        debug!(
            resource,
            attempt = attempts,
            delay_ms = delay.as_millis(),
            "Not ready, polling again"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                return Err(WaitError::Cancelled {
                    resource: resource.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(timeout: Duration) -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            timeout,
            check_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_check() {
        let cfg = config(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let result = wait_until(&cfg, cfg.deadline(), &cancel, "r", || async {
            Ok::<_, Infallible>(Some(7))
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_polls() {
        let cfg = config(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = wait_until(&cfg, cfg.deadline(), &cancel, "r", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>((n >= 3).then_some(()))
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_deadline() {
        let cfg = config(Duration::from_millis(50));
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let result: Result<(), _> = wait_until(&cfg, cfg.deadline(), &cancel, "r", || async {
            Ok::<_, Infallible>(None)
        })
        .await;

        assert!(matches!(result, Err(WaitError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_once_even_when_deadline_passed() {
        let cfg = config(Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let deadline = Instant::now();
        tokio::time::advance(Duration::from_secs(2)).await;

        let result = wait_until(&cfg, deadline, &cancel, "r", || async {
            Ok::<_, Infallible>(Some("gone"))
        })
        .await;
        assert_eq!(result.unwrap(), "gone");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_check_counts_as_not_ready() {
        let cfg = WaitConfig {
            check_timeout: Duration::from_millis(20),
            ..config(Duration::from_millis(200))
        };
        let cancel = CancellationToken::new();
        let result: Result<(), _> = wait_until(&cfg, cfg.deadline(), &cancel, "r", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, Infallible>(Some(()))
        })
        .await;
        assert!(matches!(result, Err(WaitError::TimedOut { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_ends_wait() {
        let cfg = config(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let result: Result<(), _> = wait_until(&cfg, cfg.deadline(), &cancel, "r", || async {
            Err::<Option<()>, _>("describe failed")
        })
        .await;
        assert!(matches!(result, Err(WaitError::Check { source: "describe failed", .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_sleep() {
        let cfg = config(Duration::from_secs(600));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let result: Result<(), _> = wait_until(&cfg, cfg.deadline(), &cancel, "r", || async {
            Ok::<_, Infallible>(None)
        })
        .await;
        assert!(matches!(result, Err(WaitError::Cancelled { .. })));
    }
}
