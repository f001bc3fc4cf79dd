//! Default configuration values shared by the core and the CLI
//!
//! These constants keep the orchestrator, file configuration, and CLI flags
//! in agreement about what "unset" means.

/// Default maximum number of in-flight provider calls per phase
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Default total attempts for a throttled/transient provider call
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default first retry delay in milliseconds
pub const DEFAULT_RETRY_MIN_DELAY_MS: u64 = 500;

/// Default retry delay cap in seconds
pub const DEFAULT_RETRY_MAX_DELAY_SECS: u64 = 10;

/// Default deadline for deletion confirmation in seconds (10 minutes)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 600;

/// Default first poll interval in milliseconds
pub const DEFAULT_POLL_INITIAL_DELAY_MS: u64 = 500;

/// Default poll interval cap in seconds
pub const DEFAULT_POLL_MAX_DELAY_SECS: u64 = 15;

/// Default bound on a single state check in seconds
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 30;

/// Default minimum resource age in hours
pub const DEFAULT_MIN_AGE_HOURS: u64 = 1;

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

// Serde default functions for struct field defaults

/// Returns the default max concurrency
pub fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

/// Returns the default retry attempts
pub fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

/// Returns the default wait timeout
pub fn default_wait_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT_SECS
}

/// Returns the default minimum age
pub fn default_min_age_hours() -> u64 {
    DEFAULT_MIN_AGE_HOURS
}

/// Returns the default region list
pub fn default_regions() -> Vec<String> {
    vec![DEFAULT_REGION.to_string()]
}
