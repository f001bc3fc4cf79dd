//! Configuration validation errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// regions list is empty
    #[error("at least one region is required")]
    NoRegions,

    /// a region entry is blank
    #[error("region names cannot be empty")]
    EmptyRegion,

    /// max_concurrency is zero
    #[error("max_concurrency must be at least 1")]
    InvalidMaxConcurrency,

    /// wait_timeout_secs is zero
    #[error("wait_timeout_secs must be greater than 0")]
    InvalidWaitTimeout,

    /// retry_attempts is zero
    #[error("retry_attempts must be at least 1")]
    InvalidRetryAttempts,

    /// older_than_hours does not fit a duration
    #[error("older_than_hours is too large: {0}")]
    InvalidMinAge(u64),

    /// account_id is not a 12-digit AWS account ID
    #[error("account_id must be 12 digits, got: {0}")]
    InvalidAccountId(String),

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::NoRegions.to_string(),
            "at least one region is required"
        );
        assert_eq!(
            ConfigError::InvalidAccountId("1234".to_string()).to_string(),
            "account_id must be 12 digits, got: 1234"
        );
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::io("/etc/cloud-sweep.json", io_err);
        assert!(err.to_string().contains("/etc/cloud-sweep.json"));
    }
}
