//! Sweep configuration
//!
//! Every field has a default, so an empty JSON object is a valid file. CLI
//! flags are applied on top of whatever the file provides.

use crate::error::ConfigError;
use chrono::{DateTime, Duration, Utc};
use cloud_sweep_common::defaults::{
    default_max_concurrency, default_min_age_hours, default_regions, default_retry_attempts,
    default_wait_timeout_secs,
};
use cloud_sweep_common::{AgeCutoff, MissingTimestampPolicy, NukeSettings, ResourceKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// AWS regions to sweep
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Resource kinds to sweep (empty = all supported kinds)
    #[serde(default)]
    pub resource_types: Vec<ResourceKind>,

    /// Only resources created more than this many hours ago are eligible
    #[serde(default = "default_min_age_hours")]
    pub older_than_hours: u64,

    /// Maximum in-flight AWS calls per phase
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Deadline for deletion confirmation
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Total attempts for throttled or transient AWS calls
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default)]
    pub missing_timestamp: MissingTimestampPolicy,

    /// Named AWS profile (overrides AWS_PROFILE)
    #[serde(default)]
    pub aws_profile: Option<String>,

    /// Refuse to run unless the credentials belong to this account
    #[serde(default)]
    pub account_id: Option<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            resource_types: Vec::new(),
            older_than_hours: default_min_age_hours(),
            max_concurrency: default_max_concurrency(),
            wait_timeout_secs: default_wait_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            missing_timestamp: MissingTimestampPolicy::default(),
            aws_profile: None,
            account_id: None,
        }
    }
}

impl SweepConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        if self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::EmptyRegion);
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidMaxConcurrency);
        }
        if self.wait_timeout_secs == 0 {
            return Err(ConfigError::InvalidWaitTimeout);
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidRetryAttempts);
        }
        if i64::try_from(self.older_than_hours)
            .ok()
            .and_then(Duration::try_hours)
            .is_none()
        {
            return Err(ConfigError::InvalidMinAge(self.older_than_hours));
        }
        match &self.account_id {
            Some(account) if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) => {
                Err(ConfigError::InvalidAccountId(account.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Kinds to sweep, deduplicated and in sweep order
    pub fn kinds(&self) -> Vec<ResourceKind> {
        if self.resource_types.is_empty() {
            return ResourceKind::all();
        }
        let mut kinds = self.resource_types.clone();
        kinds.sort_by_key(|k| (k.sweep_priority(), *k));
        kinds.dedup();
        kinds
    }

    /// Regions to sweep, deduplicated in the order given
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for region in &self.regions {
            let region = region.trim();
            if !regions.iter().any(|r| r == region) {
                regions.push(region.to_string());
            }
        }
        regions
    }

    /// Cutoff for "older than `older_than_hours`" measured from `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> AgeCutoff {
        let min_age = i64::try_from(self.older_than_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        AgeCutoff::at(now.checked_sub_signed(min_age).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    pub fn settings(&self) -> NukeSettings {
        let mut settings = NukeSettings::default()
            .with_max_concurrency(self.max_concurrency)
            .with_wait_timeout(std::time::Duration::from_secs(self.wait_timeout_secs))
            .with_missing_timestamp(self.missing_timestamp);
        settings.retry.max_attempts = self.retry_attempts.max(1);
        settings
    }
}
