//! Helpers for tests that talk to real AWS

/// Environment variables consulted for the test region, in order
const REGION_VARS: &[&str] = &["CLOUD_SWEEP_TEST_REGION", "AWS_REGION", "AWS_DEFAULT_REGION"];

/// Region used by credential-gated tests; us-east-1 if nothing is set
pub fn get_test_region() -> String {
    REGION_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|region| !region.trim().is_empty())
        .unwrap_or_else(|| "us-east-1".to_string())
}
