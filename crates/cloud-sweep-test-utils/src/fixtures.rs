//! Inventory fixtures

use chrono::{Duration, Utc};
use cloud_sweep_common::ResourceDescriptor;

/// A resource created `age` ago
pub fn aged(id: &str, age: Duration) -> ResourceDescriptor {
    ResourceDescriptor::new(id, Utc::now() - age)
}

/// `count` resources named `{prefix}-{n}`, all created `age` ago
pub fn inventory(prefix: &str, count: usize, age: Duration) -> Vec<ResourceDescriptor> {
    (0..count)
        .map(|n| aged(&format!("{prefix}-{n}"), age))
        .collect()
}
