//! Identifiers and descriptors produced by listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-assigned identifier (ARN, instance ID, ...) of one resource in a region
///
/// Opaque to the core: it is only compared, hashed, logged, and handed back
/// to the adapter that produced it.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ResourceIdentifier(String);

impl ResourceIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceIdentifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A listed resource and its creation time
///
/// `created_at` is `None` when the provider omitted the timestamp or it
/// could not be parsed; the age filter decides what that means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub identifier: ResourceIdentifier,
    pub created_at: Option<DateTime<Utc>>,
}

impl ResourceDescriptor {
    pub fn new(identifier: impl Into<ResourceIdentifier>, created_at: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            created_at: Some(created_at),
        }
    }

    /// Descriptor for a resource whose creation time is unknown
    pub fn undated(identifier: impl Into<ResourceIdentifier>) -> Self {
        Self {
            identifier: identifier.into(),
            created_at: None,
        }
    }
}
