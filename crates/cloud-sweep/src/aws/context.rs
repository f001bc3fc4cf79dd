//! Per-region SDK configuration
//!
//! A sweep touches several services in the same region; they all share one
//! loaded configuration.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::fmt;
use std::sync::Arc;

/// Loaded AWS configuration for one region.
///
/// Cheap to clone. Adapters take `&AwsContext` and build their own client:
/// ```ignore
/// let ctx = AwsContext::with_profile("eu-west-1", Some("sandbox")).await;
/// let instances = InstanceAdapter::new(&ctx);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Resolve credentials from the default provider chain
    pub async fn new(region: &str) -> Self {
        Self::with_profile(region, None).await
    }

    /// Resolve credentials from `profile` when given, else the default chain
    pub async fn with_profile(region: &str, profile: Option<&str>) -> Self {
        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()));
        let loader = match profile {
            Some(name) => loader.profile_name(name),
            None => loader,
        };

        Self {
            config: Arc::new(loader.load().await),
            region: region.to_owned(),
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn ec2_client(&self) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(&self.config)
    }

    pub fn elbv2_client(&self) -> aws_sdk_elasticloadbalancingv2::Client {
        aws_sdk_elasticloadbalancingv2::Client::new(&self.config)
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(&self.config)
    }
}

impl fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AwsContext({})", self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_region_is_applied_to_config() {
        let ctx = AwsContext::new("eu-central-1").await;
        assert_eq!(ctx.region(), "eu-central-1");
        assert_eq!(
            ctx.sdk_config().region().map(|r| r.as_ref()),
            Some("eu-central-1")
        );
        assert_eq!(format!("{ctx:?}"), "AwsContext(eu-central-1)");
    }
}
