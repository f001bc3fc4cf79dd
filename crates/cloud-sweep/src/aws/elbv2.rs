//! ELBv2 (application, network, gateway) load balancers

use super::context::AwsContext;
use super::error::classify_sdk_error;
use super::smithy_to_utc;
use aws_sdk_elasticloadbalancingv2::Client;
use aws_sdk_elasticloadbalancingv2::types::LoadBalancer;
use cloud_sweep_common::{
    DeleteResponse, ListPage, ProviderError, ResourceAdapter, ResourceDescriptor,
    ResourceIdentifier, ResourceKind, ResourceState,
};
use tracing::debug;

/// Maximum page size accepted by DescribeLoadBalancers
pub const LIST_PAGE_SIZE: i32 = 400;

/// Load balancers in one region, identified by ARN
#[derive(Debug, Clone)]
pub struct LoadBalancerAdapter {
    client: Client,
    region: String,
}

impl LoadBalancerAdapter {
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.elbv2_client(),
            region: ctx.region().to_string(),
        }
    }
}

fn describe(lb: &LoadBalancer) -> Option<ResourceDescriptor> {
    let arn = lb.load_balancer_arn()?;
    Some(ResourceDescriptor {
        identifier: ResourceIdentifier::from(arn),
        created_at: lb.created_time().and_then(smithy_to_utc),
    })
}

impl ResourceAdapter for LoadBalancerAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::LoadBalancerV2
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn list_page(&self, continuation: Option<String>) -> Result<ListPage, ProviderError> {
        let response = self
            .client
            .describe_load_balancers()
            .set_marker(continuation)
            .page_size(LIST_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| ProviderError::from(classify_sdk_error(&e)))?;

        let resources = response
            .load_balancers()
            .iter()
            .filter_map(describe)
            .collect();

        Ok(ListPage {
            resources,
            next_token: response.next_marker().map(str::to_string),
        })
    }

    async fn delete_one(&self, id: &ResourceIdentifier) -> Result<DeleteResponse, ProviderError> {
        let result = self
            .client
            .delete_load_balancer()
            .load_balancer_arn(id.as_str())
            .send()
            .await;

        match result {
            Ok(_) => Ok(DeleteResponse::Deleted),
            Err(e) => {
                let err = classify_sdk_error(&e);
                if err.is_not_found() {
                    Ok(DeleteResponse::NotFound)
                } else {
                    Err(err.into())
                }
            }
        }
    }

    async fn describe_state(&self, id: &ResourceIdentifier) -> Result<ResourceState, ProviderError> {
        let result = self
            .client
            .describe_load_balancers()
            .load_balancer_arns(id.as_str())
            .send()
            .await;

        match result {
            Ok(response) => match response.load_balancers().first() {
                Some(lb) => {
                    debug!(
                        resource_id = %id,
                        state = ?lb.state().and_then(|s| s.code()),
                        "Load balancer still present"
                    );
                    Ok(ResourceState::Exists)
                }
                None => Ok(ResourceState::NotFound),
            },
            Err(e) => {
                let err = classify_sdk_error(&e);
                if err.is_not_found() {
                    Ok(ResourceState::NotFound)
                } else {
                    Err(err.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_elasticloadbalancingv2::primitives::DateTime as SmithyDateTime;

    #[test]
    fn test_describe_uses_arn_and_created_time() {
        let lb = LoadBalancer::builder()
            .load_balancer_arn("arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/web/50dc6c495c0c9188")
            .created_time(SmithyDateTime::from_secs(1_700_000_000))
            .build();

        let descriptor = describe(&lb).unwrap();
        assert!(descriptor.identifier.ends_with("/app/web/50dc6c495c0c9188"));
        assert_eq!(descriptor.created_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_describe_without_timestamp_is_undated() {
        let lb = LoadBalancer::builder().load_balancer_arn("arn:lb").build();
        assert!(describe(&lb).unwrap().created_at.is_none());
    }

    #[test]
    fn test_describe_without_arn_is_skipped() {
        let lb = LoadBalancer::builder().load_balancer_name("web").build();
        assert!(describe(&lb).is_none());
    }
}
