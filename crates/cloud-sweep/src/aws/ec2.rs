//! EC2 instances

use super::context::AwsContext;
use super::error::classify_sdk_error;
use super::smithy_to_utc;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, Instance, InstanceStateName};
use cloud_sweep_common::{
    DeleteResponse, ListPage, ProviderError, ResourceAdapter, ResourceDescriptor,
    ResourceIdentifier, ResourceKind, ResourceState,
};
use tracing::debug;

/// Maximum page size accepted by DescribeInstances
pub const LIST_PAGE_SIZE: i32 = 1000;

/// Instance states worth terminating; terminated and shutting-down
/// instances are already on their way out.
const LIVE_STATES: &[&str] = &["pending", "running", "stopping", "stopped"];

/// EC2 instances in one region, identified by instance ID
#[derive(Debug, Clone)]
pub struct InstanceAdapter {
    client: Client,
    region: String,
}

impl InstanceAdapter {
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
            region: ctx.region().to_string(),
        }
    }
}

fn describe(instance: &Instance) -> Option<ResourceDescriptor> {
    let instance_id = instance.instance_id()?;
    Some(ResourceDescriptor {
        identifier: ResourceIdentifier::from(instance_id),
        created_at: instance.launch_time().and_then(smithy_to_utc),
    })
}

/// Map an instance state onto deletion progress
fn instance_state(state: Option<&InstanceStateName>) -> ResourceState {
    match state {
        Some(InstanceStateName::Terminated) | None => ResourceState::NotFound,
        Some(_) => ResourceState::Exists,
    }
}

impl ResourceAdapter for InstanceAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Ec2Instance
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn list_page(&self, continuation: Option<String>) -> Result<ListPage, ProviderError> {
        let mut state_filter = Filter::builder().name("instance-state-name");
        for state in LIVE_STATES {
            state_filter = state_filter.values(*state);
        }

        let response = self
            .client
            .describe_instances()
            .filters(state_filter.build())
            .set_next_token(continuation)
            .max_results(LIST_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| ProviderError::from(classify_sdk_error(&e)))?;

        let resources = response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(describe)
            .collect();

        Ok(ListPage {
            resources,
            next_token: response.next_token().map(str::to_string),
        })
    }

    async fn delete_one(&self, id: &ResourceIdentifier) -> Result<DeleteResponse, ProviderError> {
        let result = self
            .client
            .terminate_instances()
            .instance_ids(id.as_str())
            .send()
            .await;

        match result {
            Ok(response) => {
                let previous = response
                    .terminating_instances()
                    .first()
                    .and_then(|change| change.previous_state())
                    .and_then(|s| s.name());
                if previous == Some(&InstanceStateName::Terminated) {
                    debug!(resource_id = %id, "Instance was already terminated");
                    Ok(DeleteResponse::NotFound)
                } else {
                    Ok(DeleteResponse::Deleted)
                }
            }
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
            .describe_instances()
            .instance_ids(id.as_str())
            .send()
            .await;

        match result {
            Ok(response) => {
                let state = response
                    .reservations()
                    .first()
                    .and_then(|r| r.instances().first())
                    .and_then(|i| i.state())
                    .and_then(|s| s.name());
                Ok(instance_state(state))
            }
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
