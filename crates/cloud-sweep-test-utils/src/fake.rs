//! Scriptable in-memory provider
//!
//! [`FakeProvider`] serves a fixed inventory in pages and lets tests script
//! how each identifier responds to delete and describe calls. Accepted
//! deletions remove the resource from the inventory, so a second run sees
//! what a real provider would.
//!
//! Delete and describe calls can be given a latency, and the provider records
//! the peak number of those calls in flight at once.

use cloud_sweep_common::{
    DeleteResponse, ListPage, ProviderError, ResourceAdapter, ResourceDescriptor,
    ResourceIdentifier, ResourceKind, ResourceState,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How `delete_one` responds for an identifier
#[derive(Debug, Clone)]
pub enum DeleteBehavior {
    /// Accept and remove from the inventory
    Accept,
    /// Report the resource as already gone
    NotFound,
    /// Fail every attempt with this error
    Fail(ProviderError),
    /// Throttle this many attempts, then accept
    ThrottleThenAccept(u32),
}

/// How `describe_state` responds for an identifier after deletion was requested
#[derive(Debug, Clone)]
pub enum DescribeBehavior {
    /// Not found on the first check
    GoneImmediately,
    /// Exists forever
    ExistsForever,
    /// Exists for this many checks, then not found
    ExistsFor(u32),
    /// Provider reports a failed deletion
    DeleteFailed(String),
    /// Throttled for this many checks, then not found
    ThrottleThenGone(u32),
    /// Every check fails with this error
    Error(ProviderError),
}

#[derive(Debug)]
struct FakeState {
    inventory: Vec<ResourceDescriptor>,
    delete_behavior: HashMap<ResourceIdentifier, DeleteBehavior>,
    describe_behavior: HashMap<ResourceIdentifier, DescribeBehavior>,
    default_describe: DescribeBehavior,
    list_failure: Option<ProviderError>,
    list_throttles: u32,
    repeat_token: bool,
    list_calls: u32,
    delete_calls: HashMap<ResourceIdentifier, u32>,
    describe_calls: HashMap<ResourceIdentifier, u32>,
}

#[derive(Debug)]
pub struct FakeProvider {
    kind: ResourceKind,
    region: String,
    page_size: usize,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    state: Mutex<FakeState>,
}

/// Counts one delete or describe call as in flight until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeProvider {
    pub fn new(kind: ResourceKind, region: &str) -> Self {
        Self {
            kind,
            region: region.to_string(),
            page_size: 100,
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            state: Mutex::new(FakeState {
                inventory: Vec::new(),
                delete_behavior: HashMap::new(),
                describe_behavior: HashMap::new(),
                default_describe: DescribeBehavior::GoneImmediately,
                list_failure: None,
                list_throttles: 0,
                repeat_token: false,
                list_calls: 0,
                delete_calls: HashMap::new(),
                describe_calls: HashMap::new(),
            }),
        }
    }

    /// A load balancer provider in us-east-1 serving `resources`
    pub fn with_inventory(resources: Vec<ResourceDescriptor>) -> Self {
        Self::new(ResourceKind::LoadBalancerV2, "us-east-1").with_resources(resources)
    }

    pub fn with_resources(self, resources: Vec<ResourceDescriptor>) -> Self {
        self.state().inventory = resources;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every delete and describe call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_delete_behavior(self, id: &str, behavior: DeleteBehavior) -> Self {
        self.state().delete_behavior.insert(id.into(), behavior);
        self
    }

    pub fn with_describe_behavior(self, id: &str, behavior: DescribeBehavior) -> Self {
        self.state().describe_behavior.insert(id.into(), behavior);
        self
    }

    /// Describe behaviour for identifiers without a specific one
    pub fn with_default_describe(self, behavior: DescribeBehavior) -> Self {
        self.state().default_describe = behavior;
        self
    }

    /// Fail every page request with `error`
    pub fn with_list_failure(self, error: ProviderError) -> Self {
        self.state().list_failure = Some(error);
        self
    }

    /// Throttle the first `count` page requests
    pub fn with_list_throttles(self, count: u32) -> Self {
        self.state().list_throttles = count;
        self
    }

    /// Always hand out the same continuation token
    pub fn with_repeating_token(self) -> Self {
        self.state().repeat_token = true;
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.state().list_calls
    }

    pub fn delete_attempts(&self, id: &str) -> u32 {
        self.state()
            .delete_calls
            .get(&ResourceIdentifier::from(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn describe_calls(&self, id: &str) -> u32 {
        self.state()
            .describe_calls
            .get(&ResourceIdentifier::from(id))
            .copied()
            .unwrap_or(0)
    }

    /// Most delete and describe calls ever in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Identifiers that received at least one delete call
    pub fn delete_targets(&self) -> BTreeSet<ResourceIdentifier> {
        self.state().delete_calls.keys().cloned().collect()
    }

    /// Identifiers still in the inventory
    pub fn remaining(&self) -> BTreeSet<ResourceIdentifier> {
        self.state()
            .inventory
            .iter()
            .map(|r| r.identifier.clone())
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn delete_now(&self, id: &ResourceIdentifier) -> Result<DeleteResponse, ProviderError> {
        let mut state = self.state();
        let attempt = {
            let calls = state.delete_calls.entry(id.clone()).or_insert(0);
            *calls += 1;
            *calls
        };

        let behavior = state
            .delete_behavior
            .get(id)
            .cloned()
            .unwrap_or(DeleteBehavior::Accept);

        match behavior {
            DeleteBehavior::Accept => {}
            DeleteBehavior::NotFound => return Ok(DeleteResponse::NotFound),
            DeleteBehavior::Fail(err) => return Err(err),
            DeleteBehavior::ThrottleThenAccept(n) if attempt <= n => {
                return Err(ProviderError::Throttled("Rate exceeded".into()));
            }
            DeleteBehavior::ThrottleThenAccept(_) => {}
        }

        let before = state.inventory.len();
        state.inventory.retain(|r| &r.identifier != id);
        if state.inventory.len() == before {
            Ok(DeleteResponse::NotFound)
        } else {
            Ok(DeleteResponse::Deleted)
        }
    }

    fn describe_now(&self, id: &ResourceIdentifier) -> Result<ResourceState, ProviderError> {
        let mut state = self.state();
        let check = {
            let calls = state.describe_calls.entry(id.clone()).or_insert(0);
            *calls += 1;
            *calls
        };

        let behavior = state
            .describe_behavior
            .get(id)
            .cloned()
            .unwrap_or_else(|| state.default_describe.clone());

        match behavior {
            DescribeBehavior::GoneImmediately => Ok(ResourceState::NotFound),
            DescribeBehavior::ExistsForever => Ok(ResourceState::Exists),
            DescribeBehavior::ExistsFor(n) if check <= n => Ok(ResourceState::Exists),
            DescribeBehavior::ExistsFor(_) => Ok(ResourceState::NotFound),
            DescribeBehavior::DeleteFailed(reason) => Ok(ResourceState::DeleteFailed(reason)),
            DescribeBehavior::ThrottleThenGone(n) if check <= n => {
                Err(ProviderError::Throttled("Rate exceeded".into()))
            }
            DescribeBehavior::ThrottleThenGone(_) => Ok(ResourceState::NotFound),
            DescribeBehavior::Error(err) => Err(err),
        }
    }
}

impl ResourceAdapter for FakeProvider {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn list_page(&self, continuation: Option<String>) -> Result<ListPage, ProviderError> {
        let mut state = self.state();
        state.list_calls += 1;

        if let Some(err) = &state.list_failure {
            return Err(err.clone());
        }
        if state.list_throttles > 0 {
            state.list_throttles -= 1;
            return Err(ProviderError::Throttled("Rate exceeded".into()));
        }

        let offset = match continuation.as_deref() {
            None => 0,
            Some(token) => token
                .strip_prefix("offset-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| ProviderError::failed(format!("invalid marker {token}")))?,
        };

        let end = (offset + self.page_size).min(state.inventory.len());
        let resources = state.inventory.get(offset..end).unwrap_or_default().to_vec();
        let next_token = if state.repeat_token {
            Some("offset-0".to_string())
        } else if end < state.inventory.len() {
            Some(format!("offset-{end}"))
        } else {
            None
        };

        Ok(ListPage {
            resources,
            next_token,
        })
    }

    async fn delete_one(&self, id: &ResourceIdentifier) -> Result<DeleteResponse, ProviderError> {
        let _in_flight = self.enter();
        self.simulate_latency().await;
        self.delete_now(id)
    }

    async fn describe_state(&self, id: &ResourceIdentifier) -> Result<ResourceState, ProviderError> {
        let _in_flight = self.enter();
        self.simulate_latency().await;
        self.describe_now(id)
    }
}
