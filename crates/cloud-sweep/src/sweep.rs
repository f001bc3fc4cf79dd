//! Multi-region, multi-kind sweep driver
//!
//! Runs one orchestrator per (region, kind) pair, one pair at a time. A list
//! failure for one pair is recorded and the sweep moves on, so a single
//! broken region or missing permission does not hide problems elsewhere.

use crate::aws::{AwsContext, InstanceAdapter, LoadBalancerAdapter};
use cloud_sweep_common::{
    AgeCutoff, NukeError, NukeOrchestrator, NukeReport, NukeSettings, ResourceDescriptor,
    ResourceKind,
};
use serde::Serialize;
use std::error::Error as _;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What to sweep
#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub regions: Vec<String>,
    pub kinds: Vec<ResourceKind>,
    pub cutoff: AgeCutoff,
    pub aws_profile: Option<String>,
}

/// A (region, kind) pair whose inventory could not be listed
#[derive(Debug, Clone, Serialize)]
pub struct ListFailure {
    pub resource_kind: ResourceKind,
    pub region: String,
    pub error: String,
}

impl From<&NukeError> for ListFailure {
    fn from(err: &NukeError) -> Self {
        let mut error = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            error.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        Self {
            resource_kind: err.kind(),
            region: err.region().to_string(),
            error,
        }
    }
}

/// Resources `nuke` would delete for one (region, kind) pair
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub resource_kind: ResourceKind,
    pub region: String,
    pub resources: Vec<ResourceDescriptor>,
}

/// Results of a sweep across every requested pair
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport<T> {
    pub reports: Vec<T>,
    pub list_failures: Vec<ListFailure>,
    pub cancelled: bool,
}

impl<T> Default for SweepReport<T> {
    fn default() -> Self {
        Self {
            reports: Vec::new(),
            list_failures: Vec::new(),
            cancelled: false,
        }
    }
}

impl SweepReport<NukeReport> {
    /// True if any pair failed to list or any resource was not confirmed deleted
    pub fn has_failures(&self) -> bool {
        !self.list_failures.is_empty() || self.reports.iter().any(NukeReport::has_failures)
    }
}

impl SweepReport<Inventory> {
    pub fn has_failures(&self) -> bool {
        !self.list_failures.is_empty()
    }

    pub fn total_resources(&self) -> usize {
        self.reports.iter().map(|i| i.resources.len()).sum()
    }
}

/// Nuke one kind in one region
pub async fn run_nuke(
    ctx: &AwsContext,
    kind: ResourceKind,
    cutoff: AgeCutoff,
    settings: NukeSettings,
    cancel: &CancellationToken,
) -> Result<NukeReport, NukeError> {
    match kind {
        ResourceKind::LoadBalancerV2 => {
            NukeOrchestrator::new(LoadBalancerAdapter::new(ctx), settings)
                .with_cancellation(cancel.clone())
                .nuke(cutoff)
                .await
        }
        ResourceKind::Ec2Instance => {
            NukeOrchestrator::new(InstanceAdapter::new(ctx), settings)
                .with_cancellation(cancel.clone())
                .nuke(cutoff)
                .await
        }
    }
}

/// List what `run_nuke` would delete, without deleting anything
pub async fn run_inspect(
    ctx: &AwsContext,
    kind: ResourceKind,
    cutoff: AgeCutoff,
    settings: NukeSettings,
    cancel: &CancellationToken,
) -> Result<Inventory, NukeError> {
    let resources = match kind {
        ResourceKind::LoadBalancerV2 => {
            NukeOrchestrator::new(LoadBalancerAdapter::new(ctx), settings)
                .with_cancellation(cancel.clone())
                .inspect(cutoff)
                .await?
        }
        ResourceKind::Ec2Instance => {
            NukeOrchestrator::new(InstanceAdapter::new(ctx), settings)
                .with_cancellation(cancel.clone())
                .inspect(cutoff)
                .await?
        }
    };

    Ok(Inventory {
        resource_kind: kind,
        region: ctx.region().to_string(),
        resources,
    })
}

async fn load_contexts(request: &SweepRequest) -> Vec<AwsContext> {
    let mut contexts = Vec::with_capacity(request.regions.len());
    for region in &request.regions {
        contexts.push(AwsContext::with_profile(region, request.aws_profile.as_deref()).await);
    }
    contexts
}

/// Nuke every requested kind in every requested region
pub async fn sweep(
    request: &SweepRequest,
    settings: NukeSettings,
    cancel: &CancellationToken,
) -> SweepReport<NukeReport> {
    let contexts = load_contexts(request).await;
    sweep_with(contexts, &request.kinds, cancel, move |ctx, kind| async move {
        run_nuke(&ctx, kind, request.cutoff, settings, cancel).await
    })
    .await
}

/// List eligible resources for every requested kind in every requested region
pub async fn inspect(
    request: &SweepRequest,
    settings: NukeSettings,
    cancel: &CancellationToken,
) -> SweepReport<Inventory> {
    let contexts = load_contexts(request).await;
    sweep_with(contexts, &request.kinds, cancel, move |ctx, kind| async move {
        run_inspect(&ctx, kind, request.cutoff, settings, cancel).await
    })
    .await
}

/// Run `run` for every (target, kind) pair in order.
///
/// Kinds run in the order given within each target. A cancelled pair ends
/// the sweep; any other error is recorded and the next pair runs.
pub async fn sweep_with<C, T, F, Fut>(
    targets: Vec<C>,
    kinds: &[ResourceKind],
    cancel: &CancellationToken,
    mut run: F,
) -> SweepReport<T>
where
    C: Clone,
    F: FnMut(C, ResourceKind) -> Fut,
    Fut: Future<Output = Result<T, NukeError>>,
{
    let mut report = SweepReport::default();

    'targets: for target in targets {
        for &kind in kinds {
            match run(target.clone(), kind).await {
                Ok(result) => report.reports.push(result),
                Err(err @ NukeError::Cancelled { .. }) => {
                    warn!(kind = %err.kind(), region = err.region(), "Sweep cancelled");
                    report.list_failures.push(ListFailure::from(&err));
                    report.cancelled = true;
                    break 'targets;
                }
                Err(err) => {
                    warn!(
                        kind = %err.kind(),
                        region = err.region(),
                        error = ?err,
                        "Listing failed, continuing with next resource type"
                    );
                    report.list_failures.push(ListFailure::from(&err));
                }
            }
        }
    }

    if cancel.is_cancelled() {
        report.cancelled = true;
    }

    info!(
        completed = report.reports.len(),
        list_failures = report.list_failures.len(),
        cancelled = report.cancelled,
        "Sweep finished"
    );
    report
}
