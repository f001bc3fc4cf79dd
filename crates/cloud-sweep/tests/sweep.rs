//! Multi-region sweep driver against the in-memory provider

use chrono::{Duration as ChronoDuration, Utc};
use cloud_sweep::sweep::sweep_with;
use cloud_sweep::{Inventory, SweepReport};
use cloud_sweep_common::{
    AgeCutoff, MissingTimestampPolicy, NukeError, NukeOrchestrator, NukeReport, NukeSettings,
    ProviderError, ResourceKind, RetryPolicy, WaitConfig,
};
use cloud_sweep_test_utils::FakeProvider;
use cloud_sweep_test_utils::fixtures::inventory;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn fast_settings() -> NukeSettings {
    NukeSettings {
        max_concurrency: 4,
        retry: RetryPolicy {
            max_attempts: 2,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        wait: WaitConfig {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            timeout: Duration::from_secs(2),
            check_timeout: Duration::from_millis(500),
        },
        missing_timestamp: MissingTimestampPolicy::Exclude,
    }
}

fn cutoff() -> AgeCutoff {
    AgeCutoff::older_than(ChronoDuration::hours(1), Utc::now())
}

/// Two stale and one fresh resource of `kind` in `region`
fn provider(kind: ResourceKind, region: &str) -> FakeProvider {
    let mut resources = inventory(&format!("{region}-{kind}-old"), 2, ChronoDuration::days(2));
    resources.extend(inventory(
        &format!("{region}-{kind}-new"),
        1,
        ChronoDuration::minutes(5),
    ));
    FakeProvider::new(kind, region).with_resources(resources)
}

fn regions(names: &[&str]) -> Vec<String> {
    names.iter().map(|r| r.to_string()).collect()
}

#[tokio::test]
async fn test_sweep_visits_every_pair_in_order() {
    let cancel = CancellationToken::new();
    let cutoff = cutoff();
    let mut visited = Vec::new();

    let report: SweepReport<NukeReport> = sweep_with(
        regions(&["us-east-1", "eu-west-1"]),
        &ResourceKind::all(),
        &cancel,
        |region: String, kind| {
            visited.push((region.clone(), kind));
            let orchestrator = NukeOrchestrator::new(provider(kind, &region), fast_settings())
                .with_cancellation(cancel.clone());
            async move { orchestrator.nuke(cutoff).await }
        },
    )
    .await;

    assert_eq!(
        visited,
        vec![
            ("us-east-1".to_string(), ResourceKind::LoadBalancerV2),
            ("us-east-1".to_string(), ResourceKind::Ec2Instance),
            ("eu-west-1".to_string(), ResourceKind::LoadBalancerV2),
            ("eu-west-1".to_string(), ResourceKind::Ec2Instance),
        ]
    );
    assert_eq!(report.reports.len(), 4);
    assert!(report.list_failures.is_empty());
    assert!(!report.cancelled);
    assert!(!report.has_failures());
    for run in &report.reports {
        assert_eq!(run.counts().confirmed, 2, "{} in {}", run.resource_kind, run.region);
    }
}

#[tokio::test]
async fn test_list_failure_does_not_stop_sweep() {
    let cancel = CancellationToken::new();
    let cutoff = cutoff();

    let report = sweep_with(
        regions(&["us-east-1", "us-west-2"]),
        &[ResourceKind::LoadBalancerV2],
        &cancel,
        |region: String, kind| {
            let mut fake = provider(kind, &region);
            if region == "us-east-1" {
                fake = fake.with_list_failure(ProviderError::AccessDenied(
                    "elasticloadbalancing:DescribeLoadBalancers".into(),
                ));
            }
            let orchestrator =
                NukeOrchestrator::new(fake, fast_settings()).with_cancellation(cancel.clone());
            async move { orchestrator.nuke(cutoff).await }
        },
    )
    .await;

    assert_eq!(report.reports.len(), 1);
    assert_eq!(report.reports[0].region, "us-west-2");
    assert_eq!(report.list_failures.len(), 1);

    let failure = &report.list_failures[0];
    assert_eq!(failure.region, "us-east-1");
    assert_eq!(failure.resource_kind, ResourceKind::LoadBalancerV2);
    assert!(
        failure.error.contains("DescribeLoadBalancers"),
        "cause chain missing from {:?}",
        failure.error
    );

    assert!(!report.cancelled);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_cancellation_ends_sweep() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let cutoff = cutoff();
    let mut calls = 0;

    let report = sweep_with(
        regions(&["us-east-1", "eu-west-1"]),
        &ResourceKind::all(),
        &cancel,
        |region: String, kind| {
            calls += 1;
            let orchestrator = NukeOrchestrator::new(provider(kind, &region), fast_settings())
                .with_cancellation(cancel.clone());
            async move { orchestrator.nuke(cutoff).await }
        },
    )
    .await;

    assert_eq!(calls, 1);
    assert!(report.cancelled);
    assert!(report.reports.is_empty());
    assert_eq!(report.list_failures.len(), 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_inspect_sweep_counts_resources() {
    let cancel = CancellationToken::new();
    let cutoff = cutoff();

    let report: SweepReport<Inventory> = sweep_with(
        regions(&["us-east-1", "eu-west-1"]),
        &[ResourceKind::Ec2Instance],
        &cancel,
        |region: String, kind| {
            let fake = provider(kind, &region);
            let orchestrator =
                NukeOrchestrator::new(fake, fast_settings()).with_cancellation(cancel.clone());
            async move {
                let resources = orchestrator.inspect(cutoff).await?;
                Ok::<_, NukeError>(Inventory {
                    resource_kind: kind,
                    region,
                    resources,
                })
            }
        },
    )
    .await;

    assert_eq!(report.reports.len(), 2);
    assert_eq!(report.total_resources(), 4);
    assert!(!report.has_failures());
    assert!(
        report
            .reports
            .iter()
            .flat_map(|i| &i.resources)
            .all(|r| r.identifier.as_str().contains("-old"))
    );
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let cancel = CancellationToken::new();
    let cutoff = cutoff();

    let report = sweep_with(
        regions(&["us-east-1"]),
        &[ResourceKind::LoadBalancerV2],
        &cancel,
        |region: String, kind| {
            let orchestrator = NukeOrchestrator::new(provider(kind, &region), fast_settings())
                .with_cancellation(cancel.clone());
            async move { orchestrator.nuke(cutoff).await }
        },
    )
    .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["cancelled"], false);
    assert_eq!(json["reports"][0]["resource_kind"], "elbv2");
    assert_eq!(json["reports"][0]["outcomes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_inspect_live_account() {
    use cloud_sweep::aws::AwsContext;
    use cloud_sweep_test_utils::aws::get_test_region;

    let region = get_test_region();
    let ctx = AwsContext::new(&region).await;
    let cancel = CancellationToken::new();

    // A cutoff in the far past never matches anything, so this is read-only
    let cutoff = AgeCutoff::at(Utc::now() - ChronoDuration::days(365 * 30));
    for kind in ResourceKind::all() {
        let inventory =
            cloud_sweep::run_inspect(&ctx, kind, cutoff, NukeSettings::default(), &cancel)
                .await
                .unwrap();
        assert!(inventory.resources.is_empty());
        assert_eq!(inventory.region, region);
    }
}
