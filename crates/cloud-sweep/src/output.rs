//! Human-readable rendering of sweep results

use crate::sweep::{Inventory, ListFailure, SweepReport};
use clap::ValueEnum;
use cloud_sweep_common::{NukeReport, ResourceKind};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}

/// One row per eligible resource
pub fn inventory_table(report: &SweepReport<Inventory>) -> Table {
    let mut table = new_table(&["Type", "Region", "ID", "Created"]);
    for inventory in &report.reports {
        for resource in &inventory.resources {
            table.add_row(vec![
                Cell::new(inventory.resource_kind.as_str()),
                Cell::new(&inventory.region),
                Cell::new(resource.identifier.as_str()),
                Cell::new(
                    resource
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                ),
            ]);
        }
    }
    table
}

/// One row per (kind, region) run with its state counts
pub fn summary_table(report: &SweepReport<NukeReport>) -> Table {
    let mut table = new_table(&[
        "Type",
        "Region",
        "Confirmed",
        "Submit failed",
        "Wait failed",
        "Timed out",
        "Unconfirmed",
        "Result",
    ]);
    for run in &report.reports {
        let counts = run.counts();
        table.add_row(vec![
            Cell::new(run.resource_kind.as_str()),
            Cell::new(&run.region),
            Cell::new(counts.confirmed),
            Cell::new(counts.submit_failed),
            Cell::new(counts.wait_failed),
            Cell::new(counts.wait_timed_out),
            Cell::new(counts.submitted),
            Cell::new(run.summary().to_string()),
        ]);
    }
    table
}

/// Every resource that was not confirmed deleted, with its cause
pub fn failures_table(report: &SweepReport<NukeReport>) -> Table {
    let mut table = new_table(&["Type", "Region", "ID", "State", "Cause"]);
    for run in &report.reports {
        for failure in run.failures() {
            table.add_row(vec![
                Cell::new(run.resource_kind.as_str()),
                Cell::new(&run.region),
                Cell::new(failure.identifier.as_str()),
                Cell::new(failure.state.to_string()),
                Cell::new(failure.cause),
            ]);
        }
    }
    table
}

pub fn list_failures_table(failures: &[ListFailure]) -> Table {
    let mut table = new_table(&["Type", "Region", "Error"]);
    for failure in failures {
        table.add_row(vec![
            Cell::new(failure.resource_kind.as_str()),
            Cell::new(&failure.region),
            Cell::new(&failure.error),
        ]);
    }
    table
}

pub fn kinds_table() -> Table {
    let mut table = new_table(&["Name", "Description", "Sweep order"]);
    for kind in ResourceKind::all() {
        table.add_row(vec![
            Cell::new(kind.as_str()),
            Cell::new(kind.description()),
            Cell::new(kind.sweep_priority()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cloud_sweep_common::{DeletionOutcome, DeletionState, ResourceDescriptor};

    #[test]
    fn test_inventory_table_lists_resources() {
        let report = SweepReport {
            reports: vec![Inventory {
                resource_kind: ResourceKind::Ec2Instance,
                region: "us-west-2".to_string(),
                resources: vec![
                    ResourceDescriptor::new("i-0abc", Utc::now()),
                    ResourceDescriptor::undated("i-0def"),
                ],
            }],
            ..Default::default()
        };

        let rendered = inventory_table(&report).to_string();
        assert!(rendered.contains("i-0abc"));
        assert!(rendered.contains("i-0def"));
        assert!(rendered.contains("unknown"));
        assert!(rendered.contains("us-west-2"));
    }

    #[test]
    fn test_failures_table_shows_causes() {
        let run = NukeReport::new(
            ResourceKind::LoadBalancerV2,
            "us-east-1",
            None,
            Utc::now(),
            vec![
                DeletionOutcome {
                    identifier: "arn:lb/ok".into(),
                    state: DeletionState::Confirmed,
                    error: None,
                },
                DeletionOutcome {
                    identifier: "arn:lb/protected".into(),
                    state: DeletionState::SubmitFailed,
                    error: Some("deletion protection".to_string()),
                },
            ],
        );
        let report = SweepReport {
            reports: vec![run],
            ..Default::default()
        };

        let failures = failures_table(&report).to_string();
        assert!(failures.contains("arn:lb/protected"));
        assert!(failures.contains("deletion protection"));
        assert!(!failures.contains("arn:lb/ok"));

        let summary = summary_table(&report).to_string();
        assert!(summary.contains("partially failed (1 of 2)"));
    }

    #[test]
    fn test_kinds_table() {
        let rendered = kinds_table().to_string();
        assert!(rendered.contains("elbv2"));
        assert!(rendered.contains("ec2"));
    }
}
