//! cloud-sweep - age-based bulk deletion of AWS resources
//!
//! This crate wires the provider-agnostic orchestrator from
//! `cloud-sweep-common` to AWS: one adapter per resource kind, a shared SDK
//! context, configuration, and a driver that sweeps many regions and kinds.

pub mod aws;
pub mod config;
pub mod error;
pub mod output;
pub mod sweep;

pub use config::SweepConfig;
pub use error::ConfigError;
pub use sweep::{Inventory, ListFailure, SweepReport, SweepRequest, run_inspect, run_nuke, sweep};
