//! cloud-sweep: delete AWS resources older than a cutoff
//!
//! `inspect` lists what would be deleted; `nuke --execute` deletes it and
//! waits until AWS confirms each deletion.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cloud_sweep::aws::{AwsContext, validate_account};
use cloud_sweep::output::{self, OutputFormat};
use cloud_sweep::{SweepConfig, SweepRequest, sweep};
use cloud_sweep_common::{AgeCutoff, MissingTimestampPolicy, ResourceKind};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cloud-sweep")]
#[command(about = "Delete AWS resources older than a cutoff")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Which resources a command applies to
#[derive(clap::Args, Debug)]
struct SelectionArgs {
    /// AWS region to sweep (repeatable; default from config or us-east-1)
    #[arg(long = "region", value_name = "REGION")]
    regions: Vec<String>,

    /// Resource type to sweep (repeatable; default all, see list-kinds)
    #[arg(long = "resource-type", value_name = "KIND")]
    resource_types: Vec<ResourceKind>,

    /// Only resources created more than N hours ago are eligible
    #[arg(long, conflicts_with = "cutoff")]
    older_than_hours: Option<u64>,

    /// Only resources created before this RFC 3339 timestamp are eligible
    #[arg(long)]
    cutoff: Option<DateTime<Utc>>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

/// Arguments for the nuke command
#[derive(clap::Args, Debug)]
struct NukeArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Actually delete resources (default is dry-run)
    #[arg(long)]
    execute: bool,

    /// Maximum in-flight AWS calls per phase
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Seconds to wait for deletions to be confirmed
    #[arg(long)]
    wait_timeout_secs: Option<u64>,

    /// Treat resources without a creation time as eligible
    #[arg(long)]
    include_missing_timestamps: bool,

    /// Refuse to run unless the credentials belong to this account
    #[arg(long)]
    account_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List resources that would be deleted
    Inspect(SelectionArgs),

    /// Delete resources older than the cutoff
    Nuke(Box<NukeArgs>),

    /// List supported resource types
    ListKinds,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print the error and its causes to stderr
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");
    for cause in e.chain().skip(1) {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
    }

    let backtrace = e.backtrace();
    if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
        let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
    }
}

fn init_tracing() -> Result<()> {
    // AWS SDK crates are noisy at info
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into())
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?)
        .add_directive("aws_sdk_ec2=warn".parse()?)
        .add_directive("aws_sdk_elasticloadbalancingv2=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Cancel `token` on Ctrl-C
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight requests (press Ctrl-C again to abort)");
            token.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
}

/// Returns `Ok(false)` when the command ran but some resources failed
async fn run() -> Result<bool> {
    let args = Args::parse();
    init_tracing()?;

    match args.command {
        Command::ListKinds => {
            println!("{}", output::kinds_table());
            Ok(true)
        }
        Command::Inspect(selection) => {
            let config = resolve_config(&selection, None)?;
            handle_inspect(&selection, &config).await
        }
        Command::Nuke(nuke) => {
            let config = resolve_config(&nuke.selection, Some(nuke.as_ref()))?;
            if nuke.execute {
                handle_nuke(&nuke.selection, &config).await
            } else {
                let ok = handle_inspect(&nuke.selection, &config).await?;
                println!("\nDry run: nothing was deleted. Run with --execute to delete these resources.");
                Ok(ok)
            }
        }
    }
}

/// Merge the config file (if any) with CLI flags; flags win
fn resolve_config(selection: &SelectionArgs, nuke: Option<&NukeArgs>) -> Result<SweepConfig> {
    let mut config = match &selection.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SweepConfig::default(),
    };

    if !selection.regions.is_empty() {
        config.regions = selection.regions.clone();
    }
    if !selection.resource_types.is_empty() {
        config.resource_types = selection.resource_types.clone();
    }
    if let Some(hours) = selection.older_than_hours {
        config.older_than_hours = hours;
    }
    if selection.aws_profile.is_some() {
        config.aws_profile = selection.aws_profile.clone();
    }

    if let Some(nuke) = nuke {
        if let Some(max_concurrency) = nuke.max_concurrency {
            config.max_concurrency = max_concurrency;
        }
        if let Some(wait_timeout_secs) = nuke.wait_timeout_secs {
            config.wait_timeout_secs = wait_timeout_secs;
        }
        if nuke.include_missing_timestamps {
            config.missing_timestamp = MissingTimestampPolicy::Include;
        }
        if nuke.account_id.is_some() {
            config.account_id = nuke.account_id.clone();
        }
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn sweep_request(selection: &SelectionArgs, config: &SweepConfig) -> SweepRequest {
    let cutoff = match selection.cutoff {
        Some(at) => AgeCutoff::at(at),
        None => config.cutoff(Utc::now()),
    };
    SweepRequest {
        regions: config.regions(),
        kinds: config.kinds(),
        cutoff,
        aws_profile: config.aws_profile.clone(),
    }
}

/// Handle inspect (and nuke without --execute)
async fn handle_inspect(selection: &SelectionArgs, config: &SweepConfig) -> Result<bool> {
    let request = sweep_request(selection, config);
    info!(
        regions = ?request.regions,
        kinds = ?request.kinds,
        cutoff = %request.cutoff.instant(),
        "Inspecting resources"
    );

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let report = sweep::inspect(&request, config.settings(), &cancel).await;

    match selection.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            if report.total_resources() == 0 {
                println!("No resources older than {} found.", request.cutoff.instant());
            } else {
                println!("{}", output::inventory_table(&report));
                println!("\nTotal: {} resources", report.total_resources());
            }
            if !report.list_failures.is_empty() {
                println!("\nListing failed for:");
                println!("{}", output::list_failures_table(&report.list_failures));
            }
        }
    }

    Ok(!report.has_failures())
}

/// Handle nuke --execute
async fn handle_nuke(selection: &SelectionArgs, config: &SweepConfig) -> Result<bool> {
    let request = sweep_request(selection, config);

    let first_region = request
        .regions
        .first()
        .context("At least one region is required")?;
    let ctx = AwsContext::with_profile(first_region, request.aws_profile.as_deref()).await;
    let account_id = validate_account(&ctx, config.account_id.as_deref()).await?;

    info!(
        account_id = %account_id,
        regions = ?request.regions,
        kinds = ?request.kinds,
        cutoff = %request.cutoff.instant(),
        "Nuking resources"
    );

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let report = sweep(&request, config.settings(), &cancel).await;

    match selection.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            println!("\n=== Nuke Report ===");
            println!("Account: {account_id}");
            println!("Cutoff:  {}", request.cutoff.instant());
            println!("{}", output::summary_table(&report));

            if report.reports.iter().any(|r| r.has_failures()) {
                println!("\nNot deleted:");
                println!("{}", output::failures_table(&report));
            }
            if !report.list_failures.is_empty() {
                println!("\nListing failed for:");
                println!("{}", output::list_failures_table(&report.list_failures));
            }
            if report.cancelled {
                println!("\nSweep was cancelled before it completed.");
            }
        }
    }

    Ok(!report.has_failures())
}
