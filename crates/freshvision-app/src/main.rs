#![warn(missing_docs)]
//! # freshvision binary
//!
//! Runs one product-analysis cycle from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use freshvision_app::{
    AppConfig, AppError, ConfigOverrides, FreshnessWorkflow, app_version, init_logging,
    parse_assignment,
};
use freshvision_core::{MatchStrategy, VariantId};
use freshvision_workflow::WorkflowState;

/// Command-line arguments for `freshvision`.
#[derive(Parser, Debug)]
#[command(name = "freshvision")]
#[command(about = "Submit product images for freshness prediction")]
#[command(version = app_version())]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "FRESHVISION_CONFIG")]
    config: Option<PathBuf>,

    /// Prediction service URL
    #[arg(long, env = "FRESHVISION_ENDPOINT")]
    endpoint: Option<String>,

    /// Wire variant: a, b, c, or d
    #[arg(long, env = "FRESHVISION_VARIANT")]
    variant: Option<VariantId>,

    /// Catalog matching: substring or exact
    #[arg(long, env = "FRESHVISION_MATCH_STRATEGY")]
    match_strategy: Option<MatchStrategy>,

    /// Reference catalog JSON document
    #[arg(long, env = "FRESHVISION_CATALOG")]
    catalog: Option<PathBuf>,

    /// Request timeout in seconds; no timeout when omitted
    #[arg(long, env = "FRESHVISION_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "FRESHVISION_LOG")]
    log: Option<String>,

    /// Media selection as SLOT=PATH (repeatable)
    #[arg(long = "slot", value_name = "SLOT=PATH", value_parser = parse_assignment)]
    slots: Vec<(String, String)>,

    /// Field value as NAME=VALUE (repeatable)
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    fields: Vec<(String, String)>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let overrides = ConfigOverrides {
        endpoint: args.endpoint,
        variant: args.variant,
        match_strategy: args.match_strategy,
        catalog: args.catalog,
        timeout_secs: args.timeout_secs,
        log: args.log,
    };
    let config = AppConfig::resolve(args.config.as_deref(), overrides)
        .context("failed to resolve configuration")?;
    init_logging(&config.log);

    tracing::info!(
        stage = "app",
        action = "start",
        version = app_version(),
        variant = %config.variant,
        "freshvision starting"
    );

    let mut workflow =
        FreshnessWorkflow::from_config(&config).context("failed to initialize workflow")?;
    for (slot, path) in &args.slots {
        workflow
            .select_media(slot, path)
            .with_context(|| format!("failed to select media for '{slot}'"))?;
    }
    for (name, value) in &args.fields {
        workflow
            .set_field(name, value)
            .with_context(|| format!("failed to set field '{name}'"))?;
    }

    match workflow.submit() {
        Ok(_) => {}
        Err(AppError::Rejected(rejected)) => {
            eprintln!("submission not accepted: {rejected}");
            let rendered = workflow.render();
            if workflow.machine().state() == WorkflowState::Error {
                eprintln!("{rendered}");
            }
            return Ok(ExitCode::from(2));
        }
        Err(error) => return Err(error.into()),
    }

    println!("{}", workflow.render());
    if workflow.machine().state() == WorkflowState::Error {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
