#![warn(missing_docs)]
//! # freshvision-app
//!
//! ## Purpose
//! Wires configuration, media loading, the catalog, the HTTP transport, and
//! the workflow state machine into one runnable product-analysis cycle.
//!
//! ## Responsibilities
//! - Resolve layered configuration ([`AppConfig`]).
//! - Initialize `tracing` output once per process.
//! - Build a [`FreshnessWorkflow`] for the configured variant.
//! - Render the current outcome as plain text.
//!
//! ## Data flow
//! Config -> catalog + transport + preview store -> [`FreshnessWorkflow`] ->
//! media/field edits -> submit -> [`render_outcome`].
//!
//! ## Ownership and lifetimes
//! The facade owns its state machine. Transport and media source are shared
//! behind `Arc` so tests can inject scripted stand-ins.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. A settled `Error` state is
//! not an `AppError`: it is part of the rendered outcome.

mod config;

use std::fmt::Write as _;
use std::sync::Arc;

use freshvision_capture::{
    CaptureError, FsMediaSource, InMemoryPreviewStore, MediaSource, PreviewStore,
};
use freshvision_catalog::{CatalogError, ReferenceCatalog};
use freshvision_core::VariantConfig;
use freshvision_submit::{HttpTransport, SubmissionClient, SubmissionTransport, SubmitError};
use freshvision_workflow::{
    InputError, Outcome, ResultCorrelator, SubmitRejected, WorkflowResult, WorkflowState,
    WorkflowStateMachine,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use config::{AppConfig, ConfigOverrides, DEFAULT_ENDPOINT, DEFAULT_LOG_FILTER};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FRESHVISION_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_filter`. Repeated calls are
/// no-ops.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
    if installed.is_err() {
        tracing::debug!(
            stage = "app",
            action = "init_logging",
            "subscriber already installed"
        );
    }
}

/// Splits a `name=value` command-line assignment.
///
/// # Errors
/// Returns [`AppError::Config`] when `=` is missing or the name is blank.
pub fn parse_assignment(raw: &str) -> Result<(String, String), AppError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::Config(format!("expected NAME=VALUE, got '{raw}'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Config(format!("missing name in '{raw}'")));
    }
    Ok((name.to_string(), value.to_string()))
}

/// One configured product-analysis workflow.
pub struct FreshnessWorkflow {
    client: SubmissionClient,
    media: Arc<dyn MediaSource>,
    machine: WorkflowStateMachine,
}

impl FreshnessWorkflow {
    /// Builds a workflow that talks HTTP and reads media from disk.
    ///
    /// # Errors
    /// Returns [`AppError`] when the catalog cannot be loaded or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let transport = Arc::new(HttpTransport::new(config.timeout())?);
        Self::with_parts(config, transport, Arc::new(FsMediaSource))
    }

    /// Builds a workflow over caller-provided transport and media source.
    ///
    /// # Errors
    /// Returns [`AppError`] for invalid endpoints and unreadable catalogs.
    pub fn with_parts(
        config: &AppConfig,
        transport: Arc<dyn SubmissionTransport>,
        media: Arc<dyn MediaSource>,
    ) -> Result<Self, AppError> {
        let catalog = match &config.catalog {
            Some(path) => ReferenceCatalog::load(path)?,
            None => {
                tracing::warn!(
                    stage = "app",
                    action = "catalog",
                    "no catalog configured; results will use the placeholder record"
                );
                ReferenceCatalog::default()
            }
        };
        Self::with_catalog(config, catalog, transport, media)
    }

    /// Builds a workflow over an already loaded catalog.
    ///
    /// # Errors
    /// Returns [`AppError::Submit`] for invalid endpoints.
    pub fn with_catalog(
        config: &AppConfig,
        catalog: ReferenceCatalog,
        transport: Arc<dyn SubmissionTransport>,
        media: Arc<dyn MediaSource>,
    ) -> Result<Self, AppError> {
        let mut variant = VariantConfig::builtin(config.variant);
        if let Some(strategy) = config.match_strategy {
            variant = variant.with_match_strategy(strategy);
        }

        let client = SubmissionClient::new(&config.endpoint, transport)?;
        let correlator = ResultCorrelator::new(
            Arc::new(catalog),
            variant.match_strategy(),
            variant.response().clone(),
        );
        let previews: Arc<dyn PreviewStore> = Arc::new(InMemoryPreviewStore::new());

        tracing::info!(
            stage = "app",
            action = "workflow_ready",
            variant = %variant.name(),
            endpoint = %client.endpoint(),
            strategy = %variant.match_strategy(),
            "workflow configured"
        );

        Ok(Self {
            client,
            media,
            machine: WorkflowStateMachine::new(&variant, correlator, previews),
        })
    }

    /// Opens `locator` and places it into `slot`.
    ///
    /// # Errors
    /// Returns [`AppError::Capture`] for unreadable media and
    /// [`AppError::Input`] for unknown slots.
    pub fn select_media(&mut self, slot: &str, locator: &str) -> Result<(), AppError> {
        let file = self.media.open(locator)?;
        self.machine.select_file(slot, file)?;
        Ok(())
    }

    /// Sets an auxiliary field value.
    ///
    /// # Errors
    /// Returns [`AppError::Input`] for unknown fields.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        self.machine.set_field(name, value)?;
        Ok(())
    }

    /// Runs one submission cycle to completion.
    ///
    /// # Errors
    /// Returns [`AppError::Rejected`] when the submit action is not accepted.
    pub fn submit(&mut self) -> Result<WorkflowState, AppError> {
        Ok(self.machine.run_submission(&self.client)?)
    }

    /// Underlying state machine.
    pub fn machine(&self) -> &WorkflowStateMachine {
        &self.machine
    }

    /// Text rendering of the current outcome.
    pub fn render(&self) -> String {
        render_outcome(self.machine.outcome())
    }
}

/// Renders an outcome as `key: value` lines.
pub fn render_outcome(outcome: Outcome<'_>) -> String {
    match outcome {
        Outcome::None => "no result".to_string(),
        Outcome::Error(error) => format!("error: {}", error.message),
        Outcome::Result(result) => render_result(result),
    }
}

fn render_result(result: &WorkflowResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {}", result.freshness.path, result.freshness.value);
    if let Some(status) = result.status {
        let _ = writeln!(out, "status: {status} ({})", status.color());
    }
    for field in &result.shelf_life {
        let _ = writeln!(out, "{}: {}", field.path, field.value);
    }
    for date in &result.label_dates {
        match date.normalized {
            Some(normalized) if date.value.as_str() != Some(normalized.to_string().as_str()) => {
                let _ = writeln!(out, "{}: {} ({normalized})", date.path, date.value);
            }
            _ => {
                let _ = writeln!(out, "{}: {}", date.path, date.value);
            }
        }
    }
    let _ = writeln!(out, "product: {}", result.reference.name);
    let _ = writeln!(
        out,
        "shelf_life_days: {}",
        result.reference.shelf_life_days
    );
    let _ = write!(out, "description: {}", result.reference.description);
    out
}

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Catalog loading failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Media loading failure.
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// Submission client construction failure.
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// Edit targeted an unknown slot or field.
    #[error(transparent)]
    Input(#[from] InputError),
    /// Submit action not accepted.
    #[error(transparent)]
    Rejected(#[from] SubmitRejected),
}
