//! Layered runtime configuration.
//!
//! Priority, highest first: command-line flags, `FRESHVISION_*` environment
//! variables (both bound by the binary's argument parser), the TOML file
//! named by `--config`, compiled defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use freshvision_core::{MatchStrategy, VariantId};
use freshvision_submit::validate_endpoint;
use serde::{Deserialize, Deserializer, Serialize};

use crate::AppError;

/// Default prediction service endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/";
/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "freshvision=info";

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Prediction service URL.
    pub endpoint: String,
    /// Active wire variant.
    #[serde(deserialize_with = "variant_from_str")]
    pub variant: VariantId,
    /// Catalog matching override; `None` keeps the variant default.
    pub match_strategy: Option<MatchStrategy>,
    /// Reference catalog document; `None` means every lookup misses.
    pub catalog: Option<PathBuf>,
    /// Opt-in request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Fallback `tracing` filter directive.
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            variant: VariantId::A,
            match_strategy: None,
            catalog: None,
            timeout_secs: None,
            log: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Endpoint override.
    pub endpoint: Option<String>,
    /// Variant override.
    pub variant: Option<VariantId>,
    /// Match strategy override.
    pub match_strategy: Option<MatchStrategy>,
    /// Catalog path override.
    pub catalog: Option<PathBuf>,
    /// Timeout override, in seconds.
    pub timeout_secs: Option<u64>,
    /// Log filter override.
    pub log: Option<String>,
}

impl AppConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for malformed TOML or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|error| AppError::Config(format!("invalid TOML: {error}")))
    }

    /// Reads a TOML config file.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            AppError::Config(format!("failed to read {}: {error}", path.display()))
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!(
            stage = "config",
            action = "load",
            path = %path.display(),
            "configuration file loaded"
        );
        Ok(config)
    }

    /// Builds the effective configuration from an optional file and overrides.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the file is unusable or the merged
    /// result fails [`AppConfig::validate`].
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, AppError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let merged = base.merge(overrides);
        merged.validate()?;
        Ok(merged)
    }

    /// Applies overrides on top of `self`.
    pub fn merge(self, overrides: ConfigOverrides) -> Self {
        Self {
            endpoint: overrides.endpoint.unwrap_or(self.endpoint),
            variant: overrides.variant.unwrap_or(self.variant),
            match_strategy: overrides.match_strategy.or(self.match_strategy),
            catalog: overrides.catalog.or(self.catalog),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            log: overrides.log.unwrap_or(self.log),
        }
    }

    /// Checks endpoint scheme and timeout bounds.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_endpoint(&self.endpoint).map_err(|error| AppError::Config(error.to_string()))?;
        if self.timeout_secs == Some(0) {
            return Err(AppError::Config(
                "timeout_secs must be positive; omit it to disable the timeout".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout, when one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn variant_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<VariantId, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
