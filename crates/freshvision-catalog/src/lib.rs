#![warn(missing_docs)]
//! # freshvision-catalog
//!
//! ## Purpose
//! Read-only lookup over the preloaded product reference dataset.
//!
//! ## Responsibilities
//! - Decode the static `{ "products": [...] }` catalog document.
//! - Match a freshness label to the first record under a named
//!   [`MatchStrategy`].
//! - Provide the placeholder record rendered when nothing matches.
//!
//! ## Data flow
//! Catalog JSON -> [`ReferenceCatalog::from_json_str`] -> shared behind `Arc`
//! -> [`ReferenceCatalog::lookup`] called once per successful prediction.
//!
//! ## Ownership and lifetimes
//! Records are immutable after load; lookups borrow from the catalog.
//!
//! ## Error model
//! Unreadable or malformed catalog documents fail with [`CatalogError`].
//! A missing match is not an error: `lookup` returns `None`.
//!
//! ## Example
//! ```rust
//! use freshvision_catalog::{ReferenceCatalog, ReferenceRecord, ShelfLifeDays};
//! use freshvision_core::MatchStrategy;
//!
//! let catalog = ReferenceCatalog::from_records(vec![ReferenceRecord::new(
//!     "Fresh Apple",
//!     ShelfLifeDays::Days(30),
//!     "Crisp apple.",
//! )]);
//! assert!(catalog.lookup("Fresh", MatchStrategy::Substring).is_some());
//! assert!(catalog.lookup("Fresh", MatchStrategy::Exact).is_none());
//! ```

use std::fmt;
use std::path::Path;

use freshvision_core::MatchStrategy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use thiserror::Error;

/// Name of the placeholder record.
pub const UNKNOWN_NAME: &str = "Unknown";
/// Description of the placeholder record.
pub const UNKNOWN_DESCRIPTION: &str = "No description available.";

/// Shelf-life figure of a reference record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShelfLifeDays {
    /// Known shelf life in whole days.
    Days(u32),
    /// Numeric figure that is not a whole day count (fractional or
    /// negative), kept verbatim.
    Figure(Number),
    /// No figure available; rendered as `N/A`.
    Unknown,
}

impl fmt::Display for ShelfLifeDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(days) => write!(f, "{days}"),
            Self::Figure(figure) => write!(f, "{figure}"),
            Self::Unknown => f.write_str("N/A"),
        }
    }
}

impl Serialize for ShelfLifeDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Days(days) => serializer.serialize_u32(*days),
            Self::Figure(figure) => figure.serialize(serializer),
            Self::Unknown => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for ShelfLifeDays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Invariant: one odd record never fails the whole document. Textual
        // values ("unknown", "N/A", "") carry no figure, except quoted
        // integers which older catalogs used.
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_u64()
                .and_then(|days| u32::try_from(days).ok())
                .map_or(Self::Figure(number), Self::Days),
            Value::String(text) => text
                .trim()
                .parse::<u32>()
                .map(Self::Days)
                .unwrap_or(Self::Unknown),
            _ => Self::Unknown,
        })
    }
}

/// One product entry of the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Product or category name.
    pub name: String,
    /// Typical shelf life.
    pub shelf_life_days: ShelfLifeDays,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ReferenceRecord {
    /// Creates a record.
    pub fn new(
        name: impl Into<String>,
        shelf_life_days: ShelfLifeDays,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            shelf_life_days,
            description: description.into(),
        }
    }

    /// Placeholder shown when no record matches.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_NAME, ShelfLifeDays::Unknown, UNKNOWN_DESCRIPTION)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    products: Vec<ReferenceRecord>,
}

/// Ordered, immutable set of reference records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCatalog {
    records: Vec<ReferenceRecord>,
}

impl ReferenceCatalog {
    /// Wraps records in dataset order.
    pub fn from_records(records: Vec<ReferenceRecord>) -> Self {
        Self { records }
    }

    /// Decodes a `{ "products": [...] }` document.
    ///
    /// # Errors
    /// Returns [`CatalogError::Decode`] for malformed JSON or records.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Ok(Self::from_records(document.products))
    }

    /// Reads and decodes a catalog document from disk.
    ///
    /// # Errors
    /// Returns [`CatalogError::Io`] when the file cannot be read, and
    /// [`CatalogError::Decode`] when it is malformed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        tracing::info!(
            stage = "catalog",
            action = "load",
            path = %path.display(),
            records = catalog.len(),
            "reference catalog loaded"
        );
        Ok(catalog)
    }

    /// Records in dataset order.
    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` for an empty catalog.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds the first record matching `label` under `strategy`.
    ///
    /// Comparison is case-insensitive. In substring mode an empty label
    /// matches the first record.
    pub fn lookup(&self, label: &str, strategy: MatchStrategy) -> Option<&ReferenceRecord> {
        let needle = label.to_lowercase();
        let found = self.records.iter().find(|record| {
            let name = record.name.to_lowercase();
            match strategy {
                MatchStrategy::Substring => name.contains(&needle),
                MatchStrategy::Exact => name == needle,
            }
        });

        if found.is_none() {
            tracing::debug!(
                stage = "catalog",
                action = "lookup_miss",
                label = %label,
                strategy = %strategy,
                "no reference record matched"
            );
        }
        found
    }

    /// Like [`ReferenceCatalog::lookup`], substituting the placeholder record.
    pub fn lookup_or_unknown(&self, label: &str, strategy: MatchStrategy) -> ReferenceRecord {
        self.lookup(label, strategy)
            .cloned()
            .unwrap_or_else(ReferenceRecord::unknown)
    }
}

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File read failure.
    #[error("failed to read catalog '{path}': {source}")]
    Io {
        /// Catalog path.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// JSON decode failure.
    #[error("catalog decode failure: {0}")]
    Decode(#[from] serde_json::Error),
}
