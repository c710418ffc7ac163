//! Joins a raw prediction payload with the reference catalog.

use std::sync::Arc;

use chrono::NaiveDate;
use freshvision_catalog::{ReferenceCatalog, ReferenceRecord};
use freshvision_core::{MatchStrategy, ResponseMapping};
use freshvision_prediction_contract::{
    FieldValue, PredictionPayload, ProductStatus, normalize_label_date, resolve_status,
};

/// One mapped payload value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultField {
    /// Dotted response path.
    pub path: String,
    /// Verbatim value or the not-available marker.
    pub value: FieldValue,
}

/// Label-extraction date with its normalized reading.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDate {
    /// Dotted response path.
    pub path: String,
    /// Verbatim value or the not-available marker.
    pub value: FieldValue,
    /// Calendar date, when the value is a recognizable date.
    pub normalized: Option<NaiveDate>,
}

/// Display-ready result of one successful workflow cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// Freshness label as reported.
    pub freshness: ResultField,
    /// Shelf-life figures as reported, in variant order.
    pub shelf_life: Vec<ResultField>,
    /// Label-extraction dates, in variant order.
    pub label_dates: Vec<LabelDate>,
    /// Matched catalog record, or the placeholder.
    pub reference: ReferenceRecord,
    /// `false` when `reference` is the placeholder.
    pub reference_matched: bool,
    /// Fresh/wasted verdict, when a label is available.
    pub status: Option<ProductStatus>,
}

impl WorkflowResult {
    /// Every payload-derived field in display order.
    pub fn fields(&self) -> Vec<(&str, &FieldValue)> {
        std::iter::once((self.freshness.path.as_str(), &self.freshness.value))
            .chain(
                self.shelf_life
                    .iter()
                    .map(|field| (field.path.as_str(), &field.value)),
            )
            .chain(
                self.label_dates
                    .iter()
                    .map(|date| (date.path.as_str(), &date.value)),
            )
            .collect()
    }

    /// Looks up a payload-derived field by its response path.
    pub fn field(&self, path: &str) -> Option<&FieldValue> {
        self.fields()
            .into_iter()
            .find(|(candidate, _)| *candidate == path)
            .map(|(_, value)| value)
    }
}

/// Maps payloads into [`WorkflowResult`] values for one variant.
#[derive(Debug, Clone)]
pub struct ResultCorrelator {
    catalog: Arc<ReferenceCatalog>,
    strategy: MatchStrategy,
    mapping: ResponseMapping,
}

impl ResultCorrelator {
    /// Creates a correlator over a shared catalog.
    pub fn new(
        catalog: Arc<ReferenceCatalog>,
        strategy: MatchStrategy,
        mapping: ResponseMapping,
    ) -> Self {
        Self {
            catalog,
            strategy,
            mapping,
        }
    }

    /// Active matching heuristic.
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Builds the display result. Values are copied, never recomputed.
    pub fn correlate(&self, payload: &PredictionPayload) -> WorkflowResult {
        let freshness = ResultField {
            path: self.mapping.label.clone(),
            value: payload.field(&self.mapping.label),
        };
        let label = freshness.value.as_str();

        let matched = label.and_then(|label| self.catalog.lookup(label, self.strategy));
        let reference_matched = matched.is_some();
        let reference = matched.cloned().unwrap_or_else(ReferenceRecord::unknown);
        let status = resolve_status(payload, label);

        let shelf_life = self
            .mapping
            .shelf_life
            .iter()
            .map(|path| ResultField {
                path: path.clone(),
                value: payload.field(path),
            })
            .collect();

        let label_dates = self
            .mapping
            .label_dates
            .iter()
            .map(|path| {
                let value = payload.field(path);
                let normalized = value.as_str().and_then(normalize_label_date);
                LabelDate {
                    path: path.clone(),
                    value,
                    normalized,
                }
            })
            .collect();

        tracing::debug!(
            stage = "correlate",
            action = "catalog_join",
            strategy = %self.strategy,
            matched = reference_matched,
            "prediction correlated"
        );

        WorkflowResult {
            freshness,
            shelf_life,
            label_dates,
            reference,
            reference_matched,
            status,
        }
    }
}
