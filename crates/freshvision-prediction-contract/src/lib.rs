#![warn(missing_docs)]
//! # freshvision-prediction-contract
//!
//! ## Purpose
//! Defines the prediction service response contract and client-side readers.
//!
//! ## Responsibilities
//! - Decode success bodies into an open [`PredictionPayload`] mapping.
//! - Decode `{ "error": string }` bodies of rejected requests.
//! - Read scalar values by dotted path, surfacing absence explicitly.
//! - Derive the product status and normalize label-extraction dates.
//!
//! ## Data flow
//! Raw response bytes -> [`parse_prediction_payload`] or
//! [`parse_error_message`] -> [`PredictionPayload::field`] reads consumed by
//! result correlation.
//!
//! ## Ownership and lifetimes
//! Payloads own their decoded values so they outlive transient network
//! buffers.
//!
//! ## Error model
//! Non-JSON or non-object success bodies return [`ContractError`]. Error
//! bodies never fail: an unreadable error body yields `None` and the caller
//! substitutes its generic message.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key carrying the human-readable message of a rejected request.
pub const ERROR_KEY: &str = "error";
/// Key carrying the service-computed product status.
pub const STATUS_KEY: &str = "status";

/// Decoded success body of the prediction service.
///
/// No schema is enforced beyond being a JSON object; each variant reads its
/// own keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionPayload {
    values: Map<String, Value>,
}

impl PredictionPayload {
    /// Wraps an already decoded object.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Returns the raw value at a dotted path such as `ocr_data.expiry_date`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Reads a field, mapping absence and `null` to [`FieldValue::NotAvailable`].
    pub fn field(&self, path: &str) -> FieldValue {
        match self.get_path(path) {
            None | Some(Value::Null) => FieldValue::NotAvailable,
            Some(value) => FieldValue::Available(value.clone()),
        }
    }

    /// Reads a field as text, when it is a JSON string.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// Top-level keys and values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Value read from the payload, or the explicit not-available marker.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Value present in the payload, kept verbatim.
    Available(Value),
    /// Key absent or `null`.
    NotAvailable,
}

impl FieldValue {
    /// Returns `true` for present values.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the raw value, when present.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Available(value) => Some(value),
            Self::NotAvailable => None,
        }
    }

    /// Returns the value as text, when it is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(Value::String(text)) => f.write_str(text),
            Self::Available(value) => write!(f, "{value}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// Freshness verdict shown next to the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    /// Product is still good.
    Fresh,
    /// Product should be discarded.
    Wasted,
}

impl ProductStatus {
    /// Derives the status from a freshness label.
    ///
    /// Any label mentioning "rotten" (case-insensitive) is wasted. The
    /// service's own rule is case-sensitive; this one also catches `rotten`.
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("rotten") {
            Self::Wasted
        } else {
            Self::Fresh
        }
    }

    /// Parses the service-provided status text.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fresh" => Some(Self::Fresh),
            "wasted" => Some(Self::Wasted),
            _ => None,
        }
    }

    /// Display color for the status badge.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Fresh => "green",
            Self::Wasted => "red",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => f.write_str("Fresh"),
            Self::Wasted => f.write_str("Wasted"),
        }
    }
}

/// Resolves the product status: service value first, label heuristic second.
pub fn resolve_status(payload: &PredictionPayload, label: Option<&str>) -> Option<ProductStatus> {
    payload
        .text(STATUS_KEY)
        .and_then(ProductStatus::parse)
        .or_else(|| label.map(ProductStatus::from_label))
}

/// Decodes a success body.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON and
/// [`ContractError::NotAnObject`] when the top-level value is not an object.
pub fn parse_prediction_payload(raw: &[u8]) -> Result<PredictionPayload, ContractError> {
    match serde_json::from_slice::<Value>(raw)? {
        Value::Object(values) => Ok(PredictionPayload::from_map(values)),
        other => Err(ContractError::NotAnObject(json_type_name(&other))),
    }
}

/// Extracts the message of a `{ "error": string }` body.
///
/// Returns `None` when the body is not JSON, the key is missing, the value is
/// not a string, or the message is blank.
pub fn parse_error_message(raw: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<Value>,
    }

    let body: ErrorBody = serde_json::from_slice(raw).ok()?;
    match body.error? {
        Value::String(message) if !message.trim().is_empty() => Some(message),
        _ => None,
    }
}

/// Normalizes a label-extraction date.
///
/// Accepted shapes:
/// - ISO dates: `2025-01-01`
/// - HTTP dates: `Wed, 01 Jan 2025 00:00:00 GMT`
/// - compact OCR tokens: `20MAY2015`, with `O` read as `0` in the day
pub fn normalize_label_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(moment) = NaiveDateTime::parse_from_str(trimmed, "%a, %d %b %Y %H:%M:%S GMT") {
        return Some(moment.date());
    }

    parse_compact_ocr_date(trimmed)
}

fn parse_compact_ocr_date(token: &str) -> Option<NaiveDate> {
    // Shape: two day characters, a month name, four year digits.
    if !token.is_ascii() || token.len() < 7 {
        return None;
    }

    let day = token[..2].replace('O', "0");
    let month = &token[2..token.len() - 4];
    let year = &token[token.len() - 4..];
    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %b %Y").ok()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Prediction contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("prediction decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Top-level JSON value is not an object.
    #[error("prediction body must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
