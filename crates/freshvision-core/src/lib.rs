#![warn(missing_docs)]
//! # freshvision-core
//!
//! ## Purpose
//! Defines the pure input model shared across the `freshvision` workspace.
//!
//! ## Responsibilities
//! - Represent media slots, auxiliary fields, and the files they hold.
//! - Describe the four named workflow variants as data, not as forked logic.
//! - Gate submissions with the pure [`validate`] function.
//!
//! ## Data flow
//! A [`VariantConfig`] declares slots and fields -> the workflow instantiates
//! [`MediaSlot`] and [`AuxiliaryField`] values from it -> user edits mutate
//! them -> [`validate`] checks them on every submission attempt.
//!
//! ## Ownership and lifetimes
//! Slots own their [`MediaFile`] buffers (`Vec<u8>`), so a submission can take
//! an owned snapshot that later edits cannot touch.
//!
//! ## Error model
//! Malformed variant declarations return [`CoreError`]. Submission readiness
//! failures are [`ValidationError`] values, which are recoverable by editing.
//!
//! ## Example
//! ```rust
//! use freshvision_core::{VariantConfig, VariantId, validate};
//!
//! let variant = VariantConfig::builtin(VariantId::A);
//! let (slots, fields) = variant.instantiate();
//! let error = validate(&slots, &fields).unwrap_err();
//! assert_eq!(error.to_string(), "missing media: product_image");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One user-selected media file.
///
/// The bytes are opaque: no content validation happens on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// File name reported to the service in the multipart part.
    pub file_name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Creates a media file from owned bytes.
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Returns content length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for zero-length files.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Displayable locator for an allocated preview resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef {
    /// Allocation id, unique per preview store.
    pub id: u64,
    /// Locator the presentation layer can render.
    pub locator: String,
}

/// Named capture point holding at most one file and its preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlot {
    name: String,
    required: bool,
    file: Option<MediaFile>,
    preview: Option<PreviewRef>,
}

impl MediaSlot {
    /// Creates an empty slot.
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
            file: None,
            preview: None,
        }
    }

    /// Stable slot identifier, also the multipart part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the active variant requires this slot.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Currently selected file.
    pub fn file(&self) -> Option<&MediaFile> {
        self.file.as_ref()
    }

    /// Preview of the currently selected file.
    pub fn preview(&self) -> Option<&PreviewRef> {
        self.preview.as_ref()
    }

    /// Returns `true` when a file is present.
    pub fn is_populated(&self) -> bool {
        self.file.is_some()
    }

    /// Replaces file and preview together.
    ///
    /// # Returns
    /// The superseded preview, which the caller must release.
    pub fn replace(&mut self, file: MediaFile, preview: PreviewRef) -> Option<PreviewRef> {
        self.file = Some(file);
        self.preview.replace(preview)
    }

    /// Removes file and preview.
    ///
    /// # Returns
    /// The removed preview, which the caller must release.
    pub fn clear(&mut self) -> Option<PreviewRef> {
        self.file = None;
        self.preview.take()
    }
}

/// Validation rule attached to an auxiliary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldConstraint {
    /// Value must be present and parse as a finite number.
    RequiredNumeric,
    /// Free text, never rejected.
    #[serde(rename = "none")]
    Unconstrained,
}

/// Free-form text input sent alongside the media parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryField {
    name: String,
    raw_value: String,
    constraint: FieldConstraint,
}

impl AuxiliaryField {
    /// Creates a field with an empty value.
    pub fn new(name: impl Into<String>, constraint: FieldConstraint) -> Self {
        Self {
            name: name.into(),
            raw_value: String::new(),
            constraint,
        }
    }

    /// Field identifier, also the multipart part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value exactly as typed.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Attached validation rule.
    pub fn constraint(&self) -> FieldConstraint {
        self.constraint
    }

    /// Replaces the raw value. No validation happens here.
    pub fn set_raw_value(&mut self, raw_value: impl Into<String>) {
        self.raw_value = raw_value.into();
    }

    /// Returns `true` when the field blocks readiness while empty.
    pub fn is_required(&self) -> bool {
        self.constraint == FieldConstraint::RequiredNumeric
    }

    /// Returns `true` when the value is non-blank.
    pub fn is_populated(&self) -> bool {
        !self.raw_value.trim().is_empty()
    }
}

/// Catalog matching heuristic used to join a freshness label to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Record name contains the label, case-insensitively.
    Substring,
    /// Record name equals the label, case-insensitively.
    Exact,
}

impl FromStr for MatchStrategy {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            other => Err(CoreError::UnknownMatchStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => f.write_str("substring"),
            Self::Exact => f.write_str("exact"),
        }
    }
}

/// Names of the built-in variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantId {
    /// Single product image.
    A,
    /// Freshness image plus label image.
    B,
    /// Single generic `file` upload.
    C,
    /// Product and expiry images plus storage temperature.
    D,
}

impl FromStr for VariantId {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(CoreError::UnknownVariant(raw.to_string())),
        }
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(name)
    }
}

/// Declared media slot of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    /// Part name on the wire.
    pub name: String,
    /// Whether submission requires a file in this slot.
    pub required: bool,
}

/// Declared auxiliary field of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Part name on the wire.
    pub name: String,
    /// Validation rule.
    pub constraint: FieldConstraint,
}

/// Which response keys a variant reads.
///
/// Keys are dotted paths into the decoded response (`ocr_data.expiry_date`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMapping {
    /// Path of the freshness label used for catalog lookup.
    pub label: String,
    /// Paths of shelf-life figures, in display order.
    pub shelf_life: Vec<String>,
    /// Paths of label-extraction dates, in display order.
    pub label_dates: Vec<String>,
}

impl ResponseMapping {
    /// Returns every mapped path in display order.
    pub fn all_paths(&self) -> Vec<&str> {
        std::iter::once(self.label.as_str())
            .chain(self.shelf_life.iter().map(String::as_str))
            .chain(self.label_dates.iter().map(String::as_str))
            .collect()
    }
}

/// Complete description of one workflow variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantConfig {
    name: String,
    slots: Vec<SlotSpec>,
    fields: Vec<FieldSpec>,
    response: ResponseMapping,
    match_strategy: MatchStrategy,
}

impl VariantConfig {
    /// Creates a validated variant declaration.
    ///
    /// # Errors
    /// Returns [`CoreError::NoSlots`] when no slot is declared,
    /// [`CoreError::EmptyName`] for blank names, and
    /// [`CoreError::DuplicatePartName`] when a slot or field name repeats.
    pub fn new(
        name: impl Into<String>,
        slots: Vec<SlotSpec>,
        fields: Vec<FieldSpec>,
        response: ResponseMapping,
        match_strategy: MatchStrategy,
    ) -> Result<Self, CoreError> {
        if slots.is_empty() {
            return Err(CoreError::NoSlots);
        }

        // Invariant:
        // - Slot and field names share one namespace: they are the multipart
        //   part names.
        let mut seen = HashSet::new();
        let part_names = slots
            .iter()
            .map(|slot| slot.name.as_str())
            .chain(fields.iter().map(|field| field.name.as_str()));
        for part in part_names {
            if part.trim().is_empty() {
                return Err(CoreError::EmptyName);
            }
            if !seen.insert(part) {
                return Err(CoreError::DuplicatePartName(part.to_string()));
            }
        }

        if response.label.trim().is_empty() {
            return Err(CoreError::EmptyName);
        }

        Ok(Self {
            name: name.into(),
            slots,
            fields,
            response,
            match_strategy,
        })
    }

    /// Returns one of the four built-in wire configurations.
    pub fn builtin(id: VariantId) -> Self {
        let required = |name: &str| SlotSpec {
            name: name.to_string(),
            required: true,
        };
        let paths = |items: &[&str]| items.iter().map(|item| item.to_string()).collect();

        let (slots, fields, response, match_strategy) = match id {
            VariantId::A => (
                vec![required("product_image")],
                Vec::new(),
                ResponseMapping {
                    label: "freshness".to_string(),
                    shelf_life: paths(&["shelf_life"]),
                    label_dates: Vec::new(),
                },
                MatchStrategy::Substring,
            ),
            VariantId::B => (
                vec![required("freshness_image"), required("label_image")],
                Vec::new(),
                ResponseMapping {
                    label: "freshness".to_string(),
                    shelf_life: paths(&["shelf_life"]),
                    label_dates: paths(&["ocr_info.expiry_date"]),
                },
                MatchStrategy::Exact,
            ),
            VariantId::C => (
                vec![required("file")],
                Vec::new(),
                ResponseMapping {
                    label: "freshness".to_string(),
                    shelf_life: paths(&["shelf_life"]),
                    label_dates: Vec::new(),
                },
                MatchStrategy::Substring,
            ),
            VariantId::D => (
                vec![required("product_image"), required("expiry_image")],
                vec![FieldSpec {
                    name: "temperature".to_string(),
                    constraint: FieldConstraint::RequiredNumeric,
                }],
                ResponseMapping {
                    label: "freshness".to_string(),
                    shelf_life: paths(&["base_shelf_life", "adjusted_shelf_life"]),
                    label_dates: paths(&[
                        "ocr_data.expiry_date",
                        "ocr_data.mfg_date",
                        "ocr_data.best_before",
                    ]),
                },
                MatchStrategy::Exact,
            ),
        };

        Self {
            name: id.to_string(),
            slots,
            fields,
            response,
            match_strategy,
        }
    }

    /// Variant display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared slots in declaration order.
    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }

    /// Declared auxiliary fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Response keys this variant reads.
    pub fn response(&self) -> &ResponseMapping {
        &self.response
    }

    /// Default catalog matching heuristic.
    pub fn match_strategy(&self) -> MatchStrategy {
        self.match_strategy
    }

    /// Overrides the catalog matching heuristic.
    pub fn with_match_strategy(mut self, match_strategy: MatchStrategy) -> Self {
        self.match_strategy = match_strategy;
        self
    }

    /// Creates empty slots and fields for a fresh workflow instance.
    pub fn instantiate(&self) -> (Vec<MediaSlot>, Vec<AuxiliaryField>) {
        let slots = self
            .slots
            .iter()
            .map(|spec| MediaSlot::new(spec.name.clone(), spec.required))
            .collect();
        let fields = self
            .fields
            .iter()
            .map(|spec| AuxiliaryField::new(spec.name.clone(), spec.constraint))
            .collect();
        (slots, fields)
    }
}

/// Returns `true` when every required slot and field currently holds a value.
///
/// This is the readiness check, not validation: numeric content is not parsed.
pub fn inputs_populated(slots: &[MediaSlot], fields: &[AuxiliaryField]) -> bool {
    slots
        .iter()
        .filter(|slot| slot.is_required())
        .all(MediaSlot::is_populated)
        && fields
            .iter()
            .filter(|field| field.is_required())
            .all(AuxiliaryField::is_populated)
}

/// Checks slots and fields for submission readiness.
///
/// Rules run in order and the first failure wins:
/// 1. every required slot holds a file;
/// 2. every `required-numeric` field is non-blank and parses as a finite number.
///
/// # Errors
/// Returns the first [`ValidationError`] encountered.
pub fn validate(slots: &[MediaSlot], fields: &[AuxiliaryField]) -> Result<(), ValidationError> {
    if let Some(slot) = slots
        .iter()
        .find(|slot| slot.is_required() && !slot.is_populated())
    {
        return Err(ValidationError::MissingMedia(slot.name().to_string()));
    }

    for field in fields {
        if field.constraint() != FieldConstraint::RequiredNumeric {
            continue;
        }
        if !field.is_populated() {
            return Err(ValidationError::MissingField(field.name().to_string()));
        }
        if parse_finite_number(field.raw_value()).is_none() {
            return Err(ValidationError::InvalidNumber(field.name().to_string()));
        }
    }

    Ok(())
}

/// Parses a finite decimal number, ignoring surrounding whitespace.
///
/// `NaN` and infinities are rejected.
pub fn parse_finite_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Client-side readiness failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required slot has no file.
    #[error("missing media: {0}")]
    MissingMedia(String),
    /// A required field is blank.
    #[error("missing field: {0}")]
    MissingField(String),
    /// A numeric field does not hold a finite number.
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Error type for variant declaration and name parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A variant must declare at least one slot.
    #[error("variant declares no media slots")]
    NoSlots,
    /// Slot, field, and label names cannot be blank.
    #[error("slot, field, and label names must be non-empty")]
    EmptyName,
    /// Slot and field names must be unique.
    #[error("duplicate part name: {0}")]
    DuplicatePartName(String),
    /// Variant name is not one of the built-ins.
    #[error("unknown variant: {0}")]
    UnknownVariant(String),
    /// Match strategy name is not recognized.
    #[error("unknown match strategy: {0}")]
    UnknownMatchStrategy(String),
}
