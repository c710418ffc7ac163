#![warn(missing_docs)]
//! # freshvision-capture
//!
//! ## Purpose
//! Provides media acquisition and preview resource abstractions.
//!
//! ## Responsibilities
//! - Define a source-agnostic [`MediaSource`] trait.
//! - Read media from the filesystem with a guessed content type.
//! - Serve deterministic synthetic media for CI and unit tests.
//! - Allocate and release preview resources through [`PreviewStore`].
//!
//! ## Data flow
//! User picks a locator -> [`MediaSource::open`] yields a
//! [`freshvision_core::MediaFile`] -> the workflow allocates a preview from a
//! [`PreviewStore`] and releases the superseded one.
//!
//! ## Ownership and lifetimes
//! Media files own their buffers. Preview stores are shared behind `Arc` and
//! track live allocations so that repeated selections cannot accumulate
//! unreleased previews.
//!
//! ## Error model
//! Unreadable paths and poisoned stores surface as [`CaptureError`]. File
//! content is never inspected here.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use freshvision_core::{MediaFile, PreviewRef};
use thiserror::Error;

/// Trait implemented by concrete media providers.
pub trait MediaSource: Send + Sync {
    /// Opens one media file by locator.
    ///
    /// # Errors
    /// Returns [`CaptureError::NotFound`] when the locator is unknown, and
    /// [`CaptureError::Io`] when reading fails.
    fn open(&self, locator: &str) -> Result<MediaFile, CaptureError>;
}

/// Media source reading files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMediaSource;

impl MediaSource for FsMediaSource {
    fn open(&self, locator: &str) -> Result<MediaFile, CaptureError> {
        let path = Path::new(locator);
        let bytes = std::fs::read(path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => CaptureError::NotFound(locator.to_string()),
            _ => CaptureError::Io {
                locator: locator.to_string(),
                source: error,
            },
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| locator.to_string());
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());

        tracing::debug!(
            stage = "capture",
            action = "open",
            file_name = %file_name,
            bytes = bytes.len(),
            "media file read"
        );

        Ok(MediaFile::new(file_name, content_type, bytes))
    }
}

/// Deterministic in-memory media source for test and CI usage.
#[derive(Debug, Default)]
pub struct SyntheticMediaSource {
    files: BTreeMap<String, MediaFile>,
}

impl SyntheticMediaSource {
    /// Creates an empty synthetic source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file under `locator`.
    pub fn with_file(mut self, locator: impl Into<String>, file: MediaFile) -> Self {
        self.files.insert(locator.into(), file);
        self
    }

    /// Registers a small JPEG-labelled file whose bytes derive from `locator`.
    pub fn with_image(self, locator: &str) -> Self {
        let file = MediaFile::new(
            locator,
            Some("image/jpeg".to_string()),
            locator.as_bytes().to_vec(),
        );
        self.with_file(locator, file)
    }
}

impl MediaSource for SyntheticMediaSource {
    fn open(&self, locator: &str) -> Result<MediaFile, CaptureError> {
        self.files
            .get(locator)
            .cloned()
            .ok_or_else(|| CaptureError::NotFound(locator.to_string()))
    }
}

/// Allocator of displayable previews for selected media.
pub trait PreviewStore: Send + Sync {
    /// Allocates a preview for `file`.
    ///
    /// # Errors
    /// Returns [`CaptureError::Store`] when the store cannot record the
    /// allocation.
    fn allocate(&self, file: &MediaFile) -> Result<PreviewRef, CaptureError>;

    /// Releases a previously allocated preview. Unknown ids are ignored.
    fn release(&self, preview: &PreviewRef);

    /// Returns the number of allocated, unreleased previews.
    fn live_count(&self) -> usize;
}

#[derive(Debug, Default)]
struct PreviewLedger {
    next_id: u64,
    live: HashMap<u64, String>,
}

/// Preview store that keeps allocations in process memory.
///
/// Locators take the form `preview://<id>/<file_name>`.
#[derive(Debug, Default)]
pub struct InMemoryPreviewStore {
    ledger: Mutex<PreviewLedger>,
}

impl InMemoryPreviewStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewStore for InMemoryPreviewStore {
    fn allocate(&self, file: &MediaFile) -> Result<PreviewRef, CaptureError> {
        let mut ledger = self
            .ledger
            .lock()
            .map_err(|_| CaptureError::Store("preview ledger lock poisoned".to_string()))?;

        ledger.next_id += 1;
        let id = ledger.next_id;
        let locator = format!("preview://{id}/{}", file.file_name);
        ledger.live.insert(id, locator.clone());

        Ok(PreviewRef { id, locator })
    }

    fn release(&self, preview: &PreviewRef) {
        match self.ledger.lock() {
            Ok(mut ledger) => {
                if ledger.live.remove(&preview.id).is_none() {
                    tracing::debug!(
                        stage = "capture",
                        action = "release_unknown",
                        preview_id = preview.id,
                        "preview was not live"
                    );
                }
            }
            Err(_) => tracing::error!(
                stage = "capture",
                action = "release",
                preview_id = preview.id,
                "preview ledger lock poisoned"
            ),
        }
    }

    fn live_count(&self) -> usize {
        self.ledger
            .lock()
            .map(|ledger| ledger.live.len())
            .unwrap_or_default()
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Locator does not resolve to any media.
    #[error("media not found: {0}")]
    NotFound(String),
    /// Media could not be read.
    #[error("failed to read media '{locator}': {source}")]
    Io {
        /// Locator that failed.
        locator: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Preview store failure.
    #[error("preview store failure: {0}")]
    Store(String),
}
