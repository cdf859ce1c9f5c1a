//! Upload pipeline: decode, store the original, then render and store each
//! requested variant.
//!
//! ## States
//!
//! ```text
//! Start → Decoded → OriginalStored → {variant attempt}* → Completed
//!            ↓             ↓
//!          Failed        Failed
//! ```
//!
//! Only two steps can fail a request: decoding the source and storing the
//! original. A variant that fails to resize, encode, or upload is logged,
//! reported to the event sink as [`VariantOutcome::Failed`], and left out of
//! the response. Callers detect partial failure by comparing the number of
//! returned variants with the number they asked for.
//!
//! ## Ordering
//!
//! Everything runs sequentially on the calling thread. The original is
//! committed before any variant is attempted, and variants are attempted in
//! request order. Nothing checks for cancellation between steps.
//!
//! ## Key collisions
//!
//! Two identical specs in one request derive the same key. Both are
//! processed, the second write replaces the first, and both appear in the
//! response with the same URL.

use crate::imaging::{
    BackendError, DEFAULT_MAX_VARIANT_PIXELS, DecodedImage, EncodeSettings, ImageBackend,
    RustBackend, render_variant,
};
use crate::naming::{Clock, KeyScheme, SystemClock};
use crate::request::CompressSpec;
use crate::store::{ArtifactStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Message returned whenever the original was stored.
pub const SUCCESS_MESSAGE: &str = "Image uploaded and processed successfully";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to decode image: {0}")]
    DecodeFailed(#[source] BackendError),
    #[error("failed to upload original image {key}: {source}")]
    OriginalUploadFailed {
        key: String,
        #[source]
        source: StoreError,
    },
}

impl UploadError {
    /// Whether the fault lies with the input rather than the storage dependency.
    ///
    /// A filename that derives a key the store rejects counts as input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UploadError::DecodeFailed(_)
                | UploadError::OriginalUploadFailed {
                    source: StoreError::InvalidKey(_),
                    ..
                }
        )
    }
}

/// One stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// Response for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(rename = "original_image")]
    pub original: ImageResult,
    /// Stored variants in request order. Failed variants are absent.
    #[serde(rename = "compressed_images")]
    pub variants: Vec<ImageResult>,
    pub message: String,
}

/// Step at which a variant failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStage {
    Resize,
    Encode,
    Upload,
}

impl fmt::Display for VariantStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariantStage::Resize => "resize",
            VariantStage::Encode => "encode",
            VariantStage::Upload => "upload",
        })
    }
}

/// What happened to one requested variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    Stored {
        spec: CompressSpec,
        key: String,
        image: ImageResult,
        etag: String,
    },
    Failed {
        spec: CompressSpec,
        key: String,
        stage: VariantStage,
        reason: String,
    },
}

impl VariantOutcome {
    pub fn key(&self) -> &str {
        match self {
            VariantOutcome::Stored { key, .. } | VariantOutcome::Failed { key, .. } => key,
        }
    }

    pub fn stored_image(&self) -> Option<&ImageResult> {
        match self {
            VariantOutcome::Stored { image, .. } => Some(image),
            VariantOutcome::Failed { .. } => None,
        }
    }
}

/// Progress events sent to the optional sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    OriginalStored {
        key: String,
        width: u32,
        height: u32,
        size: u64,
    },
    Variant(VariantOutcome),
    Completed {
        original_key: String,
        stored: usize,
        requested: usize,
    },
}

/// Full account of one upload: the response plus every variant outcome.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub original_key: String,
    pub result: UploadResult,
    pub outcomes: Vec<VariantOutcome>,
}

/// Tunables for variant rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub encoding: EncodeSettings,
    pub max_variant_pixels: u64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            encoding: EncodeSettings::default(),
            max_variant_pixels: DEFAULT_MAX_VARIANT_PIXELS,
        }
    }
}

/// Runs uploads against one store.
///
/// Holds no per-request state, so a single `Uploader` can serve concurrent
/// requests by shared reference.
pub struct Uploader<S, B = RustBackend> {
    store: S,
    backend: B,
    clock: Box<dyn Clock>,
    options: UploadOptions,
    events: Option<Sender<UploadEvent>>,
}

impl<S: ArtifactStore> Uploader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            backend: RustBackend::new(),
            clock: Box::new(SystemClock),
            options: UploadOptions::default(),
            events: None,
        }
    }
}

impl<S: ArtifactStore, B: ImageBackend> Uploader<S, B> {
    /// Swap the imaging backend (e.g. for a mock).
    pub fn with_backend<B2: ImageBackend>(self, backend: B2) -> Uploader<S, B2> {
        Uploader {
            store: self.store,
            backend,
            clock: self.clock,
            options: self.options,
            events: self.events,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Send progress events, including failed variants, to `tx`.
    pub fn with_events(mut self, tx: Sender<UploadEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one upload and return the response body.
    pub fn process(
        &self,
        bytes: &[u8],
        filename: &str,
        specs: &[CompressSpec],
    ) -> Result<UploadResult, UploadError> {
        self.process_detailed(bytes, filename, specs)
            .map(|report| report.result)
    }

    /// Process one upload and return the response along with every variant outcome.
    pub fn process_detailed(
        &self,
        bytes: &[u8],
        filename: &str,
        specs: &[CompressSpec],
    ) -> Result<UploadReport, UploadError> {
        let source = self
            .backend
            .decode(bytes)
            .map_err(UploadError::DecodeFailed)?;
        let bounds = source.dimensions();

        let keys = KeyScheme::new(filename, self.clock.now_nanos());
        let original_key = keys.original_key();

        // The original is stored exactly as uploaded, never re-encoded.
        let receipt = self
            .store
            .put(&original_key, bytes, source.kind.content_type())
            .map_err(|source| UploadError::OriginalUploadFailed {
                key: original_key.clone(),
                source,
            })?;
        debug!(
            key = %original_key,
            timestamp = %keys.timestamp_nanos(),
            size = receipt.size,
            etag = %receipt.etag,
            "stored original"
        );
        self.emit(UploadEvent::OriginalStored {
            key: original_key.clone(),
            width: bounds.width,
            height: bounds.height,
            size: receipt.size,
        });

        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            let outcome = self.attempt_variant(&source, &keys, spec);
            self.emit(UploadEvent::Variant(outcome.clone()));
            outcomes.push(outcome);
        }

        let variants: Vec<ImageResult> = outcomes
            .iter()
            .filter_map(|o| o.stored_image().cloned())
            .collect();

        info!(
            key = %original_key,
            stored = variants.len(),
            requested = specs.len(),
            "upload complete"
        );
        self.emit(UploadEvent::Completed {
            original_key: original_key.clone(),
            stored: variants.len(),
            requested: specs.len(),
        });

        Ok(UploadReport {
            result: UploadResult {
                original: ImageResult {
                    width: bounds.width,
                    height: bounds.height,
                    url: self.store.url_for(&original_key),
                },
                variants,
                message: SUCCESS_MESSAGE.to_string(),
            },
            original_key,
            outcomes,
        })
    }

    fn attempt_variant(
        &self,
        source: &DecodedImage,
        keys: &KeyScheme,
        spec: &CompressSpec,
    ) -> VariantOutcome {
        let key = keys.variant_key(spec);
        let failed = |stage: VariantStage, reason: String| {
            warn!(key = %key, spec = %spec, stage = %stage, error = %reason, "variant dropped");
            VariantOutcome::Failed {
                spec: *spec,
                key: key.clone(),
                stage,
                reason,
            }
        };

        let rendered = match render_variant(
            &self.backend,
            source,
            spec,
            &self.options.encoding,
            self.options.max_variant_pixels,
        ) {
            Ok(rendered) => rendered,
            Err(e @ BackendError::Encode(_)) => return failed(VariantStage::Encode, e.to_string()),
            Err(e) => return failed(VariantStage::Resize, e.to_string()),
        };

        match self.store.put(&key, &rendered.bytes, rendered.content_type) {
            Ok(receipt) => {
                debug!(key = %key, size = receipt.size, "stored variant");
                VariantOutcome::Stored {
                    spec: *spec,
                    image: ImageResult {
                        width: rendered.width,
                        height: rendered.height,
                        url: self.store.url_for(&key),
                    },
                    key: key.clone(),
                    etag: receipt.etag,
                }
            }
            Err(e) => failed(VariantStage::Upload, e.to_string()),
        }
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }
}
