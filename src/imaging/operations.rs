//! High-level image operations.
//!
//! These combine the pure calculations with backend execution. The upload
//! pipeline calls [`render_variant`] once per requested size.

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::calculations::check_resize_target;
use super::params::{EncodeSettings, ResizeParams};
use crate::request::CompressSpec;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// An encoded variant ready for storage.
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Dimensions of the raster that was encoded.
    pub width: u32,
    pub height: u32,
}

/// Resize `source` to `spec` and encode it in the source's own format.
///
/// The target is checked against `max_pixels` before resizing. Errors carry
/// the failing stage: [`BackendError::Resize`] or [`BackendError::Encode`].
pub fn render_variant(
    backend: &impl ImageBackend,
    source: &DecodedImage,
    spec: &CompressSpec,
    settings: &EncodeSettings,
    max_pixels: u64,
) -> Result<RenderedVariant> {
    check_resize_target(spec.width(), spec.height(), max_pixels).map_err(BackendError::Resize)?;

    let resized = backend.resize(
        &source.raster,
        &ResizeParams {
            width: spec.width(),
            height: spec.height(),
        },
    )?;

    let format = source.kind.encode_format(settings);
    let bytes = backend.encode(&resized, format)?;

    Ok(RenderedVariant {
        bytes,
        content_type: format.content_type(),
        width: resized.width(),
        height: resized.height(),
    })
}
