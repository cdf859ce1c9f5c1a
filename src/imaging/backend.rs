//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel operations the upload
//! pipeline needs: decode, resize, and encode. The production implementation
//! is [`RustBackend`](super::rust_backend::RustBackend). Tests swap in the
//! recording [`tests::MockBackend`] to drive failure paths without real codecs.

use super::params::{EncodeFormat, ImageKind, ResizeParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode {kind} image: {reason}")]
    Decode { kind: &'static str, reason: String },
    #[error("resize failed: {0}")]
    Resize(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A decoded source image. Owned by the request that decoded it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub raster: DynamicImage,
    pub kind: ImageKind,
}

impl DecodedImage {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.raster.width(),
            height: self.raster.height(),
        }
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: one backend serves every in-flight upload.
pub trait ImageBackend: Sync {
    /// Detect the format from content and decode.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError>;

    /// Resample to exactly `params.width × params.height`.
    fn resize(
        &self,
        raster: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, BackendError>;

    /// Serialize with the given encoder settings.
    fn encode(&self, raster: &DynamicImage, format: EncodeFormat)
    -> Result<Vec<u8>, BackendError>;
}
