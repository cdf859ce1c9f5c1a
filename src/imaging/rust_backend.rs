//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Detect format | `image::guess_format` (magic bytes) |
//! | Decode (JPEG, PNG) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (fixed quality) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (adaptive filter) |

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::params::{EncodeFormat, ImageKind, PngCompression, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

/// Map a detected container format onto the supported set.
fn supported_kind(format: ImageFormat) -> Option<ImageKind> {
    match format {
        ImageFormat::Jpeg => Some(ImageKind::Jpeg),
        ImageFormat::Png => Some(ImageKind::Png),
        _ => None,
    }
}

fn png_compression(compression: PngCompression) -> CompressionType {
    match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    }
}

/// Pure Rust backend using the `image` crate.
///
/// Stateless, so a single instance can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
        // Content decides the format. The filename extension is never consulted.
        let format = image::guess_format(bytes)
            .map_err(|_| BackendError::UnsupportedFormat("unrecognized signature".to_string()))?;
        let kind = supported_kind(format)
            .ok_or_else(|| BackendError::UnsupportedFormat(format!("{format:?}")))?;

        let raster =
            image::load_from_memory_with_format(bytes, format).map_err(|e| BackendError::Decode {
                kind: kind.name(),
                reason: e.to_string(),
            })?;
        Ok(DecodedImage { raster, kind })
    }

    fn resize(
        &self,
        raster: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::Resize(format!(
                "target {}x{} has a zero dimension",
                params.width, params.height
            )));
        }
        Ok(raster.resize_exact(params.width, params.height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        format: EncodeFormat,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        match format {
            EncodeFormat::Jpeg { quality } => {
                // JPEG has no alpha channel.
                let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
                raster
                    .to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
            }
            EncodeFormat::Png { compression } => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buf,
                    png_compression(compression),
                    PngFilter::Adaptive,
                );
                raster
                    .write_with_encoder(encoder)
                    .map_err(|e| BackendError::Encode(format!("PNG: {e}")))?;
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    #[test]
    fn decode_jpeg_detects_kind_and_bounds() {
        let decoded = RustBackend::new().decode(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(decoded.kind, ImageKind::Jpeg);
        assert_eq!(decoded.raster.width(), 200);
        assert_eq!(decoded.raster.height(), 150);
    }

    #[test]
    fn decode_png_detects_kind_and_bounds() {
        let decoded = RustBackend::new().decode(&png_bytes(33, 17)).unwrap();
        assert_eq!(decoded.kind, ImageKind::Png);
        assert_eq!(decoded.dimensions().width, 33);
        assert_eq!(decoded.dimensions().height, 17);
    }

    #[test]
    fn decode_random_bytes_is_unsupported() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(_))));
    }

    #[test]
    fn decode_empty_is_unsupported() {
        let result = RustBackend::new().decode(&[]);
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(_))));
    }

    #[test]
    fn decode_known_but_unsupported_signature() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        let result = RustBackend::new().decode(gif);
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(_))));
    }

    #[test]
    fn decode_truncated_png_is_decode_error() {
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(40);
        let result = RustBackend::new().decode(&bytes);
        assert!(matches!(result, Err(BackendError::Decode { kind: "png", .. })));
    }

    #[test]
    fn decode_truncated_jpeg_is_decode_error() {
        let mut bytes = jpeg_bytes(64, 64);
        bytes.truncate(20);
        let result = RustBackend::new().decode(&bytes);
        assert!(matches!(result, Err(BackendError::Decode { kind: "jpeg", .. })));
    }

    #[test]
    fn resize_stretches_to_exact_target() {
        let src = DynamicImage::new_rgb8(400, 300);
        let out = RustBackend::new()
            .resize(&src, &ResizeParams { width: 100, height: 100 })
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));
    }

    #[test]
    fn resize_upscales() {
        let src = DynamicImage::new_rgb8(20, 10);
        let out = RustBackend::new()
            .resize(&src, &ResizeParams { width: 50, height: 40 })
            .unwrap();
        assert_eq!((out.width(), out.height()), (50, 40));
    }

    #[test]
    fn resize_zero_dimension_errors() {
        let src = DynamicImage::new_rgb8(20, 10);
        let result = RustBackend::new().resize(&src, &ResizeParams { width: 0, height: 5 });
        assert!(matches!(result, Err(BackendError::Resize(_))));
    }

    #[test]
    fn encode_jpeg_magic() {
        let bytes = RustBackend::new()
            .encode(
                &DynamicImage::new_rgb8(10, 10),
                EncodeFormat::Jpeg {
                    quality: Quality::default(),
                },
            )
            .unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn encode_png_magic() {
        let bytes = RustBackend::new()
            .encode(
                &DynamicImage::new_rgba8(10, 10),
                EncodeFormat::Png {
                    compression: PngCompression::Best,
                },
            )
            .unwrap();
        assert_eq!(&bytes[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn encode_jpeg_drops_alpha() {
        let result = RustBackend::new().encode(
            &DynamicImage::new_rgba8(10, 10),
            EncodeFormat::Jpeg {
                quality: Quality::new(50),
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn resize_encode_decode_keeps_requested_dimensions() {
        let backend = RustBackend::new();
        for (source, format) in [
            (
                jpeg_bytes(120, 90),
                EncodeFormat::Jpeg {
                    quality: Quality::default(),
                },
            ),
            (
                png_bytes(120, 90),
                EncodeFormat::Png {
                    compression: PngCompression::Default,
                },
            ),
        ] {
            let decoded = backend.decode(&source).unwrap();
            let resized = backend
                .resize(&decoded.raster, &ResizeParams { width: 37, height: 61 })
                .unwrap();
            let encoded = backend.encode(&resized, format).unwrap();
            let again = backend.decode(&encoded).unwrap();
            assert_eq!(again.kind, format.kind());
            assert_eq!((again.raster.width(), again.raster.height()), (37, 61));
        }
    }

    #[test]
    fn higher_jpeg_quality_is_larger() {
        let backend = RustBackend::new();
        let raster = backend.decode(&jpeg_bytes(128, 128)).unwrap().raster;
        let low = backend
            .encode(&raster, EncodeFormat::Jpeg { quality: Quality::new(10) })
            .unwrap();
        let high = backend
            .encode(&raster, EncodeFormat::Jpeg { quality: Quality::new(95) })
            .unwrap();
        assert!(high.len() > low.len());
    }
}
