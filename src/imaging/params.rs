//! Parameter types for image operations.
//!
//! These describe *what* to produce, not how. [`ImageKind`] is the format
//! detected on decode; [`EncodeFormat`] is the same closed set carrying the
//! encoder settings for that format. Output always keeps the input format, so
//! an `ImageKind` plus [`EncodeSettings`] fully determines the encoder.

use serde::{Deserialize, Serialize};

/// Lossy encoding quality (1-100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Lossless PNG compression effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

/// Decoded source format. Only formats in this set are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn name(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    /// Encoder settings for re-encoding a variant of this kind.
    pub fn encode_format(self, settings: &EncodeSettings) -> EncodeFormat {
        match self {
            ImageKind::Jpeg => EncodeFormat::Jpeg {
                quality: settings.jpeg_quality,
            },
            ImageKind::Png => EncodeFormat::Png {
                compression: settings.png_compression,
            },
        }
    }
}

/// Encoder selection with its format-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    Jpeg { quality: Quality },
    Png { compression: PngCompression },
}

impl EncodeFormat {
    pub fn kind(self) -> ImageKind {
        match self {
            EncodeFormat::Jpeg { .. } => ImageKind::Jpeg,
            EncodeFormat::Png { .. } => ImageKind::Png,
        }
    }

    pub fn content_type(self) -> &'static str {
        self.kind().content_type()
    }
}

/// Per-format encoder settings, usually built from `[encoding]` config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSettings {
    pub jpeg_quality: Quality,
    pub png_compression: PngCompression,
}

/// Target dimensions for one resize. Axes are independent; no aspect fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
}

/// MIME type for a stored key, judged by its extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn content_type_for_extension(key: &str) -> &'static str {
    let ext = crate::naming::split_filename(key).ext;
    match ext.as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        _ => "application/octet-stream",
    }
}
