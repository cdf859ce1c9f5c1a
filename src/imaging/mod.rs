//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Detect + decode** | `image::guess_format` + `image::load_from_memory_with_format` |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Encode** | `JpegEncoder` (quality 85 by default) / `PngEncoder` (lossless) |
//!
//! The module is split into:
//! - **Calculations**: pure dimension checks (unit testable)
//! - **Parameters**: format and encoder setting types
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: resize + encode composed for one variant

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, Dimensions, ImageBackend};
pub use calculations::DEFAULT_MAX_VARIANT_PIXELS;
pub use operations::{RenderedVariant, render_variant};
pub use params::{
    EncodeFormat, EncodeSettings, ImageKind, PngCompression, Quality, ResizeParams,
    content_type_for_extension,
};
pub use rust_backend::RustBackend;
