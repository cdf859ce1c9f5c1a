//! CLI output formatting.
//!
//! Progress goes to stderr as human-readable lines; machine-readable results
//! (the upload response) go to stdout as JSON.
//!
//! # Output Format
//!
//! ## Upload progress
//!
//! ```text
//! Original photo_1234567890.jpg (1920x1080, 412.3 KB)
//!     800x600: stored photo_800x600_1234567890.jpg
//!     400x300: failed at upload (IO error on photo_400x300_1234567890.jpg: ...)
//! Stored 1 of 2 variants
//! ```
//!
//! ## Get
//!
//! ```text
//! photo_800x600_1234567890.jpg
//!     Size: 800x600
//!     Type: image/jpeg
//!     URL: https://images.s3.us-east-1.amazonaws.com/photo_800x600_1234567890.jpg
//! ```
//!
//! ## List
//!
//! ```text
//! 001 photo_1234567890.jpg
//! 002 photo_800x600_1234567890.jpg
//!
//! 2 objects
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that does the I/O. Format functions are
//! pure.

use crate::lookup::ImageDetails;
use crate::upload::{UploadEvent, UploadResult, VariantOutcome};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Format a single upload progress event as display lines.
pub fn format_upload_event(event: &UploadEvent) -> Vec<String> {
    match event {
        UploadEvent::OriginalStored {
            key,
            width,
            height,
            size,
        } => vec![format!(
            "Original {} ({}x{}, {})",
            key,
            width,
            height,
            format_size(*size)
        )],
        UploadEvent::Variant(VariantOutcome::Stored { spec, key, .. }) => {
            vec![format!("    {}: stored {}", spec, key)]
        }
        UploadEvent::Variant(VariantOutcome::Failed {
            spec,
            stage,
            reason,
            ..
        }) => vec![format!("    {}: failed at {} ({})", spec, stage, reason)],
        UploadEvent::Completed {
            stored, requested, ..
        } => vec![format!("Stored {} of {} variants", stored, requested)],
    }
}

pub fn print_upload_event(event: &UploadEvent) {
    for line in format_upload_event(event) {
        eprintln!("{}", line);
    }
}

/// Pretty JSON response body for a finished upload.
pub fn format_upload_result(result: &UploadResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

// ============================================================================
// Get / List
// ============================================================================

pub fn format_image_info(details: &ImageDetails) -> Vec<String> {
    let image = &details.image;
    let size = if image.width == 0 && image.height == 0 {
        "unknown (original)".to_string()
    } else {
        format!("{}x{}", image.width, image.height)
    };
    vec![
        details.key.clone(),
        format!("    Size: {}", size),
        format!("    Type: {}", details.content_type),
        format!("    URL: {}", image.url),
    ]
}

pub fn print_image_info(details: &ImageDetails) {
    for line in format_image_info(details) {
        println!("{}", line);
    }
}

pub fn format_key_list(keys: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| format!("{} {}", format_index(i + 1), key))
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    let noun = if keys.len() == 1 { "object" } else { "objects" };
    lines.push(format!("{} {}", keys.len(), noun));
    lines
}

pub fn print_key_list(keys: &[String]) {
    for line in format_key_list(keys) {
        println!("{}", line);
    }
}
