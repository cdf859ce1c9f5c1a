//! Storage key derivation for one upload.
//!
//! Every artifact produced by a single upload shares one timestamp, so all of
//! them sort together and can be found with a single grep:
//!
//! ```text
//! photo.JPG uploaded at 1234567890 ns, specs 800x600 and 400x300
//!   photo_1234567890.jpg            (original)
//!   photo_800x600_1234567890.jpg    (variant)
//!   photo_400x300_1234567890.jpg    (variant)
//! ```
//!
//! ## Uniqueness
//!
//! Keys are never checked against the store. Two uploads of the same filename
//! collide only if they read the same nanosecond timestamp, so uniqueness is
//! probabilistic rather than guaranteed. Two identical specs within one upload
//! *do* collide and the later write replaces the earlier one.

use crate::request::CompressSpec;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the per-upload timestamp.
pub trait Clock: Send + Sync {
    /// Nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> u128;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u128 {
        // A clock set before 1970 yields 0 rather than failing the upload.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
    }
}

/// Always returns the same instant. Makes keys reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u128);

impl Clock for FixedClock {
    fn now_nanos(&self) -> u128 {
        self.0
    }
}

/// Filename split into the parts that go into a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName {
    /// Filename with the extension removed.
    pub basename: String,
    /// Lower-cased extension including the leading dot, or empty.
    pub ext: String,
}

/// Split `photo.JPG` into `("photo", ".jpg")`.
///
/// The extension starts at the last dot of the final path element. A
/// filename without such a dot has an empty extension.
pub fn split_filename(filename: &str) -> SplitName {
    let start = filename.rfind('/').map_or(0, |slash| slash + 1);
    match filename[start..].rfind('.') {
        Some(dot) => SplitName {
            basename: filename[..start + dot].to_string(),
            ext: filename[start + dot..].to_lowercase(),
        },
        None => SplitName {
            basename: filename.to_string(),
            ext: String::new(),
        },
    }
}

/// Key scheme for all artifacts of one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    name: SplitName,
    timestamp_nanos: u128,
}

impl KeyScheme {
    pub fn new(filename: &str, timestamp_nanos: u128) -> Self {
        Self {
            name: split_filename(filename),
            timestamp_nanos,
        }
    }

    pub fn timestamp_nanos(&self) -> u128 {
        self.timestamp_nanos
    }

    /// `<basename>_<timestamp><ext>`
    pub fn original_key(&self) -> String {
        format!(
            "{}_{}{}",
            self.name.basename, self.timestamp_nanos, self.name.ext
        )
    }

    /// `<basename>_<w>x<h>_<timestamp><ext>`
    pub fn variant_key(&self, spec: &CompressSpec) -> String {
        format!(
            "{}_{}x{}_{}{}",
            self.name.basename,
            spec.width(),
            spec.height(),
            self.timestamp_nanos,
            self.name.ext
        )
    }
}

/// Recover `(width, height)` from a variant key.
///
/// Reads the second-to-last `_`-separated segment as `WxH`. Returns `None`
/// for original keys and anything else that does not carry two positive
/// dimensions.
pub fn parse_variant_dimensions(key: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = key.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    let (w, h) = parts[parts.len() - 2].split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
