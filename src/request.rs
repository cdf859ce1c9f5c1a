//! Upload request validation.
//!
//! Checks that run before any pixel work: the filename extension gate, the
//! size cap, and parsing of the requested variant dimensions. Format detection
//! itself happens later, from the bytes (see [`crate::imaging`]); the
//! extension gate here only mirrors what the upload surface accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Extensions accepted at the upload surface.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Default upload size cap (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 32 << 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("unsupported file type {0:?}, only JPG and PNG are accepted")]
    UnsupportedExtension(String),
    #[error("at least one compress size is required")]
    MissingSpecs,
    #[error("invalid compress sizes: {0}")]
    InvalidSpecs(String),
    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

/// A requested output size. Both dimensions are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpec")]
pub struct CompressSpec {
    width: u32,
    height: u32,
}

/// Wire shape before validation. Signed so negative input gets a clear error.
#[derive(Deserialize)]
struct RawSpec {
    width: i64,
    height: i64,
}

impl TryFrom<RawSpec> for CompressSpec {
    type Error = RequestError;

    fn try_from(raw: RawSpec) -> Result<Self, Self::Error> {
        let width = u32::try_from(raw.width).ok();
        let height = u32::try_from(raw.height).ok();
        match (width, height) {
            (Some(w), Some(h)) => CompressSpec::new(w, h),
            _ => Err(RequestError::InvalidSpecs(format!(
                "{}x{} is out of range",
                raw.width, raw.height
            ))),
        }
    }
}

impl CompressSpec {
    pub fn new(width: u32, height: u32) -> Result<Self, RequestError> {
        if width == 0 || height == 0 {
            return Err(RequestError::InvalidSpecs(format!(
                "{width}x{height} must have positive width and height"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for CompressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses the `800x600` shorthand.
impl FromStr for CompressSpec {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RequestError::InvalidSpecs(format!("{s:?} is not WIDTHxHEIGHT"));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        CompressSpec::new(width, height)
    }
}

/// Parse the `compress_sizes` JSON array: `[{"width": 800, "height": 600}, ...]`.
pub fn parse_specs_json(json: &str) -> Result<Vec<CompressSpec>, RequestError> {
    if json.trim().is_empty() {
        return Err(RequestError::MissingSpecs);
    }
    let specs: Vec<CompressSpec> =
        serde_json::from_str(json).map_err(|e| RequestError::InvalidSpecs(e.to_string()))?;
    if specs.is_empty() {
        return Err(RequestError::MissingSpecs);
    }
    Ok(specs)
}

/// Specs from an optional JSON array followed by `WxH` shorthand specs.
///
/// At least one spec must be present across both sources.
pub fn combine_specs(
    json: Option<&str>,
    shorthand: &[CompressSpec],
) -> Result<Vec<CompressSpec>, RequestError> {
    let mut specs = match json {
        Some(json) => parse_specs_json(json)?,
        None => Vec::new(),
    };
    specs.extend_from_slice(shorthand);
    if specs.is_empty() {
        return Err(RequestError::MissingSpecs);
    }
    Ok(specs)
}

/// Reject filenames whose extension the upload surface does not accept.
pub fn check_extension(filename: &str) -> Result<(), RequestError> {
    let ext = crate::naming::split_filename(filename).ext;
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(RequestError::UnsupportedExtension(filename.to_string()))
    }
}

/// Reject payloads above `limit` bytes.
pub fn check_size(size: u64, limit: u64) -> Result<(), RequestError> {
    if size > limit {
        return Err(RequestError::TooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero() {
        assert!(CompressSpec::new(0, 10).is_err());
        assert!(CompressSpec::new(10, 0).is_err());
        assert!(CompressSpec::new(1, 1).is_ok());
    }

    #[test]
    fn parse_json_array() {
        let specs =
            parse_specs_json(r#"[{"width": 800, "height": 600}, {"width": 400, "height": 300}]"#)
                .unwrap();
        assert_eq!(
            specs,
            vec![
                CompressSpec::new(800, 600).unwrap(),
                CompressSpec::new(400, 300).unwrap()
            ]
        );
    }

    #[test]
    fn parse_json_rejects_negative() {
        let err = parse_specs_json(r#"[{"width": -1, "height": 600}]"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidSpecs(_)));
    }

    #[test]
    fn parse_json_rejects_zero() {
        let err = parse_specs_json(r#"[{"width": 0, "height": 600}]"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidSpecs(_)));
    }

    #[test]
    fn parse_json_rejects_missing_field() {
        let err = parse_specs_json(r#"[{"width": 100}]"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidSpecs(_)));
    }

    #[test]
    fn parse_json_empty_is_missing() {
        assert_eq!(parse_specs_json("").unwrap_err(), RequestError::MissingSpecs);
        assert_eq!(parse_specs_json("[]").unwrap_err(), RequestError::MissingSpecs);
    }

    #[test]
    fn shorthand_parses() {
        let spec: CompressSpec = "800x600".parse().unwrap();
        assert_eq!((spec.width(), spec.height()), (800, 600));
        let spec: CompressSpec = " 64X48 ".parse().unwrap();
        assert_eq!((spec.width(), spec.height()), (64, 48));
    }

    #[test]
    fn shorthand_rejects_garbage() {
        assert!("800".parse::<CompressSpec>().is_err());
        assert!("axb".parse::<CompressSpec>().is_err());
        assert!("0x5".parse::<CompressSpec>().is_err());
    }

    #[test]
    fn display_matches_shorthand() {
        assert_eq!(CompressSpec::new(12, 34).unwrap().to_string(), "12x34");
    }

    #[test]
    fn extension_gate() {
        assert!(check_extension("a.jpg").is_ok());
        assert!(check_extension("a.JPEG").is_ok());
        assert!(check_extension("a.png").is_ok());
        assert!(matches!(
            check_extension("a.gif"),
            Err(RequestError::UnsupportedExtension(_))
        ));
        assert!(check_extension("noext").is_err());
    }

    #[test]
    fn size_cap() {
        assert!(check_size(10, 10).is_ok());
        assert_eq!(
            check_size(11, 10),
            Err(RequestError::TooLarge { size: 11, limit: 10 })
        );
    }

    #[test]
    fn combine_keeps_json_then_shorthand_order() {
        let extra = [CompressSpec::new(10, 10).unwrap()];
        let specs = combine_specs(Some(r#"[{"width": 800, "height": 600}]"#), &extra).unwrap();
        let shown: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        assert_eq!(shown, vec!["800x600", "10x10"]);
    }

    #[test]
    fn combine_requires_at_least_one_spec() {
        assert_eq!(combine_specs(None, &[]), Err(RequestError::MissingSpecs));
        assert_eq!(
            combine_specs(None, &[CompressSpec::new(1, 1).unwrap()]).unwrap().len(),
            1
        );
    }
}
