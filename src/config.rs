//! Service configuration.
//!
//! Loads `imgvault.toml`, merges it over the stock defaults, and validates
//! the result. Every key is optional; a missing file yields the defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! [storage]
//! root = "store"                    # Directory backing the object store
//! bucket = "images"                 # Bucket name used in public URLs
//! region = "us-east-1"              # Region used in public URLs
//! # endpoint = "http://localhost:9000"  # Custom endpoint (path-style URLs)
//!
//! [encoding]
//! jpeg_quality = 85                 # JPEG variant quality (1-100)
//! png_compression = "default"       # fast | default | best
//!
//! [limits]
//! max_upload_bytes = 33554432       # Largest accepted upload (32 MiB)
//! max_variant_pixels = 100000000    # Largest variant, width × height
//!
//! [logging]
//! filter = "imgvault=info"          # tracing filter when RUST_LOG is unset
//! ```
//!
//! ## Partial Configuration
//!
//! Override only what differs:
//!
//! ```toml
//! [storage]
//! endpoint = "http://localhost:9000"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DEFAULT_MAX_VARIANT_PIXELS, EncodeSettings, PngCompression, Quality};
use crate::request::DEFAULT_MAX_UPLOAD_BYTES;
use crate::store::PublicUrl;
use crate::upload::UploadOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Conventional config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "imgvault.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub storage: StorageConfig,
    pub encoding: EncodingConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

/// Where objects live and how their public URLs look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub root: String,
    pub bucket: String,
    pub region: String,
    /// S3-compatible endpoint. When set, URLs are path-style under it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let urls = PublicUrl::default();
        Self {
            root: "store".to_string(),
            bucket: urls.bucket,
            region: urls.region,
            endpoint: urls.endpoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub jpeg_quality: u32,
    pub png_compression: PngCompression,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: u32::from(Quality::default().value()),
            png_compression: PngCompression::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_upload_bytes: u64,
    pub max_variant_pixels: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_variant_pixels: DEFAULT_MAX_VARIANT_PIXELS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "imgvault=info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.root must not be empty".into(),
            ));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.bucket must not be empty".into(),
            ));
        }
        if let Some(endpoint) = &self.storage.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "storage.endpoint must be an http(s) URL, got {endpoint:?}"
                )));
            }
        }
        if self.limits.max_upload_bytes == 0 || self.limits.max_variant_pixels == 0 {
            return Err(ConfigError::Validation(
                "limits values must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn public_url(&self) -> PublicUrl {
        PublicUrl {
            bucket: self.storage.bucket.clone(),
            region: self.storage.region.clone(),
            endpoint: self.storage.endpoint.clone(),
        }
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            jpeg_quality: Quality::new(self.encoding.jpeg_quality),
            png_compression: self.encoding.png_compression,
        }
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            encoding: self.encode_settings(),
            max_variant_pixels: self.limits.max_variant_pixels,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServiceConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServiceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` over the stock defaults.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgvault configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Directory backing the object store. Created on first use.
root = "store"

# Bucket and region only shape public URLs:
#   https://<bucket>.s3.<region>.amazonaws.com/<key>
bucket = "images"
region = "us-east-1"

# S3-compatible endpoint (MinIO, localstack, ...). When set, URLs become
#   <endpoint>/<bucket>/<key>
# endpoint = "http://localhost:9000"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
# Variants keep the format of the upload: JPEG in, JPEG out.
[encoding]
# JPEG quality for variants (1-100).
jpeg_quality = 85

# PNG compression effort: "fast", "default", or "best". Always lossless.
png_compression = "default"

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Largest accepted upload in bytes (32 MiB).
max_upload_bytes = 33554432

# Largest variant a request may ask for, in pixels (width * height).
# Larger variants are dropped from the response; the upload still succeeds.
max_variant_pixels = 100000000

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# tracing filter directive, used when RUST_LOG is not set.
filter = "imgvault=info"
"##
}
