//! Object storage for uploaded artifacts.
//!
//! The pipeline only ever talks to an [`ArtifactStore`]: put, exists, list,
//! and URL construction, plus an optional recorded content type. Anything that can honor those four operations can
//! back an upload, whether it is an S3 bucket, a directory, or a map.
//!
//! | Store | Backing | Typical use |
//! |---|---|---|
//! | [`DirectoryStore`] | files under a root directory | CLI, local deployments |
//! | [`MemoryStore`] | `Mutex<BTreeMap>` | tests, embedding |
//!
//! Stores are shared by every in-flight upload, so implementations must be
//! `Send + Sync` and must not keep request-scoped state.

mod directory;
mod memory;
mod url;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;
pub use url::PublicUrl;

use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid key {0:?}")]
    InvalidKey(String),
    #[error("store metadata error: {0}")]
    Metadata(String),
}

/// Receipt for a committed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    /// Hex SHA-256 of the payload.
    pub etag: String,
}

impl StoredObject {
    pub fn for_payload(key: &str, bytes: &[u8]) -> Self {
        Self {
            key: key.to_string(),
            size: bytes.len() as u64,
            etag: content_etag(bytes),
        }
    }
}

/// Hex SHA-256 digest used as the entity tag of a stored payload.
pub fn content_etag(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Durable key/value store for artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str)
    -> Result<StoredObject, StoreError>;

    /// Whether an object exists under `key`. Does not fetch content.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Every key currently stored. Order is unspecified.
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Content type recorded by `put` for `key`, when the store keeps one.
    fn content_type(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    /// Public URL for `key`. Pure; performs no I/O and cannot fail.
    fn url_for(&self, key: &str) -> String;
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for &T {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StoreError> {
        (**self).put(key, bytes, content_type)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_keys()
    }

    fn content_type(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).content_type(key)
    }

    fn url_for(&self, key: &str) -> String {
        (**self).url_for(key)
    }
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for Arc<T> {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StoreError> {
        (**self).put(key, bytes, content_type)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_keys()
    }

    fn content_type(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).content_type(key)
    }

    fn url_for(&self, key: &str) -> String {
        (**self).url_for(key)
    }
}

impl ArtifactStore for Box<dyn ArtifactStore> {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StoreError> {
        (**self).put(key, bytes, content_type)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_keys()
    }

    fn content_type(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).content_type(key)
    }

    fn url_for(&self, key: &str) -> String {
        (**self).url_for(key)
    }
}

/// Reject keys that could escape a directory root or are otherwise unusable.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
