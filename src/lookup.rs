//! Read-side operations: look up one stored artifact, list them all.
//!
//! Lookup never reads object content. Dimensions come from the key itself
//! (see [`parse_variant_dimensions`]), so originals report `0×0`. The content
//! type is the one recorded at upload, which reflects the detected format;
//! the key's extension is only a fallback for stores that record none.

use crate::imaging::content_type_for_extension;
use crate::naming::parse_variant_dimensions;
use crate::store::{ArtifactStore, StoreError};
use crate::upload::ImageResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

/// URL and key-derived dimensions for `key`.
pub fn image_info<S: ArtifactStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<ImageResult, LookupError> {
    if !store.exists(key)? {
        return Err(LookupError::NotFound(key.to_string()));
    }
    let (width, height) = parse_variant_dimensions(key).unwrap_or((0, 0));
    Ok(ImageResult {
        width,
        height,
        url: store.url_for(key),
    })
}

/// A stored artifact with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDetails {
    pub key: String,
    pub image: ImageResult,
    pub content_type: String,
}

/// [`image_info`] plus the content type recorded for `key`.
pub fn image_details<S: ArtifactStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<ImageDetails, LookupError> {
    let image = image_info(store, key)?;
    let content_type = match store.content_type(key)? {
        Some(recorded) => recorded,
        None => content_type_for_extension(key).to_string(),
    };
    Ok(ImageDetails {
        key: key.to_string(),
        image,
        content_type,
    })
}

/// Every stored key, sorted.
pub fn list_images<S: ArtifactStore + ?Sized>(store: &S) -> Result<Vec<String>, StoreError> {
    let mut keys = store.list_keys()?;
    keys.sort();
    Ok(keys)
}
