//! Shared test utilities for the imgvault test suite.
//!
//! Provides synthetic image payloads and a store wrapper that fails on
//! selected keys, so pipeline tests can exercise partial-failure paths.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let store = FailingStore::new(MemoryStore::default()).fail_key("photo_400x300_1.jpg");
//! let bytes = jpeg_bytes(64, 48);
//! ```

use crate::store::{ArtifactStore, StoreError, StoredObject};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Mutex;

// =========================================================================
// Synthetic images
// =========================================================================

/// A gradient so encoders have real content to work with.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encoded JPEG bytes of a `width × height` gradient.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// Encoded PNG bytes of a `width × height` gradient with alpha.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let rgba = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// =========================================================================
// Stores
// =========================================================================

/// Wraps a store and rejects `put` for chosen keys (or every key).
pub struct FailingStore<S> {
    inner: S,
    failing: Mutex<HashSet<String>>,
    fail_all: bool,
    attempts: Mutex<Vec<String>>,
}

impl<S: ArtifactStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            fail_all: false,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_key(self, key: &str) -> Self {
        self.failing.lock().unwrap().insert(key.to_string());
        self
    }

    pub fn fail_everything(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Every key `put` was called with, including rejected ones.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ArtifactStore> ArtifactStore for FailingStore<S> {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StoreError> {
        self.attempts.lock().unwrap().push(key.to_string());
        if self.fail_all || self.failing.lock().unwrap().contains(key) {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::other("injected failure"),
            });
        }
        self.inner.put(key, bytes, content_type)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        if self.fail_all {
            return Err(StoreError::Metadata("injected failure".to_string()));
        }
        self.inner.exists(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_all {
            return Err(StoreError::Metadata("injected failure".to_string()));
        }
        self.inner.list_keys()
    }

    fn content_type(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_all {
            return Err(StoreError::Metadata("injected failure".to_string()));
        }
        self.inner.content_type(key)
    }

    fn url_for(&self, key: &str) -> String {
        self.inner.url_for(key)
    }
}
