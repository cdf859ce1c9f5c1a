//! # imgvault
//!
//! Accepts an uploaded JPEG or PNG, produces resized variants of it, and
//! persists the original plus every variant to an object store, returning a
//! public URL and pixel dimensions for each.
//!
//! # Pipeline
//!
//! ```text
//! bytes ──decode──▶ raster ──put original──▶ OriginalStored
//!                     │
//!                     └─ for each size: resize ─▶ encode ─▶ put ─▶ VariantOutcome
//! ```
//!
//! One request derives every key from a single timestamp, stores the original
//! untouched, and then attempts each variant in request order. A variant that
//! fails is dropped from the response while the upload still succeeds; only a
//! decode failure or a failed original write fails the request.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`upload`] | The orchestrator: [`upload::Uploader`], result types, events, partial-failure policy |
//! | [`imaging`] | Decode, Lanczos3 resize, JPEG/PNG encode behind the [`imaging::ImageBackend`] trait |
//! | [`naming`] | Storage key derivation and the injectable [`naming::Clock`] |
//! | [`store`] | [`store::ArtifactStore`] trait, directory and in-memory stores, public URLs |
//! | [`lookup`] | Look up one key, list all keys |
//! | [`request`] | Pre-flight validation: extension gate, size cap, variant size parsing |
//! | [`config`] | `imgvault.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Same format in, same format out
//!
//! Variants are encoded in the format detected from the upload's bytes. JPEG
//! variants use quality 85 by default; PNG variants are lossless. The set of
//! formats is a closed enum, so encoder choice and content type come from one
//! `match`.
//!
//! ## Narrow store contract
//!
//! The pipeline needs only `put`, `exists`, `list_keys`, and `url_for`. URLs are
//! computed from configuration, never fetched, so an S3 adapter, a directory,
//! and a map are interchangeable.
//!
//! ## Pure-Rust imaging
//!
//! Decoding, resampling, and encoding all use the `image` crate. No system
//! libraries are required.

pub mod config;
pub mod imaging;
pub mod lookup;
pub mod naming;
pub mod output;
pub mod request;
pub mod store;
pub mod upload;

pub use upload::{ImageResult, UploadError, UploadResult, Uploader};

#[cfg(test)]
pub(crate) mod test_helpers;
