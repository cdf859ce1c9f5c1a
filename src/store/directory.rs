//! Filesystem-backed object store.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── photo_1234567890.jpg
//! ├── photo_800x600_1234567890.jpg
//! └── .imgvault/
//!     └── content-types.json     # key → MIME type
//! ```
//!
//! Objects are written to a temp file beside their final path and renamed
//! into place, so a reader never sees a partial object. The content-type
//! index is rewritten under a mutex after each successful object write.
//!
//! The index is advisory. Once an object is renamed into place the `put` has
//! succeeded; a failed index update is logged and the object reports no
//! recorded type. An index that no longer parses is discarded and rebuilt
//! from subsequent writes.

use super::{ArtifactStore, PublicUrl, StoreError, StoredObject, validate_key};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;
use walkdir::WalkDir;

/// Directory holding store metadata. Never listed as a key.
const META_DIR: &str = ".imgvault";
const CONTENT_TYPES_FILE: &str = "content-types.json";
const TEMP_PREFIX: &str = ".imgvault-tmp-";

/// Keys inside the metadata directory belong to the store itself.
fn is_reserved(key: &str) -> bool {
    key.split('/').next() == Some(META_DIR)
}

pub struct DirectoryStore {
    root: PathBuf,
    urls: PublicUrl,
    index_lock: Mutex<()>,
    temp_counter: AtomicU64,
}

impl DirectoryStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, urls: PublicUrl) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(META_DIR)).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self {
            root,
            urls,
            index_lock: Mutex::new(()),
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(META_DIR).join(CONTENT_TYPES_FILE)
    }

    fn load_index(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let path = self.index_path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    key: CONTENT_TYPES_FILE.to_string(),
                    source,
                });
            }
        };
        match serde_json::from_str(&content) {
            Ok(index) => Ok(index),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable content-type index");
                Ok(BTreeMap::new())
            }
        }
    }

    fn record_content_type(&self, key: &str, content_type: &str) -> Result<(), StoreError> {
        let _guard = self
            .index_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut index = self.load_index()?;
        index.insert(key.to_string(), content_type.to_string());
        let json =
            serde_json::to_vec_pretty(&index).map_err(|e| StoreError::Metadata(e.to_string()))?;
        self.write_atomically(&self.index_path(), &json, CONTENT_TYPES_FILE)
    }

    fn write_atomically(&self, target: &Path, bytes: &[u8], key: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        let dir = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(io_err)?;

        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let temp = dir.join(format!("{TEMP_PREFIX}{}-{n}", std::process::id()));
        fs::write(&temp, bytes).map_err(io_err)?;
        fs::rename(&temp, target).map_err(|source| {
            let _ = fs::remove_file(&temp);
            io_err(source)
        })
    }
}

impl ArtifactStore for DirectoryStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StoreError> {
        validate_key(key)?;
        if is_reserved(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.write_atomically(&self.root.join(key), bytes, key)?;
        if let Err(e) = self.record_content_type(key, content_type) {
            warn!(key = %key, error = %e, "object stored without a recorded content type");
        }
        Ok(StoredObject::for_payload(key, bytes))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        // Nothing can be stored under a key that fails validation.
        if validate_key(key).is_err() || is_reserved(key) {
            return Ok(false);
        }
        Ok(self.root.join(key).is_file())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.depth() != 1 || e.file_name() != META_DIR);
        for entry in walker {
            let entry = entry.map_err(|e| StoreError::Metadata(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            keys.push(key.join("/"));
        }
        keys.sort();
        Ok(keys)
    }

    fn content_type(&self, key: &str) -> Result<Option<String>, StoreError> {
        if validate_key(key).is_err() || is_reserved(key) {
            return Ok(None);
        }
        let _guard = self
            .index_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.load_index()?.remove(key))
    }

    fn url_for(&self, key: &str) -> String {
        self.urls.url_for(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> DirectoryStore {
        DirectoryStore::open(tmp.path().join("bucket"), PublicUrl::default()).unwrap()
    }

    #[test]
    fn put_writes_file_and_content_type() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        let receipt = store.put("photo_1.jpg", b"jpegdata", "image/jpeg").unwrap();
        assert_eq!(receipt.size, 8);
        assert_eq!(
            fs::read(store.root().join("photo_1.jpg")).unwrap(),
            b"jpegdata"
        );
        assert_eq!(
            store.content_type("photo_1.jpg").unwrap().as_deref(),
            Some("image/jpeg")
        );
    }

    #[test]
    fn put_overwrites_existing() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        store.put("k.png", b"one", "image/png").unwrap();
        store.put("k.png", b"two", "image/png").unwrap();
        assert_eq!(fs::read(store.root().join("k.png")).unwrap(), b"two");
        assert_eq!(store.list_keys().unwrap(), vec!["k.png"]);
    }

    #[test]
    fn nested_keys_round_trip_through_listing() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        store.put("2024/b.png", b"", "image/png").unwrap();
        store.put("a.png", b"", "image/png").unwrap();
        assert_eq!(store.list_keys().unwrap(), vec!["2024/b.png", "a.png"]);
    }

    #[test]
    fn listing_skips_metadata_and_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        store.put("a.png", b"", "image/png").unwrap();
        fs::write(store.root().join(".imgvault-tmp-1-0"), b"partial").unwrap();
        assert_eq!(store.list_keys().unwrap(), vec!["a.png"]);
    }

    #[test]
    fn exists_checks_files_only() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        store.put("dir/a.png", b"", "image/png").unwrap();
        assert!(store.exists("dir/a.png").unwrap());
        assert!(!store.exists("dir").unwrap());
        assert!(!store.exists("missing.png").unwrap());
        assert!(!store.exists("../escape.png").unwrap());
        assert!(!store.exists(".imgvault/content-types.json").unwrap());
    }

    #[test]
    fn invalid_key_is_rejected_without_writing() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        let result = store.put("../escape.png", b"x", "image/png");
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
        assert!(!tmp.path().join("escape.png").exists());
    }

    #[test]
    fn metadata_keys_are_reserved() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        assert!(matches!(
            store.put(".imgvault/content-types.json", b"{}", "application/json"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn reopen_sees_existing_objects() {
        let tmp = TempDir::new().unwrap();
        open(&tmp).put("a.png", b"1", "image/png").unwrap();
        let store = open(&tmp);
        assert!(store.exists("a.png").unwrap());
        assert_eq!(
            store.content_type("a.png").unwrap().as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn concurrent_puts_keep_every_content_type() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        std::thread::scope(|s| {
            for i in 0..8 {
                let store = &store;
                s.spawn(move || {
                    store
                        .put(&format!("img_{i}.png"), b"x", "image/png")
                        .unwrap();
                });
            }
        });
        assert_eq!(store.list_keys().unwrap().len(), 8);
        for i in 0..8 {
            assert!(store.content_type(&format!("img_{i}.png")).unwrap().is_some());
        }
    }

    #[test]
    fn corrupt_index_does_not_fail_puts() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        let index = store.root().join(META_DIR).join(CONTENT_TYPES_FILE);
        fs::write(&index, "{not json").unwrap();

        let receipt = store.put("p_1.jpg", b"jpeg", "image/jpeg").unwrap();
        assert_eq!(receipt.size, 4);
        store.put("q_1.png", b"png", "image/png").unwrap();

        // The index is rebuilt from the writes that followed.
        assert_eq!(
            store.content_type("p_1.jpg").unwrap().as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            store.content_type("q_1.png").unwrap().as_deref(),
            Some("image/png")
        );
        let parsed: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&index).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn unwritable_index_still_commits_object() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        // A directory where the index file should be makes every index write fail.
        let index = store.root().join(META_DIR).join(CONTENT_TYPES_FILE);
        fs::create_dir_all(index.join("blocker")).unwrap();

        let result = store.put("a_1.png", b"x", "image/png");
        assert!(result.is_ok());
        assert!(store.exists("a_1.png").unwrap());
        assert_eq!(store.list_keys().unwrap(), vec!["a_1.png"]);
    }

    #[test]
    fn content_type_of_unknown_or_invalid_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        assert_eq!(store.content_type("missing.png").unwrap(), None);
        assert_eq!(store.content_type("../x.png").unwrap(), None);
    }
}
