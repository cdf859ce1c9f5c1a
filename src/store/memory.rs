use super::{ArtifactStore, PublicUrl, StoreError, StoredObject, validate_key};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An object held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process store. Keys list in sorted order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    urls: PublicUrl,
    objects: Mutex<BTreeMap<String, MemoryObject>>,
    puts: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(urls: PublicUrl) -> Self {
        Self {
            urls,
            objects: Mutex::new(BTreeMap::new()),
            puts: Mutex::new(Vec::new()),
        }
    }

    /// Fetch a stored object.
    pub fn get(&self, key: &str) -> Option<MemoryObject> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    /// Every key passed to a successful `put`, in call order, repeats included.
    pub fn put_log(&self) -> Vec<String> {
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StoreError> {
        validate_key(key)?;
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                key.to_string(),
                MemoryObject {
                    bytes: bytes.to_vec(),
                    content_type: content_type.to_string(),
                },
            );
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(key.to_string());
        Ok(StoredObject::for_payload(key, bytes))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(key))
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect())
    }

    fn content_type(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key).map(|object| object.content_type))
    }

    fn url_for(&self, key: &str) -> String {
        self.urls.url_for(key)
    }
}
