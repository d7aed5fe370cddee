use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{chunk_bytes, ChunkStream, ListedObject, ObjectMeta};
use crate::traits::ObjectClient;

const DEFAULT_BASE_URL: &str = "memory://bucket";

#[derive(Clone, Debug)]
struct StoredEntry {
    data: Bytes,
    meta: ObjectMeta,
}

/// In-memory, `BTreeMap`-based object bucket.
///
/// Intended for tests and embedding. Objects live behind a `RwLock`; reads
/// hand out `Bytes` clones, so a chunk stream never holds the lock.
pub struct InMemoryObjectClient {
    objects: RwLock<BTreeMap<String, StoredEntry>>,
    base_url: String,
}

impl InMemoryObjectClient {
    /// Create a new empty bucket.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new empty bucket whose URLs start with `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|entry| entry.meta.size)
            .sum()
    }

    /// Remove all objects from the bucket.
    pub fn clear(&self) {
        self.objects.write().expect("lock poisoned").clear();
    }

    /// Return every key in the bucket, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for InMemoryObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectClient for InMemoryObjectClient {
    fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StoreResult<()> {
        let meta = ObjectMeta {
            key: key.to_string(),
            size: data.len() as u64,
            content_type: content_type.map(str::to_string),
            last_modified: Utc::now(),
        };
        debug!(key, size = meta.size, "memory put");
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(key.to_string(), StoredEntry { data, meta });
        Ok(())
    }

    fn get_chunks(&self, key: &str, chunk_size: usize) -> StoreResult<ChunkStream> {
        let map = self.objects.read().expect("lock poisoned");
        let entry = map.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        Ok(chunk_bytes(entry.data.clone(), chunk_size))
    }

    fn delete_object(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.objects.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn stat_object(&self, key: &str) -> StoreResult<Option<ObjectMeta>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(key).map(|entry| entry.meta.clone()))
    }

    fn list_objects(&self, prefix: &str) -> StoreResult<Vec<ListedObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, entry)| ListedObject::from(&entry.meta))
            .collect())
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn has_prefix(&self, prefix: &str) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .next()
            .is_some_and(|(key, _)| key.starts_with(prefix)))
    }

    fn copy_object(&self, from: &str, to: &str) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        let source = map.get(from).cloned().ok_or_else(|| StoreError::NotFound {
            key: from.to_string(),
        })?;
        let meta = ObjectMeta {
            key: to.to_string(),
            last_modified: Utc::now(),
            ..source.meta
        };
        map.insert(
            to.to_string(),
            StoredEntry {
                data: source.data,
                meta,
            },
        );
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectClient")
            .field("object_count", &count)
            .field("base_url", &self.base_url)
            .finish()
    }
}
