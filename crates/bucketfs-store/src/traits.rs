use bytes::{Bytes, BytesMut};

use crate::error::{StoreError, StoreResult};
use crate::object::{collapse_delimited, ChunkStream, ListedObject, ObjectMeta, DEFAULT_CHUNK_SIZE};

/// Flat, key-addressed object store client.
///
/// All implementations must satisfy these invariants:
/// - Keys are opaque. The store never interprets `/` except in
///   [`list_delimited`](Self::list_delimited).
/// - `put_object` fully replaces any existing object at the key.
/// - `stat_object` maps an absent key to `Ok(None)`; `Err` means the store
///   itself failed.
/// - `list_objects` returns entries sorted by key.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectClient: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    ///
    /// `content_type` is recorded verbatim. Directory markers pass `None`.
    fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StoreResult<()>;

    /// Open a lazy chunked read of the object at `key`.
    ///
    /// Returns `Err(StoreError::NotFound)` if the object does not exist.
    /// Chunks are at most `chunk_size` bytes; no chunk is fetched until the
    /// stream is polled.
    fn get_chunks(&self, key: &str, chunk_size: usize) -> StoreResult<ChunkStream>;

    /// Delete the object at `key`. Returns `true` if the object existed.
    fn delete_object(&self, key: &str) -> StoreResult<bool>;

    /// Read the metadata of the object at `key`.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn stat_object(&self, key: &str) -> StoreResult<Option<ObjectMeta>>;

    /// List every object whose key starts with `prefix`, sorted by key.
    ///
    /// Pass `""` to list the whole bucket.
    fn list_objects(&self, prefix: &str) -> StoreResult<Vec<ListedObject>>;

    /// Public access URL for `key`. Pure pass-through, no existence check.
    fn generate_url(&self, key: &str) -> String;

    /// List the immediate children of `prefix`.
    ///
    /// Keys nested below the next `delimiter` are collapsed into one
    /// common-prefix entry with no content type. Default implementation
    /// collapses a full [`list_objects`](Self::list_objects) result.
    fn list_delimited(&self, prefix: &str, delimiter: char) -> StoreResult<Vec<ListedObject>> {
        let entries = self.list_objects(prefix)?;
        Ok(collapse_delimited(prefix, delimiter, entries))
    }

    /// Check whether any object key starts with `prefix`.
    ///
    /// Default implementation lists the prefix. Backends may override to
    /// stop at the first match.
    fn has_prefix(&self, prefix: &str) -> StoreResult<bool> {
        Ok(!self.list_objects(prefix)?.is_empty())
    }

    /// Read the whole object at `key` into memory.
    fn get_object(&self, key: &str) -> StoreResult<Bytes> {
        let mut buf = BytesMut::new();
        for chunk in self.get_chunks(key, DEFAULT_CHUNK_SIZE)? {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Copy the object at `from` to `to`, preserving its content type.
    ///
    /// Default implementation re-puts the full content. Backends with a
    /// native server-side copy should override this.
    fn copy_object(&self, from: &str, to: &str) -> StoreResult<()> {
        let meta = self.stat_object(from)?.ok_or_else(|| StoreError::NotFound {
            key: from.to_string(),
        })?;
        let data = self.get_object(from)?;
        self.put_object(to, data, meta.content_type.as_deref())
    }
}
