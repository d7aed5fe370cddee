use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Chunk size used for streamed reads when the caller has no preference.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A lazy sequence of byte chunks produced by [`crate::ObjectClient::get_chunks`].
///
/// Each item is one chunk of at most the requested chunk size. A failing
/// pull yields `Err` and the caller decides whether to continue.
pub type ChunkStream = Box<dyn Iterator<Item = StoreResult<Bytes>> + Send>;

/// Metadata reported by `stat_object`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// The object's key.
    pub key: String,
    /// Payload length in bytes.
    pub size: u64,
    /// MIME type recorded at put time. Directory markers carry none.
    pub content_type: Option<String>,
    /// Time of the last full write.
    pub last_modified: DateTime<Utc>,
}

/// One entry of a prefix listing.
///
/// In a delimited listing, keys nested deeper than the delimiter are
/// collapsed into a single common-prefix entry whose key ends with the
/// delimiter and whose `content_type` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedObject {
    pub key: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl ListedObject {
    /// Create a listing entry for a stored object.
    pub fn new(key: impl Into<String>, content_type: Option<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            content_type,
            size,
        }
    }

    /// Create a common-prefix entry (a "directory" in a delimited listing).
    pub fn common_prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content_type: None,
            size: 0,
        }
    }

    /// Returns `true` if the entry carries a content type.
    pub fn has_content_type(&self) -> bool {
        self.content_type.is_some()
    }
}

impl From<&ObjectMeta> for ListedObject {
    fn from(meta: &ObjectMeta) -> Self {
        Self::new(meta.key.clone(), meta.content_type.clone(), meta.size)
    }
}

/// Split an in-memory payload into a lazy chunk stream.
///
/// `Bytes::slice` shares the underlying buffer, so no chunk is copied. An
/// empty payload yields no chunks. A zero chunk size is treated as one byte.
pub fn chunk_bytes(data: Bytes, chunk_size: usize) -> ChunkStream {
    let chunk_size = chunk_size.max(1);
    let len = data.len();
    Box::new((0..len).step_by(chunk_size).map(move |start| {
        let end = (start + chunk_size).min(len);
        Ok(data.slice(start..end))
    }))
}

/// Collapse a sorted recursive listing into the immediate children of `prefix`.
///
/// Entries whose remainder after `prefix` contains `delimiter` become one
/// common-prefix entry each (`prefix + first_segment + delimiter`). Input
/// order is preserved and duplicate prefixes are emitted once.
pub fn collapse_delimited(
    prefix: &str,
    delimiter: char,
    entries: impl IntoIterator<Item = ListedObject>,
) -> Vec<ListedObject> {
    let mut out: Vec<ListedObject> = Vec::new();
    let mut last_prefix: Option<String> = None;

    for entry in entries {
        let Some(rest) = entry.key.strip_prefix(prefix) else {
            continue;
        };
        match rest.find(delimiter) {
            Some(idx) => {
                let common = format!("{prefix}{}", &rest[..idx + delimiter.len_utf8()]);
                if last_prefix.as_deref() != Some(common.as_str()) {
                    out.push(ListedObject::common_prefix(common.clone()));
                    last_prefix = Some(common);
                }
            }
            None => out.push(entry),
        }
    }
    out
}
