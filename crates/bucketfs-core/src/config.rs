use bucketfs_store::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Tuning for the filesystem layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Chunk size requested from the store for streamed reads.
    pub chunk_size: usize,
    /// Content type recorded when none can be guessed from the file name.
    pub default_content_type: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_content_type: "application/octet-stream".into(),
        }
    }
}
