use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Connection settings for a bucket.
///
/// Built once at startup and handed to the backend constructor; backends
/// never read settings from the environment on their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket name. Becomes a directory under `root` for the disk backend.
    pub bucket: String,
    /// Directory holding local buckets.
    pub root: PathBuf,
    /// Base of generated object URLs. Defaults to a `file://` URL of the
    /// bucket directory when unset.
    pub public_url: Option<String>,
    /// Reject every mutation with [`StoreError::ReadOnly`].
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: "default".into(),
            root: PathBuf::from(".bucketfs"),
            public_url: None,
            read_only: false,
        }
    }
}

impl StoreConfig {
    /// Configuration for `bucket` under `root`.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            root: root.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Directory holding this bucket's objects.
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Validate the bucket name: non-empty, one path component.
    pub fn validate(&self) -> StoreResult<()> {
        let bucket = self.bucket.as_str();
        let invalid = bucket.is_empty()
            || bucket == "."
            || bucket == ".."
            || bucket.contains(['/', '\\'])
            || Path::new(bucket).is_absolute();
        if invalid {
            return Err(StoreError::Backend(format!("invalid bucket name: {bucket:?}")));
        }
        Ok(())
    }
}
