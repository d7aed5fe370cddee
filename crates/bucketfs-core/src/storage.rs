use bucketfs_store::{ObjectClient, ObjectMeta};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::file::{OpenMode, StorageFile};
use crate::paths::normalize;

/// Filesystem view over an object store client.
///
/// Every method normalizes its path argument before touching the client.
/// Operations are synchronous sequences of client calls; nothing is cached
/// between calls and no locks are held across them.
#[derive(Debug)]
pub struct Storage<C: ObjectClient> {
    client: C,
    config: FsConfig,
}

impl<C: ObjectClient> Storage<C> {
    /// Wrap `client` with the default configuration.
    pub fn new(client: C) -> Self {
        Self::with_config(client, FsConfig::default())
    }

    /// Wrap `client` with an explicit configuration.
    pub fn with_config(client: C, config: FsConfig) -> Self {
        Self { client, config }
    }

    /// The underlying object store client.
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// Open a handle on `name`. No store access happens here.
    pub fn open(&self, name: &str, mode: OpenMode) -> StorageFile<'_, C> {
        StorageFile::new(self, normalize(name), mode)
    }

    /// Store `content` under `name`, replacing any existing object.
    ///
    /// Returns the key the content was stored under.
    pub fn save(&self, name: &str, content: &[u8]) -> FsResult<String> {
        let key = normalize(name);
        self.put(&key, Bytes::copy_from_slice(content))?;
        Ok(key)
    }

    /// Delete the object at `name`. Returns `true` if it existed.
    pub fn delete(&self, name: &str) -> FsResult<bool> {
        let key = normalize(name);
        let existed = self.client.delete_object(&key)?;
        debug!(key = %key, existed, "deleted object");
        Ok(existed)
    }

    /// Metadata of the object at `name`; [`FsError::NotFound`] if absent.
    pub fn stat(&self, name: &str) -> FsResult<ObjectMeta> {
        self.stat_required(&normalize(name))
    }

    /// Size in bytes of the object at `name`.
    pub fn size(&self, name: &str) -> FsResult<u64> {
        Ok(self.stat(name)?.size)
    }

    /// Last modification time of the object at `name`.
    pub fn modified_time(&self, name: &str) -> FsResult<DateTime<Utc>> {
        Ok(self.stat(name)?.last_modified)
    }

    /// Public URL for `name`, as generated by the store.
    pub fn url(&self, name: &str) -> String {
        self.client.generate_url(&normalize(name))
    }

    /// Content type recorded for files saved under `key`.
    pub fn content_type_for(&self, key: &str) -> String {
        mime_guess::from_path(key)
            .first()
            .map_or_else(|| self.config.default_content_type.clone(), |mime| mime.to_string())
    }

    pub(crate) fn put(&self, key: &str, data: Bytes) -> FsResult<()> {
        let content_type = self.content_type_for(key);
        let size = data.len();
        self.client.put_object(key, data, Some(&content_type))?;
        debug!(key, size, content_type = %content_type, "stored object");
        Ok(())
    }

    pub(crate) fn stat_required(&self, key: &str) -> FsResult<ObjectMeta> {
        self.client
            .stat_object(key)?
            .ok_or_else(|| FsError::NotFound {
                path: key.to_string(),
            })
    }
}
