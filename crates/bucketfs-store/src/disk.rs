//! Bucket persisted as flat files in a local directory.
//!
//! Every object is two files in `<root>/<bucket>/objects/`, both named by the
//! BLAKE3 hash of the key:
//!
//! - `<hash>.data` -- the raw payload
//! - `<hash>.meta` -- JSON-encoded [`ObjectMeta`] (carries the real key)
//!
//! Hashing keeps the layout flat, so keys like `a` and `a/b` never collide
//! the way they would if keys were mapped onto nested directories. The
//! metadata file is written last and is what makes an object visible.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::object::{ChunkStream, ListedObject, ObjectMeta};
use crate::traits::ObjectClient;

const OBJECTS_DIR: &str = "objects";
const DATA_EXT: &str = "data";
const META_EXT: &str = "meta";

/// Object bucket stored under a local directory.
#[derive(Debug)]
pub struct DiskObjectClient {
    objects_dir: PathBuf,
    base_url: String,
    read_only: bool,
}

impl DiskObjectClient {
    /// Open (or create) the bucket described by `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let bucket_dir = config.bucket_dir();
        let objects_dir = bucket_dir.join(OBJECTS_DIR);
        if !config.read_only {
            fs::create_dir_all(&objects_dir)?;
        }

        let base_url = match &config.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let abs = bucket_dir.canonicalize().unwrap_or(bucket_dir);
                format!("file://{}", abs.display())
            }
        };

        debug!(dir = %objects_dir.display(), read_only = config.read_only, "opened disk bucket");
        Ok(Self {
            objects_dir,
            base_url,
            read_only: config.read_only,
        })
    }

    /// Directory holding the object files.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn file_stem(key: &str) -> String {
        blake3::hash(key.as_bytes()).to_hex().to_string()
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.objects_dir
            .join(Self::file_stem(key))
            .with_extension(DATA_EXT)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.objects_dir
            .join(Self::file_stem(key))
            .with_extension(META_EXT)
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Write `bytes` to `dest` through a temp file in the same directory, so
    /// a reader never observes a half-written file.
    fn write_atomic(&self, dest: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.objects_dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn write_meta(&self, meta: &ObjectMeta) -> StoreResult<()> {
        let encoded =
            serde_json::to_vec(meta).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_atomic(&self.meta_path(&meta.key), &encoded)
    }

    /// Open the payload of `key`; a missing data file is `NotFound`.
    fn open_data(&self, key: &str) -> StoreResult<File> {
        File::open(self.data_path(key)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                key: key.to_string(),
            },
            _ => e.into(),
        })
    }

    fn read_meta_file(path: &Path) -> StoreResult<Option<ObjectMeta>> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
        Ok(Some(meta))
    }
}

/// Lazy chunk iterator over an open data file.
struct FileChunks {
    file: File,
    chunk_size: usize,
    done: bool,
}

impl Iterator for FileChunks {
    type Item = StoreResult<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = BytesMut::zeroed(self.chunk_size);
        let mut filled = 0;
        while filled < self.chunk_size {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        if filled < self.chunk_size {
            self.done = true;
        }
        if filled == 0 {
            return None;
        }
        buf.truncate(filled);
        Some(Ok(buf.freeze()))
    }
}

impl ObjectClient for DiskObjectClient {
    fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StoreResult<()> {
        self.ensure_writable()?;
        self.write_atomic(&self.data_path(key), &data)?;
        let meta = ObjectMeta {
            key: key.to_string(),
            size: data.len() as u64,
            content_type: content_type.map(str::to_string),
            last_modified: Utc::now(),
        };
        self.write_meta(&meta)?;
        debug!(key, size = meta.size, "disk put");
        Ok(())
    }

    fn get_chunks(&self, key: &str, chunk_size: usize) -> StoreResult<ChunkStream> {
        if Self::read_meta_file(&self.meta_path(key))?.is_none() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        let file = self.open_data(key)?;
        Ok(Box::new(FileChunks {
            file,
            chunk_size: chunk_size.max(1),
            done: false,
        }))
    }

    fn delete_object(&self, key: &str) -> StoreResult<bool> {
        self.ensure_writable()?;
        let existed = match fs::remove_file(self.meta_path(key)) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(self.data_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!(key, existed, "disk delete");
        Ok(existed)
    }

    fn stat_object(&self, key: &str) -> StoreResult<Option<ObjectMeta>> {
        Self::read_meta_file(&self.meta_path(key))
    }

    fn list_objects(&self, prefix: &str) -> StoreResult<Vec<ListedObject>> {
        let dir = match fs::read_dir(&self.objects_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in dir {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(META_EXT) {
                continue;
            }
            // The object may be deleted between read_dir and the read.
            let Some(meta) = Self::read_meta_file(&path)? else {
                continue;
            };
            if meta.key.starts_with(prefix) {
                out.push(ListedObject::from(&meta));
            }
        }
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn copy_object(&self, from: &str, to: &str) -> StoreResult<()> {
        self.ensure_writable()?;
        let source = Self::read_meta_file(&self.meta_path(from))?.ok_or_else(|| {
            StoreError::NotFound {
                key: from.to_string(),
            }
        })?;

        let mut tmp = NamedTempFile::new_in(&self.objects_dir)?;
        let mut src = self.open_data(from)?;
        let copied = io::copy(&mut src, tmp.as_file_mut())?;
        if copied != source.size {
            warn!(from, expected = source.size, copied, "size changed during copy");
        }
        tmp.persist(self.data_path(to))
            .map_err(|e| StoreError::Io(e.error))?;

        self.write_meta(&ObjectMeta {
            key: to.to_string(),
            size: copied,
            content_type: source.content_type,
            last_modified: Utc::now(),
        })?;
        debug!(from, to, size = copied, "disk copy");
        Ok(())
    }
}
