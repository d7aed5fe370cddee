//! Directory emulation over prefix listings.
//!
//! A directory is never stored. It is derived on every call from the keys
//! that share its prefix, so the directory view and the stored objects can
//! never disagree. An empty marker object (`<dir>/.folder`) keeps an
//! otherwise memberless directory discoverable.

use bucketfs_store::ObjectClient;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FsResult;
use crate::paths::{dir_key, dir_prefix, is_marker_name, marker_key, normalize, SEPARATOR};
use crate::storage::Storage;

/// Immediate children of a directory, partitioned by kind.
///
/// Names are relative to the listed directory and sorted. Markers are
/// never included.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl Listing {
    /// Returns `true` if the directory has no visible children.
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

impl<C: ObjectClient> Storage<C> {
    /// Whether `path` names a file or a directory.
    ///
    /// The root always exists. A directory exists while any key, including
    /// its marker, lies under its prefix.
    pub fn exists(&self, path: &str) -> FsResult<bool> {
        let key = normalize(path);
        if dir_key(&key).is_empty() {
            return Ok(true);
        }
        if self.client().stat_object(&key)?.is_some() {
            return Ok(true);
        }
        Ok(self.client().has_prefix(&dir_prefix(&key))?)
    }

    /// Whether an object is stored at exactly `path`.
    ///
    /// A missing object yields `false`; other store failures propagate.
    pub fn is_file(&self, path: &str) -> FsResult<bool> {
        let key = normalize(path);
        Ok(self.client().stat_object(&key)?.is_some())
    }

    /// Whether `path` names a directory: the root, or a non-file with at
    /// least one key under its prefix.
    pub fn is_dir(&self, path: &str) -> FsResult<bool> {
        let key = normalize(path);
        if dir_key(&key).is_empty() {
            return Ok(true);
        }
        if self.client().stat_object(&key)?.is_some() {
            return Ok(false);
        }
        Ok(self.client().has_prefix(&dir_prefix(&key))?)
    }

    /// Write the marker object for `path`.
    ///
    /// Idempotent, and harmless when the directory already has members.
    /// The root needs no marker.
    pub fn make_directory(&self, path: &str) -> FsResult<()> {
        let key = normalize(path);
        if dir_key(&key).is_empty() {
            return Ok(());
        }
        let marker = marker_key(&key);
        self.client().put_object(&marker, Bytes::new(), None)?;
        debug!(marker = %marker, "wrote directory marker");
        Ok(())
    }

    /// List the immediate children of the directory `path`.
    ///
    /// Entries with a content type are files; entries without one are
    /// subdirectories. Listing a missing directory yields an empty listing.
    pub fn list_directory(&self, path: &str) -> FsResult<Listing> {
        let prefix = dir_prefix(&normalize(path));
        let entries = self.client().list_delimited(&prefix, SEPARATOR)?;

        let mut listing = Listing::default();
        for entry in entries {
            let Some(rel) = entry.key.strip_prefix(&prefix) else {
                continue;
            };
            let name = rel.trim_end_matches(SEPARATOR);
            if name.is_empty() || is_marker_name(name) {
                continue;
            }
            if entry.has_content_type() {
                listing.files.push(name.to_string());
            } else {
                listing.directories.push(name.to_string());
            }
        }
        listing.directories.sort();
        listing.directories.dedup();
        listing.files.sort();
        Ok(listing)
    }

    /// Delete every object under the directory `path`, marker included.
    ///
    /// Returns the number of objects deleted. Not transactional: if a delete
    /// fails, the objects already removed stay removed and the error is
    /// returned.
    pub fn remove_tree(&self, path: &str) -> FsResult<usize> {
        let prefix = dir_prefix(&normalize(path));
        let entries = self.client().list_objects(&prefix)?;
        let total = entries.len();

        let mut deleted = 0;
        for entry in &entries {
            if let Err(e) = self.client().delete_object(&entry.key) {
                warn!(
                    prefix = %prefix,
                    deleted,
                    total,
                    failed_key = %entry.key,
                    error = %e,
                    "tree removal stopped partway"
                );
                return Err(e.into());
            }
            deleted += 1;
        }
        info!(prefix = %prefix, deleted, "removed tree");
        Ok(deleted)
    }
}
