//! Move/rename over a store with no native rename.
//!
//! A file move is a copy followed by a delete. A directory move runs in two
//! phases: copy every object to its rebased key, then delete every original.
//! Nothing spans keys atomically. If a step fails, the objects handled so far
//! stay where they are and the error is returned, so the caller may find
//! both trees partially populated.

use bucketfs_store::ObjectClient;
use tracing::{debug, info, warn};

use crate::error::{FsError, FsResult};
use crate::paths::{dir_key, dir_prefix, is_within, normalize, rebase};
use crate::storage::Storage;

impl<C: ObjectClient> Storage<C> {
    /// Move the file or directory at `old` to `new`.
    ///
    /// Fails with [`FsError::Conflict`] when `new` exists and
    /// `allow_overwrite` is false; nothing is touched in that case. With
    /// overwrite allowed, the destination file or tree is removed first.
    /// A destination that contains the source, or lies inside a source
    /// directory, is rejected with [`FsError::InvalidMove`].
    /// On success no object remains under `old`.
    pub fn move_path(&self, old: &str, new: &str, allow_overwrite: bool) -> FsResult<()> {
        let old_key = normalize(old);
        let new_key = normalize(new);

        let source_is_file = self.is_file(&old_key)?;
        let source_is_dir = !source_is_file && self.is_dir(&old_key)?;
        if !source_is_file && !source_is_dir {
            return Err(FsError::NotFound { path: old_key });
        }
        if dir_key(&old_key) == dir_key(&new_key) {
            return Ok(());
        }
        if dir_key(&old_key).is_empty() {
            return Err(FsError::InvalidMove {
                from: old_key,
                to: new_key,
                reason: "the root directory cannot be moved".into(),
            });
        }
        if dir_key(&new_key).is_empty() {
            return Err(FsError::InvalidMove {
                from: old_key,
                to: new_key,
                reason: "the root directory cannot be replaced".into(),
            });
        }
        if source_is_dir && is_within(&new_key, &old_key) {
            return Err(FsError::InvalidMove {
                from: old_key,
                to: new_key,
                reason: "destination lies inside the source directory".into(),
            });
        }
        // Clearing an ancestor of the source would delete the source itself.
        if is_within(&old_key, &new_key) {
            return Err(FsError::InvalidMove {
                from: old_key,
                to: new_key,
                reason: "destination is an ancestor of the source".into(),
            });
        }

        if self.exists(&new_key)? {
            if !allow_overwrite {
                return Err(FsError::Conflict { path: new_key });
            }
            self.clear_destination(&new_key)?;
        }

        if source_is_dir {
            self.move_tree(&old_key, &new_key)
        } else {
            self.move_file(&old_key, &new_key)
        }
    }

    /// Remove whatever lives at `key`: the object itself and, when the key
    /// is also a directory, every member under it.
    fn clear_destination(&self, key: &str) -> FsResult<()> {
        if self.is_file(key)? {
            self.client().delete_object(key)?;
            debug!(key, "removed overwritten file");
        }
        if self.client().has_prefix(&dir_prefix(key))? {
            let removed = self.remove_tree(key)?;
            debug!(key, removed, "removed overwritten tree");
        }
        Ok(())
    }

    fn move_file(&self, old_key: &str, new_key: &str) -> FsResult<()> {
        self.client().copy_object(old_key, new_key)?;
        if let Err(e) = self.client().delete_object(old_key) {
            warn!(from = old_key, to = new_key, error = %e, "copied file but source delete failed");
            return Err(e.into());
        }
        debug!(from = old_key, to = new_key, "moved file");
        Ok(())
    }

    fn move_tree(&self, old_key: &str, new_key: &str) -> FsResult<()> {
        let old_prefix = dir_prefix(old_key);
        let new_prefix = dir_prefix(new_key);

        self.make_directory(new_key)?;
        let entries = self.client().list_objects(&old_prefix)?;
        let total = entries.len();

        // Phase one: copy everything.
        for (copied, entry) in entries.iter().enumerate() {
            let Some(target) = rebase(&entry.key, &old_prefix, &new_prefix) else {
                continue;
            };
            if let Err(e) = self.client().copy_object(&entry.key, &target) {
                warn!(
                    from = %old_prefix,
                    to = %new_prefix,
                    copied,
                    total,
                    failed_key = %entry.key,
                    error = %e,
                    "tree move failed during copy; source untouched"
                );
                return Err(e.into());
            }
        }

        // Phase two: delete the originals that were copied.
        for (deleted, entry) in entries.iter().enumerate() {
            if let Err(e) = self.client().delete_object(&entry.key) {
                warn!(
                    from = %old_prefix,
                    to = %new_prefix,
                    deleted,
                    total,
                    failed_key = %entry.key,
                    error = %e,
                    "tree move failed during delete; both trees populated"
                );
                return Err(e.into());
            }
        }

        info!(from = %old_prefix, to = %new_prefix, objects = total, "moved tree");
        Ok(())
    }
}
