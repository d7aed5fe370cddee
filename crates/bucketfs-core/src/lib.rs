//! Hierarchical filesystem emulation over a flat object store.
//!
//! The store behind an [`ObjectClient`] knows only keys. This crate layers
//! files, directories, moves, streaming reads and buffered writes on top of
//! the five store primitives (put, chunked get, delete, stat, prefix list).
//!
//! # Architecture
//!
//! - **Paths** are normalized into keys by stripping leading `/`. A directory
//!   is the set of keys under `"<dir>/"`, never a stored entity.
//! - **Markers** (`<dir>/.folder`, no content type) keep empty directories
//!   discoverable. They never appear in listings.
//! - **Moves** copy every object and then delete the originals. There is no
//!   atomicity across keys; a failure leaves a partially moved tree.
//! - **Handles** stream reads through a [`ChunkReader`] and buffer writes
//!   until [`StorageFile::close`].
//!
//! # Modules
//!
//! - [`paths`] -- key normalization and prefix arithmetic
//! - [`reader`] -- pull-based buffer over a chunk stream
//! - [`storage`] -- the [`Storage`] facade
//! - [`directory`] -- existence checks, listings, markers, tree removal
//! - [`mover`] -- move/rename engine
//! - [`file`] -- [`StorageFile`] handles and [`OpenMode`]
//! - [`config`] -- [`FsConfig`]
//! - [`error`] -- [`FsError`]

pub mod config;
pub mod directory;
pub mod error;
pub mod file;
pub mod mover;
pub mod paths;
pub mod reader;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::FsConfig;
pub use directory::Listing;
pub use error::{FsError, FsResult};
pub use file::{OpenMode, StorageFile};
pub use paths::{normalize, MARKER_NAME};
pub use reader::ChunkReader;
pub use storage::Storage;

// Re-export the store contract so callers need only this crate.
pub use bucketfs_store::{ObjectClient, ObjectMeta, StoreError};
