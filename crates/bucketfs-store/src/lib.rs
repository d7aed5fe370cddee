//! Flat, key-addressed object storage for bucketfs.
//!
//! This crate defines the contract the filesystem emulation layer consumes:
//! a bucket of objects addressed by opaque string keys, with no native
//! directory concept. Keys are compared byte-for-byte; `/` has no meaning to
//! the store beyond what [`ObjectClient::list_delimited`] gives it.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectClient`] trait:
//!
//! - [`InMemoryObjectClient`] -- `BTreeMap`-based bucket for tests and embedding
//! - [`DiskObjectClient`] -- bucket persisted as flat files in a local directory
//!
//! # Design Rules
//!
//! 1. Objects are replaced only by full overwrite; there is no partial update.
//! 2. `stat_object` reports a missing key as `Ok(None)`, never as an error.
//! 3. Reads are chunked and lazy: `get_chunks` never materializes the object.
//! 4. Listings are sorted by key.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod disk;
pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use disk::DiskObjectClient;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectClient;
pub use object::{ChunkStream, ListedObject, ObjectMeta, DEFAULT_CHUNK_SIZE};
pub use traits::ObjectClient;
