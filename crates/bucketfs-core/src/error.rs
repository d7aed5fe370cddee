use std::io;

use bucketfs_store::StoreError;
use thiserror::Error;

/// Errors surfaced by filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path does not name an existing file or directory.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Move destination exists and overwrite was not allowed.
    #[error("destination '{path}' exists and overwrite is not allowed")]
    Conflict { path: String },

    /// The move cannot be carried out as requested.
    #[error("cannot move '{from}' to '{to}': {reason}")]
    InvalidMove {
        from: String,
        to: String,
        reason: String,
    },

    /// Unrecognized open-mode string.
    #[error("invalid open mode: {0:?}")]
    InvalidMode(String),

    /// The handle's mode does not permit the operation.
    #[error("file '{name}' was opened {mode}, cannot {op}")]
    HandleMode {
        name: String,
        mode: &'static str,
        op: &'static str,
    },

    /// Any other failure reported by the object store.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for FsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => Self::NotFound { path: key },
            other => Self::Store(other),
        }
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::NotFound { .. } => io::ErrorKind::NotFound,
            FsError::Conflict { .. } => io::ErrorKind::AlreadyExists,
            FsError::InvalidMode(_) | FsError::InvalidMove { .. } => io::ErrorKind::InvalidInput,
            FsError::HandleMode { .. } => io::ErrorKind::PermissionDenied,
            FsError::Store(StoreError::Io(inner)) => inner.kind(),
            FsError::Store(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Convenience type alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
