//! Error types for cart persistence.

use crate::formats::FormatError;
use thiserror::Error;

/// Failure reading or writing a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),
}

/// Failure from a [`crate::CartStore`] operation.
///
/// The in-memory mutation has already happened when this is returned;
/// only persisting it failed.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
}
