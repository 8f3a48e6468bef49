//! Error types for storage operations.

use duastore_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored document could not be decoded or encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The store contents are corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The collection name cannot be used by this store.
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
