//! Error types for the core crate.

use duastore_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the upsert engine, delta feed and gate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The document store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The collection name is not one of the managed collections.
    #[error("unknown collection: {0:?}")]
    UnknownCollection(String),

    /// A batch exceeded the configured size limit.
    #[error("batch too large: {len} records, limit {max}")]
    BatchTooLarge {
        /// Number of records submitted.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// An incoming record cannot be accepted.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl CoreError {
    /// Returns true if the caller sent something unacceptable, as opposed to
    /// the store failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownCollection(_)
                | CoreError::BatchTooLarge { .. }
                | CoreError::InvalidRecord(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(CoreError::UnknownCollection("users".into()).is_client_error());
        assert!(CoreError::InvalidRecord("id".into()).is_client_error());
        assert!(
            !CoreError::Storage(StorageError::Unavailable("down".into())).is_client_error()
        );
    }

    #[test]
    fn error_display() {
        let err = CoreError::BatchTooLarge { len: 600, max: 500 };
        let msg = err.to_string();
        assert!(msg.contains("600"));
        assert!(msg.contains("500"));
    }
}
