//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The message is not valid JSON or does not match the expected shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
