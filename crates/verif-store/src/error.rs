//! Error types for the record store.

use thiserror::Error;

/// Errors raised while persisting or loading score records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Record encoding/decoding error.
    #[error("record format error: {0}")]
    Format(#[from] serde_json::Error),

    /// A loaded record belongs to a different verification key.
    #[error("record key mismatch: expected {expected}, found {found}")]
    KeyMismatch { expected: String, found: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
