//! Error types for verification sessions.

use thiserror::Error;
use verif_engine::EngineError;
use verif_store::StoreError;

use crate::provider::ProviderError;

/// Errors raised while orchestrating a verification run.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid variable configuration. Raised before any field is
    /// touched.
    #[error("invalid variable configuration: {0}")]
    Config(String),

    /// Scoring engine failure for one lead time.
    #[error("scoring error: {0}")]
    Engine(#[from] EngineError),

    /// Record persistence failure.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// The field provider could not supply a lead time.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
