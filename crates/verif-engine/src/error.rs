//! Error types for the scoring engine.

use thiserror::Error;

/// Errors raised by the scoring functions.
///
/// Degenerate but legitimate outcomes (zero detected objects, zero
/// exceedance in FSS) are expressed as NaN score values, never as errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The field has no finite pixels, so thresholds and means are
    /// undefined.
    #[error("field has no valid pixels")]
    NoValidPixels,

    /// Prediction and observation shapes differ.
    #[error("field shape mismatch: prediction {pred:?}, observation {obs:?}")]
    ShapeMismatch {
        pred: (usize, usize),
        obs: (usize, usize),
    },

    /// Invalid detection parameter combination.
    #[error("invalid detection parameters: {0}")]
    InvalidParameters(String),

    /// Invalid score request (empty threshold or scale list, zero-width
    /// window).
    #[error("invalid score request: {0}")]
    InvalidRequest(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
