//! Error types shared by the spatial-verif crates.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by the shared value types.
#[derive(Debug, Error)]
pub enum CommonError {
    /// Grid construction with inconsistent dimensions.
    #[error("grid size mismatch: {width}x{height} grid needs {expected} values, got {actual}")]
    GridSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Coordinate arrays that do not match the grid shape.
    #[error("coordinate array size mismatch: expected {expected} values, got {actual}")]
    CoordSizeMismatch { expected: usize, actual: usize },

    /// Malformed init-time string.
    #[error("invalid init time '{0}': expected YYYYMMDDHH")]
    InvalidInitTime(String),
}
