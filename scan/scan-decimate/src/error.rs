//! Error types for mesh simplification.

use thiserror::Error;

/// Errors that can occur during simplification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecimateError {
    /// Target triangle count must be positive.
    #[error("Invalid target triangle count: {0}")]
    InvalidTargetCount(usize),
}

/// Result type for simplification operations.
pub type DecimateResult<T> = std::result::Result<T, DecimateError>;
