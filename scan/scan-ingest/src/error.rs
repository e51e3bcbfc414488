//! Error types for ingestion.

use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that end ingestion of a stream.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream held no valid records.
    #[error("no valid point records in input")]
    EmptyCloud,

    /// Chunk size must be positive.
    #[error("invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),
}

/// A single line that could not be parsed as a point record.
///
/// These are reported and skipped; they never abort ingestion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct RecordParseError {
    /// 1-based line number in the stream.
    pub line: usize,
    /// What was wrong with the line.
    pub reason: String,
}

impl RecordParseError {
    pub(crate) fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}
