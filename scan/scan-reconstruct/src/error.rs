//! Error types for reconstruction.

use thiserror::Error;

/// Result type for reconstruction operations.
pub type ReconstructResult<T> = Result<T, ReconstructError>;

/// Errors from downsampling and surface reconstruction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconstructError {
    /// Voxel size must be finite and positive.
    #[error("invalid voxel size {0}: must be finite and > 0")]
    InvalidVoxelSize(f64),

    /// Alpha radius must be finite and positive.
    #[error("invalid alpha {0}: must be finite and > 0")]
    InvalidAlpha(f64),

    /// Not enough points to build a tetrahedron.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Number of points supplied.
        actual: usize,
    },

    /// The points do not span a volume.
    #[error("degenerate point set: {reason}")]
    Degenerate {
        /// What made the input degenerate.
        reason: String,
    },

    /// No tetrahedron passed the alpha test.
    #[error("alpha shape with alpha {alpha} has no surface")]
    NoSurface {
        /// Alpha used.
        alpha: f64,
    },
}

impl ReconstructError {
    /// Returns true for geometric failures that a caller can replace with an
    /// empty mesh. Parameter errors are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPoints { .. } | Self::Degenerate { .. } | Self::NoSurface { .. }
        )
    }
}
