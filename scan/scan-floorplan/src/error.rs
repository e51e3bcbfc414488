//! Error types for floor plan rasterization.

use thiserror::Error;

/// Result type for floor plan operations.
pub type FloorPlanResult<T> = Result<T, FloorPlanError>;

/// Errors that can occur while rasterizing a floor plan.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FloorPlanError {
    /// The canvas leaves no drawable area inside the margin.
    #[error("canvas {width}x{height} must be larger than twice the margin {margin}")]
    InvalidCanvas {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
        /// Margin in pixels.
        margin: u32,
    },
}
