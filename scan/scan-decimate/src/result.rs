//! Result types for simplification operations.

// Triangle counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

use std::fmt;

use scan_types::TriangleMesh;

/// Result of mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimationResult {
    /// The decimated mesh.
    pub mesh: TriangleMesh,

    /// Number of triangles in original mesh.
    pub original_triangles: usize,

    /// Number of triangles in decimated mesh.
    pub final_triangles: usize,

    /// Number of edge collapses performed.
    pub collapses_performed: usize,

    /// Number of edge collapses rejected (non-manifold, flipped or over the
    /// error cap).
    pub collapses_rejected: usize,
}

impl DecimationResult {
    /// Get the reduction ratio (final / original).
    #[must_use]
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_triangles == 0 {
            1.0
        } else {
            self.final_triangles as f64 / self.original_triangles as f64
        }
    }

    /// Get the percentage of triangles removed.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        (1.0 - self.reduction_ratio()) * 100.0
    }

    /// Check if any decimation occurred.
    #[must_use]
    pub const fn was_decimated(&self) -> bool {
        self.collapses_performed > 0
    }
}

impl fmt::Display for DecimationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Decimation: {} → {} triangles ({:.1}% reduction, {} collapses)",
            self.original_triangles,
            self.final_triangles,
            self.reduction_percent(),
            self.collapses_performed
        )
    }
}

/// Result of Taubin smoothing.
#[derive(Debug, Clone)]
pub struct TaubinResult {
    /// The smoothed mesh, with fresh vertex normals.
    pub mesh: TriangleMesh,

    /// Number of iterations performed.
    pub iterations_performed: u32,

    /// Maximum single vertex displacement across all passes.
    pub max_displacement: f64,
}

impl fmt::Display for TaubinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Taubin: {} iterations, max displacement {:.3e}",
            self.iterations_performed, self.max_displacement
        )
    }
}

/// Result of [`simplify_mesh`](crate::simplify_mesh).
#[derive(Debug, Clone)]
pub struct SimplifyResult {
    /// The simplified mesh.
    pub mesh: TriangleMesh,

    /// Triangles before simplification.
    pub original_triangles: usize,

    /// Triangles after simplification.
    pub final_triangles: usize,

    /// Edge collapses performed.
    pub collapses_performed: usize,

    /// Smoothing iterations performed.
    pub smoothing_iterations: u32,
}

impl SimplifyResult {
    /// Returns true if the mesh was left untouched.
    #[must_use]
    pub const fn was_unchanged(&self) -> bool {
        self.collapses_performed == 0 && self.smoothing_iterations == 0
    }
}

impl fmt::Display for SimplifyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.was_unchanged() {
            write!(f, "Simplify: {} triangles, unchanged", self.original_triangles)
        } else {
            write!(
                f,
                "Simplify: {} → {} triangles, {} smoothing iterations",
                self.original_triangles, self.final_triangles, self.smoothing_iterations
            )
        }
    }
}
