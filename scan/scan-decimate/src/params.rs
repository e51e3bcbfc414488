//! Parameters for decimation, smoothing and the combined simplifier.

use std::f64::consts::FRAC_PI_6;

/// Parameters for mesh decimation.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimateParams {
    /// Target number of triangles. If None, uses `target_ratio` instead.
    pub target_triangles: Option<usize>,

    /// Target ratio of triangles to keep (0.0 to 1.0). Default: 0.5
    pub target_ratio: f64,

    /// Whether to keep boundary vertices (on an edge with only one adjacent
    /// face) in place. Edges joining two boundary vertices never collapse.
    /// Default: false
    pub preserve_boundary: bool,

    /// Whether to preserve sharp features (edges with high dihedral angle).
    /// Default: false
    pub preserve_sharp_features: bool,

    /// Dihedral angle threshold in radians for sharp feature detection.
    /// Default: pi/6 (30 degrees)
    pub sharp_angle_threshold: f64,

    /// Maximum error allowed for an edge collapse. If None, no limit.
    pub max_error: Option<f64>,

    /// Cost multiplier for boundary edges when `preserve_boundary` is false.
    /// Default: 10.0
    pub boundary_penalty: f64,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.5,
            preserve_boundary: false,
            preserve_sharp_features: false,
            sharp_angle_threshold: FRAC_PI_6,
            max_error: None,
            boundary_penalty: 10.0,
        }
    }
}

impl DecimateParams {
    /// Create params targeting a specific triangle count.
    #[must_use]
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Create params targeting a ratio of original triangles.
    #[must_use]
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Set preserve boundary option.
    #[must_use]
    pub const fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set preserve sharp features option.
    #[must_use]
    pub const fn with_preserve_sharp_features(mut self, preserve: bool) -> Self {
        self.preserve_sharp_features = preserve;
        self
    }

    /// Set maximum error threshold.
    #[must_use]
    pub const fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Triangle count to stop at for a mesh of `triangles` triangles.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn target_for(&self, triangles: usize) -> usize {
        self.target_triangles
            .unwrap_or_else(|| ((triangles as f64) * self.target_ratio).ceil() as usize)
    }
}

/// Parameters for Taubin smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaubinParams {
    /// Number of lambda/mu iteration pairs. Default: 5.
    pub iterations: u32,

    /// Smoothing factor (positive). Default: 0.5.
    pub lambda: f64,

    /// Inflation factor (negative). Default: -0.53.
    pub mu: f64,

    /// Keep boundary vertices in place. Default: false.
    pub preserve_boundaries: bool,
}

impl Default for TaubinParams {
    fn default() -> Self {
        Self {
            iterations: 5,
            lambda: 0.5,
            mu: -0.53,
            preserve_boundaries: false,
        }
    }
}

impl TaubinParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration count.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the smoothing factor (lambda).
    #[must_use]
    pub const fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets the inflation factor (mu).
    #[must_use]
    pub const fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Sets whether boundary vertices stay fixed.
    #[must_use]
    pub const fn with_preserve_boundaries(mut self, preserve: bool) -> Self {
        self.preserve_boundaries = preserve;
        self
    }
}

/// Parameters for [`simplify_mesh`](crate::simplify_mesh).
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifyParams {
    /// Triangle count to decimate toward. Default: 500 000.
    pub target_triangles: usize,

    /// Decimation settings other than the target.
    pub decimate: DecimateParams,

    /// Smoothing applied after decimation.
    pub smoothing: TaubinParams,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            target_triangles: 500_000,
            decimate: DecimateParams::default(),
            smoothing: TaubinParams::default(),
        }
    }
}

impl SimplifyParams {
    /// Creates parameters with the given target and default settings.
    #[must_use]
    pub fn new(target_triangles: usize) -> Self {
        Self {
            target_triangles,
            ..Self::default()
        }
    }

    /// Sets the number of smoothing iterations.
    #[must_use]
    pub const fn with_smoothing_iterations(mut self, iterations: u32) -> Self {
        self.smoothing.iterations = iterations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = DecimateParams::default();
        assert!((params.target_ratio - 0.5).abs() < 0.001);
        assert!(!params.preserve_boundary);
        assert!(!params.preserve_sharp_features);
        assert!((params.boundary_penalty - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_for() {
        assert_eq!(DecimateParams::with_target_triangles(1000).target_for(5000), 1000);
        assert_eq!(DecimateParams::with_target_ratio(0.3).target_for(10), 3);
    }

    #[test]
    fn test_ratio_clamping() {
        let params = DecimateParams::with_target_ratio(1.5);
        assert!((params.target_ratio - 1.0).abs() < 0.001);

        let params = DecimateParams::with_target_ratio(-0.5);
        assert!((params.target_ratio).abs() < 0.001);
    }

    #[test]
    fn test_taubin_defaults() {
        let params = TaubinParams::default();
        assert_eq!(params.iterations, 5);
        assert!((params.lambda - 0.5).abs() < f64::EPSILON);
        assert!((params.mu + 0.53).abs() < f64::EPSILON);
        assert!(!params.preserve_boundaries);
    }

    #[test]
    fn test_simplify_builder() {
        let params = SimplifyParams::new(1000).with_smoothing_iterations(2);
        assert_eq!(params.target_triangles, 1000);
        assert_eq!(params.smoothing.iterations, 2);
    }
}
