//! Decimate-then-smooth simplification used by the conversion pipeline.

use scan_types::TriangleMesh;
use tracing::info;

use crate::params::{DecimateParams, SimplifyParams};
use crate::result::SimplifyResult;
use crate::{DecimateError, DecimateResult, decimate_mesh, smooth_taubin};

/// Reduce a mesh toward a triangle budget and smooth it.
///
/// A mesh with at most `target_triangles` triangles is returned exactly as
/// given. Otherwise it is decimated, smoothed and given fresh vertex normals.
///
/// # Errors
///
/// Returns [`DecimateError::InvalidTargetCount`] if the target is zero.
///
/// # Example
///
/// ```
/// use scan_decimate::{SimplifyParams, simplify_mesh};
/// use scan_types::TriangleMesh;
///
/// let result = simplify_mesh(TriangleMesh::new(), &SimplifyParams::new(100)).unwrap();
/// assert!(result.was_unchanged());
///
/// assert!(simplify_mesh(TriangleMesh::new(), &SimplifyParams::new(0)).is_err());
/// ```
pub fn simplify_mesh(mesh: TriangleMesh, params: &SimplifyParams) -> DecimateResult<SimplifyResult> {
    if params.target_triangles == 0 {
        return Err(DecimateError::InvalidTargetCount(0));
    }

    let original_triangles = mesh.triangle_count();
    if original_triangles <= params.target_triangles {
        info!(
            triangles = original_triangles,
            target = params.target_triangles,
            "mesh within budget, not simplified"
        );
        return Ok(SimplifyResult {
            mesh,
            original_triangles,
            final_triangles: original_triangles,
            collapses_performed: 0,
            smoothing_iterations: 0,
        });
    }

    let decimate_params = DecimateParams {
        target_triangles: Some(params.target_triangles),
        ..params.decimate.clone()
    };
    let decimated = decimate_mesh(&mesh, &decimate_params);
    drop(mesh);
    info!("{decimated}");

    let smoothed = smooth_taubin(&decimated.mesh, &params.smoothing);
    info!("{smoothed}");

    let result = SimplifyResult {
        final_triangles: smoothed.mesh.triangle_count(),
        mesh: smoothed.mesh,
        original_triangles,
        collapses_performed: decimated.collapses_performed,
        smoothing_iterations: smoothed.iterations_performed,
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_types::Point3;

    fn grid(n: u32) -> TriangleMesh {
        let mut vertices = Vec::new();
        for z in 0..=n {
            for x in 0..=n {
                vertices.push(Point3::new(f64::from(x), 0.0, f64::from(z)));
            }
        }
        let w = n + 1;
        let mut triangles = Vec::new();
        for z in 0..n {
            for x in 0..n {
                let i = z * w + x;
                triangles.push([i, i + w, i + 1]);
                triangles.push([i + 1, i + w, i + w + 1]);
            }
        }
        TriangleMesh::from_parts(vertices, triangles)
    }

    #[test]
    fn zero_target_is_rejected() {
        assert_eq!(
            simplify_mesh(grid(2), &SimplifyParams::new(0)).unwrap_err(),
            DecimateError::InvalidTargetCount(0)
        );
    }

    #[test]
    fn within_budget_is_untouched() {
        let mesh = grid(3);
        let result = simplify_mesh(mesh.clone(), &SimplifyParams::new(18)).unwrap();
        assert!(result.was_unchanged());
        assert_eq!(result.mesh, mesh);
    }

    #[test]
    fn over_budget_is_decimated_and_smoothed() {
        let result = simplify_mesh(grid(8), &SimplifyParams::new(40)).unwrap();

        assert!(result.final_triangles < 128);
        assert!(result.collapses_performed > 0);
        assert_eq!(result.smoothing_iterations, 5);
        assert!(result.mesh.has_normals());
        result.mesh.validate().unwrap();
    }
}
