//! Alpha-shape surface extraction.

use std::fmt;

use scan_types::{Point3, PointCloud, TriangleMesh};
use tracing::{info, warn};

use crate::{ReconstructError, ReconstructResult, Tetrahedralization};

/// Parameters for alpha-shape reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaParams {
    /// Maximum circumradius of a retained tetrahedron (default: 0.1).
    ///
    /// Smaller values keep more concavities and may fragment the surface;
    /// larger values approach the convex hull.
    pub alpha: f64,
}

impl Default for AlphaParams {
    fn default() -> Self {
        Self { alpha: 0.1 }
    }
}

impl AlphaParams {
    /// Creates parameters with the given alpha.
    #[must_use]
    pub const fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Sets alpha.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    fn validate(&self) -> ReconstructResult<()> {
        if self.alpha.is_finite() && self.alpha > 0.0 {
            Ok(())
        } else {
            Err(ReconstructError::InvalidAlpha(self.alpha))
        }
    }
}

/// Result of alpha-shape reconstruction.
#[derive(Debug, Clone)]
pub struct ReconstructionResult {
    /// The boundary surface. Vertices are the referenced input points, in
    /// input order.
    pub mesh: TriangleMesh,

    /// Tetrahedra in the Delaunay tetrahedralization.
    pub tetrahedra: usize,

    /// Tetrahedra that passed the alpha test.
    pub retained: usize,

    /// Edges used by exactly one surface triangle.
    pub boundary_edge_count: usize,
}

impl fmt::Display for ReconstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alpha shape: {} triangles, {}/{} tetrahedra retained, {} boundary edges",
            self.mesh.triangle_count(),
            self.retained,
            self.tetrahedra,
            self.boundary_edge_count
        )
    }
}

/// Reconstruct the alpha shape of a point cloud.
///
/// Every tetrahedron of the Delaunay tetrahedralization whose circumradius
/// is at most `alpha` is retained. The surface is the set of retained
/// tetrahedron faces not shared with another retained tetrahedron, each
/// wound to face away from its tetrahedron. The mesh carries area-weighted
/// vertex normals.
///
/// # Errors
///
/// - [`ReconstructError::InvalidAlpha`] if alpha is not finite and positive
/// - [`ReconstructError::InsufficientPoints`] / [`ReconstructError::Degenerate`]
///   if the cloud does not span a volume
/// - [`ReconstructError::NoSurface`] if no tetrahedron is retained
pub fn alpha_shape(
    cloud: &PointCloud,
    params: &AlphaParams,
) -> ReconstructResult<ReconstructionResult> {
    params.validate()?;

    let positions = cloud.positions();
    let tets = Tetrahedralization::build(positions)?;

    let retained: Vec<bool> = (0..tets.len())
        .map(|t| tets.circumradius(t).is_some_and(|r| r <= params.alpha))
        .collect();
    let retained_count = retained.iter().filter(|&&r| r).count();

    let mut faces = Vec::new();
    for (t, tet) in tets.tetrahedra().iter().enumerate() {
        if !retained[t] {
            continue;
        }
        for i in 0..4 {
            if tet.neighbors[i].is_some_and(|n| retained[n]) {
                continue;
            }
            let mut face = tet.face(i);
            if !tets.faces_away(face, tet.vertices[i]) {
                face.swap(1, 2);
            }
            faces.push(face);
        }
    }

    if faces.is_empty() {
        return Err(ReconstructError::NoSurface {
            alpha: params.alpha,
        });
    }

    let mut mesh = compact(positions, &faces);
    mesh.compute_vertex_normals();
    let boundary_edge_count = mesh.boundary_edge_count();

    let result = ReconstructionResult {
        mesh,
        tetrahedra: tets.len(),
        retained: retained_count,
        boundary_edge_count,
    };
    info!(alpha = params.alpha, "{result}");
    Ok(result)
}

/// Keep only referenced vertices, in input order.
#[allow(clippy::cast_possible_truncation)]
fn compact(positions: &[Point3<f64>], faces: &[[usize; 3]]) -> TriangleMesh {
    let mut used = vec![false; positions.len()];
    for face in faces {
        for &v in face {
            used[v] = true;
        }
    }

    let mut remap = vec![0_u32; positions.len()];
    let mut vertices = Vec::new();
    for (old, _) in used.iter().enumerate().filter(|(_, u)| **u) {
        remap[old] = vertices.len() as u32;
        vertices.push(positions[old]);
    }

    let triangles = faces.iter().map(|f| f.map(|v| remap[v])).collect();
    TriangleMesh::from_parts(vertices, triangles)
}

/// Reconstruct a surface, replacing geometric failures with an empty mesh.
///
/// Too few points, degenerate input and an empty alpha shape are logged and
/// yield an empty mesh so that downstream stages still run.
///
/// # Errors
///
/// Returns [`ReconstructError::InvalidAlpha`] for an invalid alpha.
pub fn reconstruct_or_empty(
    cloud: &PointCloud,
    params: &AlphaParams,
) -> ReconstructResult<TriangleMesh> {
    match alpha_shape(cloud, params) {
        Ok(result) => Ok(result.mesh),
        Err(e) if e.is_recoverable() => {
            warn!(error = %e, points = cloud.len(), "reconstruction failed, using empty mesh");
            Ok(TriangleMesh::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_cloud() -> PointCloud {
        PointCloud::from_positions(
            (0..8)
                .map(|i: u32| {
                    let bit = |b: u32| f64::from((i >> b) & 1);
                    Point3::new(bit(0), bit(1), bit(2))
                })
                .collect(),
        )
    }

    #[test]
    fn rejects_invalid_alpha() {
        for alpha in [0.0, -0.5, f64::NAN] {
            assert!(matches!(
                alpha_shape(&cube_cloud(), &AlphaParams::new(alpha)),
                Err(ReconstructError::InvalidAlpha(_))
            ));
            assert!(reconstruct_or_empty(&cube_cloud(), &AlphaParams::new(alpha)).is_err());
        }
    }

    #[test]
    fn large_alpha_gives_closed_hull() {
        let result = alpha_shape(&cube_cloud(), &AlphaParams::new(10.0)).unwrap();
        let mesh = &result.mesh;

        assert_eq!(result.boundary_edge_count, 0);
        assert_eq!(mesh.vertex_count(), 8);
        assert!(mesh.has_normals());
        mesh.validate().unwrap();
        assert_relative_eq!(mesh.surface_area(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn faces_point_outward() {
        let result = alpha_shape(&cube_cloud(), &AlphaParams::new(10.0)).unwrap();
        let mesh = &result.mesh;
        let center = Point3::new(0.5, 0.5, 0.5);

        for (f, tri) in mesh.triangles.iter().enumerate() {
            let Some(n) = mesh.face_normal(f) else {
                continue;
            };
            let p = mesh.vertices[tri[0] as usize];
            assert!(n.dot(&(p - center)) > 0.0);
        }
    }

    #[test]
    fn small_alpha_has_no_surface() {
        assert!(matches!(
            alpha_shape(&cube_cloud(), &AlphaParams::new(0.1)),
            Err(ReconstructError::NoSurface { .. })
        ));
        let mesh = reconstruct_or_empty(&cube_cloud(), &AlphaParams::new(0.1)).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn degenerate_input_recovers_to_empty() {
        let flat = PointCloud::from_positions(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.5, 0.0, 0.5),
        ]);
        let mesh = reconstruct_or_empty(&flat, &AlphaParams::default()).unwrap();
        assert!(mesh.is_empty());

        let few = PointCloud::from_positions(vec![Point3::origin(); 2]);
        assert!(reconstruct_or_empty(&few, &AlphaParams::default()).unwrap().is_empty());
    }

    #[test]
    fn unreferenced_points_are_dropped() {
        let mut positions = cube_cloud().into_parts().0;
        positions.push(Point3::new(40.0, 40.0, 40.0));
        let cloud = PointCloud::from_positions(positions);

        let result = alpha_shape(&cloud, &AlphaParams::new(1.0)).unwrap();
        assert_eq!(result.mesh.vertex_count(), 8);
        assert!(result.mesh.vertices.iter().all(|p| p.x <= 1.0));
    }

    #[test]
    fn display_mentions_counts() {
        let result = alpha_shape(&cube_cloud(), &AlphaParams::new(10.0)).unwrap();
        let text = result.to_string();
        assert!(text.starts_with("Alpha shape: 12 triangles"));
    }
}
