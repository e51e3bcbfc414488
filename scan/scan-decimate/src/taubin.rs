//! Taubin mesh smoothing (shrink-free).
//!
//! Each iteration is a smoothing pass with positive `lambda` followed by an
//! inflation pass with negative `mu`. With `|mu|` slightly larger than
//! `lambda` the shrinkage of the first pass cancels out.
//!
//! # Reference
//!
//! Taubin, G. (1995). "A signal processing approach to fair surface design"
//! Proceedings of SIGGRAPH 1995.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use scan_types::TriangleMesh;
use tracing::debug;

use crate::params::TaubinParams;
use crate::result::TaubinResult;

/// Smooth a mesh with alternating lambda/mu Laplacian passes.
///
/// Connectivity is unchanged. Vertex normals are recomputed on the output.
///
/// # Example
///
/// ```
/// use scan_decimate::{TaubinParams, smooth_taubin};
/// use scan_types::{Point3, TriangleMesh};
///
/// let mesh = TriangleMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
/// let result = smooth_taubin(&mesh, &TaubinParams::default());
/// assert_eq!(result.iterations_performed, 5);
/// assert!(result.mesh.has_normals());
/// ```
#[must_use]
pub fn smooth_taubin(mesh: &TriangleMesh, params: &TaubinParams) -> TaubinResult {
    let mut current = mesh.clone();
    current.clear_normals();

    if mesh.is_empty() || params.iterations == 0 {
        current.compute_vertex_normals();
        return TaubinResult {
            mesh: current,
            iterations_performed: 0,
            max_displacement: 0.0,
        };
    }

    let neighbors = build_vertex_neighbors(mesh);
    let pinned = if params.preserve_boundaries {
        find_boundary_vertices(mesh)
    } else {
        vec![false; mesh.vertex_count()]
    };

    let mut max_displacement = 0.0_f64;
    for _ in 0..params.iterations {
        let d1 = laplacian_step(&mut current.vertices, &neighbors, &pinned, params.lambda);
        let d2 = laplacian_step(&mut current.vertices, &neighbors, &pinned, params.mu);
        max_displacement = max_displacement.max(d1).max(d2);
    }

    current.compute_vertex_normals();
    debug!(
        iterations = params.iterations,
        max_displacement, "Taubin smoothing complete"
    );

    TaubinResult {
        mesh: current,
        iterations_performed: params.iterations,
        max_displacement,
    }
}

/// Move every free vertex by `factor` times the offset to its neighbor
/// centroid. Returns the largest displacement.
fn laplacian_step(
    positions: &mut [Point3<f64>],
    neighbors: &[Vec<u32>],
    pinned: &[bool],
    factor: f64,
) -> f64 {
    let current: &[Point3<f64>] = positions;
    let displacements: Vec<Vector3<f64>> = current
        .par_iter()
        .enumerate()
        .map(|(i, p)| {
            let ring = &neighbors[i];
            if pinned[i] || ring.is_empty() {
                return Vector3::zeros();
            }
            let sum: Vector3<f64> = ring.iter().map(|&n| current[n as usize].coords).sum();

            #[allow(clippy::cast_precision_loss)]
            let centroid = sum / ring.len() as f64;

            (centroid - p.coords) * factor
        })
        .collect();

    let mut max_displacement = 0.0_f64;
    for (p, d) in positions.iter_mut().zip(&displacements) {
        max_displacement = max_displacement.max(d.norm());
        *p += d;
    }
    max_displacement
}

/// Unique one-ring neighbors of every vertex.
fn build_vertex_neighbors(mesh: &TriangleMesh) -> Vec<Vec<u32>> {
    let mut neighbors = vec![Vec::new(); mesh.vertex_count()];
    for face in &mesh.triangles {
        for i in 0..3 {
            let v = face[i] as usize;
            for u in [face[(i + 1) % 3], face[(i + 2) % 3]] {
                if !neighbors[v].contains(&u) {
                    neighbors[v].push(u);
                }
            }
        }
    }
    neighbors
}

/// Flags vertices that lie on an edge used by only one face.
fn find_boundary_vertices(mesh: &TriangleMesh) -> Vec<bool> {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();
    for face in &mesh.triangles {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            *edge_counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    let mut boundary = vec![false; mesh.vertex_count()];
    for ((a, b), count) in edge_counts {
        if count == 1 {
            boundary[a as usize] = true;
            boundary[b as usize] = true;
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Flat grid with a spike in the middle vertex.
    fn spiked_grid() -> TriangleMesh {
        let mut vertices = Vec::new();
        for z in 0..5 {
            for x in 0..5 {
                let y = if x == 2 && z == 2 { 1.0 } else { 0.0 };
                vertices.push(Point3::new(f64::from(x), y, f64::from(z)));
            }
        }
        let mut triangles = Vec::new();
        for z in 0..4u32 {
            for x in 0..4u32 {
                let i = z * 5 + x;
                triangles.push([i, i + 5, i + 1]);
                triangles.push([i + 1, i + 5, i + 6]);
            }
        }
        TriangleMesh::from_parts(vertices, triangles)
    }

    #[test]
    fn smoothing_reduces_spike() {
        let mesh = spiked_grid();
        let result = smooth_taubin(&mesh, &TaubinParams::default());

        assert!(result.mesh.vertices[12].y < 1.0);
        assert!(result.max_displacement > 0.0);
        assert_eq!(result.mesh.triangles, mesh.triangles);
        result.mesh.validate().unwrap();
    }

    #[test]
    fn preserved_boundary_does_not_move() {
        let mesh = spiked_grid();
        let params = TaubinParams::default().with_preserve_boundaries(true);
        let result = smooth_taubin(&mesh, &params);

        for i in [0_usize, 4, 20, 24, 2, 10] {
            assert_relative_eq!(result.mesh.vertices[i], mesh.vertices[i]);
        }
    }

    #[test]
    fn unpinned_boundary_moves() {
        let mesh = spiked_grid();
        let result = smooth_taubin(&mesh, &TaubinParams::default());
        assert!((result.mesh.vertices[0] - mesh.vertices[0]).norm() > 0.0);
    }

    #[test]
    fn zero_iterations_only_adds_normals() {
        let mesh = spiked_grid();
        let result = smooth_taubin(&mesh, &TaubinParams::default().with_iterations(0));
        assert_eq!(result.iterations_performed, 0);
        assert_eq!(result.mesh.vertices, mesh.vertices);
        assert!(result.mesh.has_normals());
    }

    #[test]
    fn boundary_detection() {
        let boundary = find_boundary_vertices(&spiked_grid());
        assert!(boundary[0] && boundary[2] && boundary[24]);
        assert!(!boundary[12] && !boundary[6]);
    }
}
