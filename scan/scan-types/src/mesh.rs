//! Indexed triangle mesh.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

use crate::{Aabb, MeshError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that normals are unit length.
const UNIT_TOLERANCE: f64 = 1e-6;

/// An indexed triangle mesh with optional per-vertex normals.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Point3<f64>>` - Vertex positions
/// - `triangles`: `Vec<[u32; 3]>` - Faces as vertex indices, CCW from outside
/// - `vertex_normals`: `Option<Vec<Vector3<f64>>>` - One unit normal per vertex
///
/// # Example
///
/// ```
/// use scan_types::{TriangleMesh, Point3};
///
/// let mut mesh = TriangleMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
/// mesh.compute_vertex_normals();
///
/// assert_eq!(mesh.triangle_count(), 1);
/// assert!(mesh.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as indices into `vertices`.
    pub triangles: Vec<[u32; 3]>,

    /// Optional unit normals, parallel to `vertices`.
    pub vertex_normals: Option<Vec<Vector3<f64>>>,
}

impl TriangleMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
            vertex_normals: None,
        }
    }

    /// Create a mesh from vertices and triangles, without normals.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            vertex_normals: None,
        }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// A mesh is empty when it has no triangles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Returns true if vertex normals are present.
    #[inline]
    #[must_use]
    pub const fn has_normals(&self) -> bool {
        self.vertex_normals.is_some()
    }

    /// Check the index and normal invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshError`] found.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        for (triangle, face) in self.triangles.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfBounds {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        if let Some(normals) = &self.vertex_normals {
            if normals.len() != vertex_count {
                return Err(MeshError::NormalCountMismatch {
                    normals: normals.len(),
                    vertices: vertex_count,
                });
            }
            if let Some(vertex) = normals
                .iter()
                .position(|n| (n.norm() - 1.0).abs() > UNIT_TOLERANCE)
            {
                return Err(MeshError::NonUnitNormal { vertex });
            }
        }

        Ok(())
    }

    /// Unnormalized face normal (cross product of two edges).
    ///
    /// Its length is twice the triangle area.
    #[must_use]
    pub fn face_cross(&self, face: usize) -> Vector3<f64> {
        let [a, b, c] = self.triangles[face];
        let p0 = &self.vertices[a as usize];
        let p1 = &self.vertices[b as usize];
        let p2 = &self.vertices[c as usize];
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Unit face normal, or `None` for a degenerate triangle.
    #[must_use]
    pub fn face_normal(&self, face: usize) -> Option<Vector3<f64>> {
        self.face_cross(face).try_normalize(1e-12)
    }

    /// Recompute per-vertex normals from area-weighted face normals.
    ///
    /// Vertices without a non-degenerate incident face get the vertical axis
    /// so that every stored normal is unit length.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vector3::zeros(); self.vertices.len()];

        for face in 0..self.triangles.len() {
            let cross = self.face_cross(face);
            for &vi in &self.triangles[face] {
                accum[vi as usize] += cross;
            }
        }

        let normals = accum
            .into_iter()
            .map(|n| n.try_normalize(1e-12).unwrap_or_else(Vector3::y))
            .collect();

        self.vertex_normals = Some(normals);
    }

    /// Drop vertex normals.
    pub fn clear_normals(&mut self) {
        self.vertex_normals = None;
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len())
            .map(|f| self.face_cross(f).norm() * 0.5)
            .sum()
    }

    /// Number of edges used by exactly one triangle.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        let mut counts: HashMap<(u32, u32), u32> = HashMap::new();
        for face in &self.triangles {
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let key = if a < b { (a, b) } else { (b, a) };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts.values().filter(|&&c| c == 1).count()
    }
}
