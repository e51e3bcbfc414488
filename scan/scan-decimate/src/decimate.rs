//! Core mesh decimation algorithm.
//!
//! Edge collapse with quadric error metrics (QEM). Each vertex keeps the list
//! of faces around it so a collapse only touches its own neighborhood, and a
//! per-vertex version stamp marks heap entries made stale by earlier
//! collapses.

// Mesh indices and counts don't overflow in practice
#![allow(clippy::cast_possible_truncation)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use scan_types::TriangleMesh;
use tracing::{debug, info};

use crate::params::DecimateParams;
use crate::quadric::Quadric;
use crate::result::DecimationResult;

/// An edge collapse candidate in the priority queue.
#[derive(Debug, Clone)]
struct EdgeCollapse {
    v1: u32,
    v2: u32,
    /// Versions of `v1` and `v2` when this entry was computed.
    stamps: (u32, u32),
    cost: f64,
    target: Point3<f64>,
}

impl PartialEq for EdgeCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for EdgeCollapse {}

impl PartialOrd for EdgeCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (smaller cost = higher priority)
        other.cost.total_cmp(&self.cost)
    }
}

const fn normalize_edge(v1: u32, v2: u32) -> (u32, u32) {
    if v1 < v2 { (v1, v2) } else { (v2, v1) }
}

/// Mutable mesh state during decimation.
struct Workspace<'p> {
    positions: Vec<Point3<f64>>,
    vertex_alive: Vec<bool>,
    faces: Vec<[u32; 3]>,
    face_alive: Vec<bool>,
    vertex_faces: Vec<Vec<usize>>,
    quadrics: Vec<Quadric>,
    versions: Vec<u32>,
    sharp_edges: HashSet<(u32, u32)>,
    params: &'p DecimateParams,
}

impl<'p> Workspace<'p> {
    fn new(mesh: &TriangleMesh, params: &'p DecimateParams) -> Self {
        let n = mesh.vertex_count();
        let mut vertex_faces = vec![Vec::new(); n];
        for (f, face) in mesh.triangles.iter().enumerate() {
            for &v in face {
                vertex_faces[v as usize].push(f);
            }
        }

        let sharp_edges = if params.preserve_sharp_features {
            find_sharp_edges(mesh, params.sharp_angle_threshold)
        } else {
            HashSet::new()
        };

        Self {
            positions: mesh.vertices.clone(),
            vertex_alive: vec![true; n],
            faces: mesh.triangles.clone(),
            face_alive: vec![true; mesh.triangle_count()],
            vertex_faces,
            quadrics: compute_vertex_quadrics(mesh),
            versions: vec![0; n],
            sharp_edges,
            params,
        }
    }

    fn live_faces(&self, v: u32) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .copied()
            .filter(|&f| self.face_alive[f])
    }

    fn neighbors(&self, v: u32) -> HashSet<u32> {
        self.live_faces(v)
            .flat_map(|f| self.faces[f])
            .filter(|&u| u != v)
            .collect()
    }

    fn shared_face_count(&self, v1: u32, v2: u32) -> usize {
        self.live_faces(v1)
            .filter(|&f| self.faces[f].contains(&v2))
            .count()
    }

    fn is_boundary_vertex(&self, v: u32) -> bool {
        self.neighbors(v)
            .into_iter()
            .any(|u| self.shared_face_count(v, u) == 1)
    }

    fn collapse_candidate(&self, v1: u32, v2: u32) -> Option<EdgeCollapse> {
        let edge = normalize_edge(v1, v2);
        let boundary = self.shared_face_count(v1, v2) == 1;

        if self.params.preserve_sharp_features && self.sharp_edges.contains(&edge) {
            return None;
        }

        let combined = self.quadrics[v1 as usize].combined(&self.quadrics[v2 as usize]);
        let p1 = self.positions[v1 as usize];
        let p2 = self.positions[v2 as usize];

        let target = if self.params.preserve_boundary {
            // Rim vertices never move; an edge joining two of them never collapses
            match (self.is_boundary_vertex(v1), self.is_boundary_vertex(v2)) {
                (true, true) => return None,
                (true, false) => p1,
                (false, true) => p2,
                (false, false) => combined
                    .optimal_point()
                    .unwrap_or_else(|| nalgebra::center(&p1, &p2)),
            }
        } else {
            combined
                .optimal_point()
                .unwrap_or_else(|| nalgebra::center(&p1, &p2))
        };

        let mut cost = combined.evaluate(&target);
        if boundary {
            cost *= self.params.boundary_penalty;
        }

        Some(EdgeCollapse {
            v1,
            v2,
            stamps: (self.versions[v1 as usize], self.versions[v2 as usize]),
            cost,
            target,
        })
    }

    fn is_stale(&self, c: &EdgeCollapse) -> bool {
        !self.vertex_alive[c.v1 as usize]
            || !self.vertex_alive[c.v2 as usize]
            || self.versions[c.v1 as usize] != c.stamps.0
            || self.versions[c.v2 as usize] != c.stamps.1
    }

    /// Common neighbors must be exactly the apexes of the faces on the edge.
    fn satisfies_link_condition(&self, v1: u32, v2: u32) -> bool {
        let n1 = self.neighbors(v1);
        let n2 = self.neighbors(v2);
        let shared = n1.intersection(&n2).count();

        let apexes: HashSet<u32> = self
            .live_faces(v1)
            .filter(|&f| self.faces[f].contains(&v2))
            .flat_map(|f| self.faces[f])
            .filter(|&u| u != v1 && u != v2)
            .collect();

        shared <= 2 && shared == apexes.len()
    }

    /// Moving `v1`/`v2` to `target` must not turn any surviving face over.
    fn flips_a_face(&self, v1: u32, v2: u32, target: &Point3<f64>) -> bool {
        let mut seen = HashSet::new();
        for f in self.live_faces(v1).chain(self.live_faces(v2)) {
            let face = self.faces[f];
            if !seen.insert(f) || (face.contains(&v1) && face.contains(&v2)) {
                continue;
            }

            let before = face.map(|v| self.positions[v as usize]);
            let after = face.map(|v| {
                if v == v1 || v == v2 {
                    *target
                } else {
                    self.positions[v as usize]
                }
            });

            let n_before = triangle_cross(&before);
            let n_after = triangle_cross(&after);
            if n_before.norm_squared() > 0.0 && n_before.dot(&n_after) <= 0.0 {
                return true;
            }
        }
        false
    }

    /// Merge `v2` into `v1` at `target`. Returns the number of faces removed.
    fn collapse(&mut self, v1: u32, v2: u32, target: Point3<f64>) -> usize {
        self.positions[v1 as usize] = target;
        let q2 = self.quadrics[v2 as usize];
        self.quadrics[v1 as usize].add(&q2);
        self.vertex_alive[v2 as usize] = false;

        let mut removed = 0;
        let moved = std::mem::take(&mut self.vertex_faces[v2 as usize]);
        for f in moved {
            if !self.face_alive[f] {
                continue;
            }
            if self.faces[f].contains(&v1) {
                self.face_alive[f] = false;
                removed += 1;
            } else {
                for v in &mut self.faces[f] {
                    if *v == v2 {
                        *v = v1;
                    }
                }
                self.vertex_faces[v1 as usize].push(f);
            }
        }

        let alive = &self.face_alive;
        self.vertex_faces[v1 as usize].retain(|&f| alive[f]);

        self.versions[v1 as usize] += 1;
        self.versions[v2 as usize] += 1;
        removed
    }

    fn into_mesh(self) -> TriangleMesh {
        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut vertices = Vec::new();
        for (old, alive) in self.vertex_alive.iter().enumerate() {
            let referenced = *alive && self.vertex_faces[old].iter().any(|&f| self.face_alive[f]);
            if referenced {
                remap[old] = vertices.len() as u32;
                vertices.push(self.positions[old]);
            }
        }

        let triangles: Vec<[u32; 3]> = self
            .faces
            .iter()
            .zip(&self.face_alive)
            .filter(|(_, alive)| **alive)
            .map(|(face, _)| face.map(|v| remap[v as usize]))
            .collect();

        debug!(
            vertices = vertices.len(),
            faces = triangles.len(),
            "Built final decimated mesh"
        );

        TriangleMesh::from_parts(vertices, triangles)
    }
}

fn triangle_cross(p: &[Point3<f64>; 3]) -> Vector3<f64> {
    (p[1] - p[0]).cross(&(p[2] - p[0]))
}

fn compute_vertex_quadrics(mesh: &TriangleMesh) -> Vec<Quadric> {
    let mut quadrics = vec![Quadric::default(); mesh.vertex_count()];

    for (f, face) in mesh.triangles.iter().enumerate() {
        let Some(normal) = mesh.face_normal(f) else {
            continue;
        };
        let q = Quadric::from_point_normal(&mesh.vertices[face[0] as usize], &normal);
        for &vi in face {
            quadrics[vi as usize].add(&q);
        }
    }

    quadrics
}

fn find_sharp_edges(mesh: &TriangleMesh, threshold: f64) -> HashSet<(u32, u32)> {
    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (f, face) in mesh.triangles.iter().enumerate() {
        for i in 0..3 {
            edge_faces
                .entry(normalize_edge(face[i], face[(i + 1) % 3]))
                .or_default()
                .push(f);
        }
    }

    edge_faces
        .into_iter()
        .filter(|(_, faces)| faces.len() == 2)
        .filter_map(|(edge, faces)| {
            let n1 = mesh.face_normal(faces[0])?;
            let n2 = mesh.face_normal(faces[1])?;
            let angle = n1.dot(&n2).clamp(-1.0, 1.0).acos();
            (angle > threshold).then_some(edge)
        })
        .collect()
}

/// Decimate a mesh using edge collapse with quadric error metrics.
///
/// Collapses the cheapest edge until the triangle count reaches the target
/// or no valid collapse remains. A collapse is rejected if it would break
/// the link condition (pinch the surface) or flip a neighboring face. A
/// mesh already at or below the target is returned unchanged; any
/// decimated output gets fresh vertex normals.
///
/// # Example
///
/// ```
/// use scan_decimate::{DecimateParams, decimate_mesh};
/// use scan_types::{Point3, TriangleMesh};
///
/// // A flat 3x3 grid of quads, 18 triangles
/// let mut vertices = Vec::new();
/// for z in 0..4 {
///     for x in 0..4 {
///         vertices.push(Point3::new(f64::from(x), 0.0, f64::from(z)));
///     }
/// }
/// let mut triangles = Vec::new();
/// for z in 0..3u32 {
///     for x in 0..3u32 {
///         let i = z * 4 + x;
///         triangles.push([i, i + 4, i + 1]);
///         triangles.push([i + 1, i + 4, i + 5]);
///     }
/// }
/// let mesh = TriangleMesh::from_parts(vertices, triangles);
///
/// let result = decimate_mesh(&mesh, &DecimateParams::with_target_triangles(8));
/// assert!(result.final_triangles < 18);
/// println!("{result}");
/// ```
#[must_use]
pub fn decimate_mesh(mesh: &TriangleMesh, params: &DecimateParams) -> DecimationResult {
    let original_triangles = mesh.triangle_count();
    let target = params.target_for(original_triangles);

    if original_triangles <= target {
        return DecimationResult {
            mesh: mesh.clone(),
            original_triangles,
            final_triangles: original_triangles,
            collapses_performed: 0,
            collapses_rejected: 0,
        };
    }

    info!(
        original = original_triangles,
        target = target,
        "Starting mesh decimation"
    );

    let mut ws = Workspace::new(mesh, params);

    let mut heap = BinaryHeap::new();
    let mut seen_edges = HashSet::new();
    for face in &mesh.triangles {
        for i in 0..3 {
            let (v1, v2) = (face[i], face[(i + 1) % 3]);
            if v1 != v2 && seen_edges.insert(normalize_edge(v1, v2)) {
                heap.extend(ws.collapse_candidate(v1, v2));
            }
        }
    }
    drop(seen_edges);

    let mut active_faces = original_triangles;
    let mut collapses_performed = 0;
    let mut collapses_rejected = 0;

    while active_faces > target {
        let Some(candidate) = heap.pop() else {
            break;
        };
        if ws.is_stale(&candidate) {
            continue;
        }
        let (v1, v2) = (candidate.v1, candidate.v2);

        if let Some(max_error) = params.max_error {
            if candidate.cost > max_error {
                // The heap is ordered, so every remaining candidate is worse
                break;
            }
        }

        if !ws.satisfies_link_condition(v1, v2) || ws.flips_a_face(v1, v2, &candidate.target) {
            collapses_rejected += 1;
            continue;
        }

        active_faces -= ws.collapse(v1, v2, candidate.target);
        collapses_performed += 1;

        for u in ws.neighbors(v1) {
            heap.extend(ws.collapse_candidate(v1, u));
        }
    }

    let mut final_mesh = ws.into_mesh();
    final_mesh.compute_vertex_normals();

    info!(
        final_triangles = active_faces,
        collapses = collapses_performed,
        rejected = collapses_rejected,
        "Decimation complete"
    );

    DecimationResult {
        mesh: final_mesh,
        original_triangles,
        final_triangles: active_faces,
        collapses_performed,
        collapses_rejected,
    }
}
