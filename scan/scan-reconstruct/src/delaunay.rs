//! Incremental 3D Delaunay tetrahedralization.
//!
//! Bowyer-Watson insertion into a bounding super-tetrahedron:
//!
//! 1. Locate the tetrahedron containing the new point with a visibility walk
//! 2. Grow the cavity of tetrahedra whose circumsphere contains the point
//! 3. Replace the cavity with a fan of tetrahedra joining its boundary to
//!    the point
//!
//! Points are moved into a local frame (centered, unit extent) and nudged by
//! a deterministic per-index offset so that grid-aligned voxel output does
//! not produce exact co-spherical ties. Tetrahedra touching the super
//! vertices are dropped at the end.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use scan_types::Aabb;
use tracing::debug;

use crate::predicates::{circumcenter_offset, insphere, orient3d};
use crate::{ReconstructError, ReconstructResult};

/// Super-tetrahedron size relative to the local unit frame.
const SUPER_SCALE: f64 = 50.0;

/// Magnitude of the per-point perturbation in the local frame.
const JITTER: f64 = 1e-9;

/// Volumes and extents below this (local frame) count as flat.
const FLAT_TOLERANCE: f64 = 1e-10;

/// Points closer than this (local frame) to an existing vertex are skipped.
const DUPLICATE_TOLERANCE: f64 = 1e-7;

/// Maximum cavity growth rounds when repairing a non star-shaped cavity.
const MAX_REPAIR_ROUNDS: usize = 32;

/// A tetrahedron of a finished [`Tetrahedralization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tetrahedron {
    /// Indices into the input points, positively oriented.
    pub vertices: [usize; 4],
    /// `neighbors[i]` shares the face opposite `vertices[i]`; `None` on the hull.
    pub neighbors: [Option<usize>; 4],
}

impl Tetrahedron {
    /// The face opposite `vertices[i]`.
    #[must_use]
    pub fn face(&self, i: usize) -> [usize; 3] {
        let v = self.vertices;
        match i {
            0 => [v[1], v[2], v[3]],
            1 => [v[0], v[2], v[3]],
            2 => [v[0], v[1], v[3]],
            _ => [v[0], v[1], v[2]],
        }
    }
}

/// Delaunay tetrahedralization of a point set.
///
/// # Example
///
/// ```
/// use scan_reconstruct::Tetrahedralization;
/// use scan_types::Point3;
///
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
///     Point3::new(0.2, 0.2, 0.2),
/// ];
/// let tets = Tetrahedralization::build(&points).unwrap();
/// assert_eq!(tets.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Tetrahedralization {
    local: Vec<Point3<f64>>,
    scale: f64,
    tetrahedra: Vec<Tetrahedron>,
    skipped: usize,
}

impl Tetrahedralization {
    /// Build the tetrahedralization of `points`.
    ///
    /// # Errors
    ///
    /// - [`ReconstructError::InsufficientPoints`] for fewer than 4 points
    /// - [`ReconstructError::Degenerate`] if the points are non-finite,
    ///   coincident, collinear or coplanar
    pub fn build(points: &[Point3<f64>]) -> ReconstructResult<Self> {
        if points.len() < 4 {
            return Err(ReconstructError::InsufficientPoints {
                required: 4,
                actual: points.len(),
            });
        }
        if points.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(degenerate("non-finite coordinate"));
        }

        let bounds = Aabb::from_points(points.iter());
        let center = bounds.center();
        let scale = bounds.max_extent();
        if scale <= 0.0 {
            return Err(degenerate("all points coincide"));
        }

        let normalized: Vec<Point3<f64>> =
            points.iter().map(|p| Point3::from((p - center) / scale)).collect();
        check_spans_volume(&normalized)?;

        let local: Vec<Point3<f64>> = normalized
            .into_iter()
            .enumerate()
            .map(|(i, p)| p + jitter(i) * JITTER)
            .collect();

        let mut builder = Builder::new(&local);
        for i in insertion_order(&local) {
            builder.insert(i);
        }
        let skipped = builder.skipped;
        let tetrahedra = builder.finish();

        if tetrahedra.is_empty() {
            return Err(degenerate("no finite tetrahedra"));
        }

        debug!(
            points = points.len(),
            tetrahedra = tetrahedra.len(),
            skipped,
            "tetrahedralization built"
        );

        Ok(Self {
            local,
            scale,
            tetrahedra,
            skipped,
        })
    }

    /// The tetrahedra.
    #[must_use]
    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tetrahedra
    }

    /// Number of tetrahedra.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tetrahedra.len()
    }

    /// Returns true if there are no tetrahedra.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tetrahedra.is_empty()
    }

    /// Number of input points that duplicated an earlier point and were not
    /// inserted.
    #[must_use]
    pub const fn skipped_duplicates(&self) -> usize {
        self.skipped
    }

    /// Circumradius of tetrahedron `t` in input units, or `None` if `t` is
    /// out of range.
    ///
    /// Flat tetrahedra have an infinite circumradius.
    #[must_use]
    pub fn circumradius(&self, t: usize) -> Option<f64> {
        let [a, b, c, d] = self.tetrahedra.get(t)?.vertices.map(|v| &self.local[v]);
        Some(circumcenter_offset(a, b, c, d).map_or(f64::INFINITY, |o| o.norm() * self.scale))
    }

    /// Returns true if `face` wound as given points away from `apex`.
    pub(crate) fn faces_away(&self, face: [usize; 3], apex: usize) -> bool {
        let [a, b, c] = face.map(|v| &self.local[v]);
        orient3d(a, b, c, &self.local[apex]) > 0.0
    }
}

fn degenerate(reason: &str) -> ReconstructError {
    ReconstructError::Degenerate {
        reason: reason.to_string(),
    }
}

/// Reject point sets that do not span a volume.
fn check_spans_volume(points: &[Point3<f64>]) -> ReconstructResult<()> {
    let p0 = points[0];

    let farthest = |score: &dyn Fn(&Point3<f64>) -> f64| {
        points
            .iter()
            .map(|p| (score(p), *p))
            .fold((f64::NEG_INFINITY, p0), |best, cur| {
                if cur.0 > best.0 { cur } else { best }
            })
    };

    let (d1, p1) = farthest(&|p| (p - p0).norm());
    if d1 <= FLAT_TOLERANCE {
        return Err(degenerate("all points coincide"));
    }
    let axis = p1 - p0;
    let (d2, p2) = farthest(&|p| (p - p0).cross(&axis).norm());
    if d2 <= FLAT_TOLERANCE {
        return Err(degenerate("points are collinear"));
    }
    let (d3, _) = farthest(&|p| orient3d(&p0, &p1, &p2, p).abs());
    if d3 <= FLAT_TOLERANCE {
        return Err(degenerate("points are coplanar"));
    }
    Ok(())
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic offset in `[-1, 1)^3` for point `i`.
#[allow(clippy::cast_precision_loss)]
fn jitter(i: usize) -> Vector3<f64> {
    let unit = |h: u64| (h >> 11) as f64 / (1_u64 << 53) as f64 * 2.0 - 1.0;
    let seed = (i as u64).wrapping_mul(3);
    Vector3::new(
        unit(splitmix64(seed)),
        unit(splitmix64(seed + 1)),
        unit(splitmix64(seed + 2)),
    )
}

/// Spread the low 10 bits of `v` to every third bit.
fn spread_bits(v: u32) -> u32 {
    let mut x = v & 0x3ff;
    x = (x | (x << 16)) & 0x0300_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// Morton order over the local frame, so consecutive insertions are close.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn insertion_order(points: &[Point3<f64>]) -> Vec<usize> {
    let quantize = |c: f64| ((c + 0.5) * 1023.0).clamp(0.0, 1023.0) as u32;
    let mut order: Vec<(u32, usize)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let code = spread_bits(quantize(p.x))
                | (spread_bits(quantize(p.y)) << 1)
                | (spread_bits(quantize(p.z)) << 2);
            (code, i)
        })
        .collect();
    order.sort_unstable();
    order.into_iter().map(|(_, i)| i).collect()
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    v: [usize; 4],
    n: [Option<usize>; 4],
    alive: bool,
}

/// A cavity boundary face and the tetrahedron it will become.
#[derive(Debug, Clone, Copy)]
struct CavityFace {
    /// Vertices of the new tetrahedron; `v[apex]` is the inserted point.
    v: [usize; 4],
    apex: usize,
    /// Neighbor across the face and the slot in it that points back.
    outside: Option<(usize, usize)>,
}

struct Builder {
    points: Vec<Point3<f64>>,
    input_len: usize,
    cells: Vec<Cell>,
    free: Vec<usize>,
    mark: Vec<u32>,
    stamp: u32,
    last: usize,
    edge_links: HashMap<(usize, usize), (usize, usize)>,
    skipped: usize,
}

impl Builder {
    fn new(local: &[Point3<f64>]) -> Self {
        let input_len = local.len();
        let mut points = local.to_vec();

        let m = SUPER_SCALE;
        let mut v = [input_len, input_len + 1, input_len + 2, input_len + 3];
        points.push(Point3::new(-m, -m, -m));
        points.push(Point3::new(5.0 * m, -m, -m));
        points.push(Point3::new(-m, 5.0 * m, -m));
        points.push(Point3::new(-m, -m, 5.0 * m));

        let mut builder = Self {
            points,
            input_len,
            cells: Vec::new(),
            free: Vec::new(),
            mark: Vec::new(),
            stamp: 0,
            last: 0,
            edge_links: HashMap::new(),
            skipped: 0,
        };
        if builder.orientation(v) < 0.0 {
            v.swap(0, 1);
        }
        builder.alloc(Cell {
            v,
            n: [None; 4],
            alive: true,
        });
        builder
    }

    fn orientation(&self, v: [usize; 4]) -> f64 {
        let [a, b, c, d] = v.map(|i| &self.points[i]);
        orient3d(a, b, c, d)
    }

    fn conflicts(&self, t: usize, p: usize) -> bool {
        let [a, b, c, d] = self.cells[t].v.map(|i| &self.points[i]);
        insphere(a, b, c, d, &self.points[p]) * orient3d(a, b, c, d) > 0.0
    }

    fn alloc(&mut self, cell: Cell) -> usize {
        if let Some(id) = self.free.pop() {
            self.cells[id] = cell;
            id
        } else {
            self.cells.push(cell);
            self.mark.push(0);
            self.cells.len() - 1
        }
    }

    /// Visibility walk from the last created cell.
    fn walk(&self, p: usize) -> Option<usize> {
        let mut t = self.last;
        if !self.cells.get(t)?.alive {
            return None;
        }

        for step in 0..self.cells.len() {
            let cell = &self.cells[t];
            let mut next = None;
            for k in 0..4 {
                let i = (k + step) % 4;
                let mut v = cell.v;
                v[i] = p;
                if self.orientation(v) < 0.0 {
                    next = Some(cell.n[i]?);
                    break;
                }
            }
            match next {
                Some(n) => t = n,
                None => return Some(t),
            }
        }
        None
    }

    fn locate(&self, p: usize) -> Option<usize> {
        self.walk(p).or_else(|| {
            (0..self.cells.len()).find(|&t| self.cells[t].alive && self.conflicts(t, p))
        })
    }

    fn insert(&mut self, p: usize) {
        let Some(seed) = self.locate(p) else {
            self.skipped += 1;
            return;
        };

        let q = self.points[p];
        let duplicate = self.cells[seed]
            .v
            .iter()
            .any(|&v| v < self.input_len && (self.points[v] - q).norm() < DUPLICATE_TOLERANCE);
        if duplicate {
            self.skipped += 1;
            return;
        }

        self.stamp = self.stamp.wrapping_add(1);
        let stamp = self.stamp;

        let mut cavity = vec![seed];
        self.mark[seed] = stamp;
        let mut stack = vec![seed];
        while let Some(t) = stack.pop() {
            for nb in self.cells[t].n.into_iter().flatten() {
                if self.mark[nb] != stamp && self.conflicts(nb, p) {
                    self.mark[nb] = stamp;
                    cavity.push(nb);
                    stack.push(nb);
                }
            }
        }

        let boundary = self.cavity_boundary(&mut cavity, p, stamp);

        for &t in &cavity {
            self.cells[t].alive = false;
            self.free.push(t);
        }

        self.edge_links.clear();
        for face in boundary {
            let id = self.alloc(Cell {
                v: face.v,
                n: [None; 4],
                alive: true,
            });

            if let Some((nb, slot)) = face.outside {
                self.cells[id].n[face.apex] = Some(nb);
                self.cells[nb].n[slot] = Some(id);
            }

            for k in (0..4).filter(|&k| k != face.apex) {
                let mut rest = (0..4).filter(|&m| m != k && m != face.apex).map(|m| face.v[m]);
                let (Some(a), Some(b)) = (rest.next(), rest.next()) else {
                    continue;
                };
                let key = (a.min(b), a.max(b));
                if let Some((other, other_k)) = self.edge_links.remove(&key) {
                    self.cells[id].n[k] = Some(other);
                    self.cells[other].n[other_k] = Some(id);
                } else {
                    self.edge_links.insert(key, (id, k));
                }
            }

            self.last = id;
        }
    }

    /// Collect the cavity boundary, growing the cavity until every new
    /// tetrahedron is positively oriented.
    fn cavity_boundary(
        &mut self,
        cavity: &mut Vec<usize>,
        p: usize,
        stamp: u32,
    ) -> Vec<CavityFace> {
        let mut boundary = Vec::new();
        for _ in 0..MAX_REPAIR_ROUNDS {
            boundary.clear();
            let mut grow = Vec::new();

            for &t in cavity.iter() {
                let cell = self.cells[t];
                for i in 0..4 {
                    let outside = cell.n[i];
                    if outside.is_some_and(|nb| self.mark[nb] == stamp) {
                        continue;
                    }
                    let mut v = cell.v;
                    v[i] = p;
                    if let Some(nb) = outside {
                        if self.orientation(v) <= 0.0 {
                            grow.push(nb);
                        }
                    }
                    let outside = outside.and_then(|nb| {
                        let slot = self.cells[nb].n.iter().position(|&s| s == Some(t))?;
                        Some((nb, slot))
                    });
                    boundary.push(CavityFace {
                        v,
                        apex: i,
                        outside,
                    });
                }
            }

            if grow.is_empty() {
                break;
            }
            for nb in grow {
                if self.mark[nb] != stamp {
                    self.mark[nb] = stamp;
                    cavity.push(nb);
                }
            }
        }
        boundary
    }

    /// Drop super-vertex cells and compact the rest.
    fn finish(self) -> Vec<Tetrahedron> {
        let mut remap = vec![None; self.cells.len()];
        let mut kept = Vec::new();
        for (id, cell) in self.cells.iter().enumerate() {
            if cell.alive && cell.v.iter().all(|&v| v < self.input_len) {
                remap[id] = Some(kept.len());
                kept.push(id);
            }
        }

        kept.iter()
            .map(|&id| {
                let cell = &self.cells[id];
                Tetrahedron {
                    vertices: cell.v,
                    neighbors: cell.n.map(|n| n.and_then(|n| remap[n])),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn volume(points: &[Point3<f64>], t: &Tetrahedron) -> f64 {
        let [a, b, c, d] = t.vertices.map(|v| &points[v]);
        orient3d(a, b, c, d) / 6.0
    }

    fn pseudo_random_points(n: usize, seed: u64) -> Vec<Point3<f64>> {
        let unit = |h: u64| (h >> 11) as f64 / (1_u64 << 53) as f64;
        (0..n as u64)
            .map(|i| {
                let s = seed.wrapping_add(i * 7);
                Point3::new(
                    unit(splitmix64(s)),
                    unit(splitmix64(s + 1)),
                    unit(splitmix64(s + 2)),
                )
            })
            .collect()
    }

    fn cube_corners() -> Vec<Point3<f64>> {
        (0..8)
            .map(|i: u32| {
                let bit = |b: u32| f64::from((i >> b) & 1);
                Point3::new(bit(0), bit(1), bit(2))
            })
            .collect()
    }

    fn assert_adjacency_consistent(tets: &Tetrahedralization) {
        for (t, tet) in tets.tetrahedra().iter().enumerate() {
            for i in 0..4 {
                if let Some(n) = tet.neighbors[i] {
                    let other = &tets.tetrahedra()[n];
                    let j = other.neighbors.iter().position(|&x| x == Some(t)).unwrap();
                    let mut a = tet.face(i);
                    let mut b = other.face(j);
                    a.sort_unstable();
                    b.sort_unstable();
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn too_few_points() {
        let pts = vec![Point3::origin(); 3];
        assert!(matches!(
            Tetrahedralization::build(&pts),
            Err(ReconstructError::InsufficientPoints { actual: 3, .. })
        ));
    }

    #[test]
    fn coplanar_points_are_degenerate() {
        let pts: Vec<_> = (0..10)
            .map(|i| Point3::new(f64::from(i), f64::from(i * i % 7), 2.0))
            .collect();
        assert!(matches!(
            Tetrahedralization::build(&pts),
            Err(ReconstructError::Degenerate { .. })
        ));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let pts: Vec<_> = (0..5).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect();
        assert!(matches!(
            Tetrahedralization::build(&pts),
            Err(ReconstructError::Degenerate { .. })
        ));
    }

    #[test]
    fn single_tetrahedron() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let tets = Tetrahedralization::build(&pts).unwrap();
        assert_eq!(tets.len(), 1);
        assert!(tets.tetrahedra()[0].neighbors.iter().all(Option::is_none));
        assert_relative_eq!(
            tets.circumradius(0).unwrap(),
            3.0_f64.sqrt() / 2.0,
            epsilon = 1e-6
        );
        assert_eq!(tets.circumradius(1), None);
    }

    #[test]
    fn cube_fills_its_volume() {
        let mut pts = cube_corners();
        pts.push(Point3::new(0.5, 0.5, 0.5));
        let tets = Tetrahedralization::build(&pts).unwrap();

        let total: f64 = tets.tetrahedra().iter().map(|t| volume(&pts, t)).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        assert_adjacency_consistent(&tets);
    }

    #[test]
    fn random_points_are_delaunay() {
        let mut pts = cube_corners();
        pts.extend(pseudo_random_points(300, 42));
        let tets = Tetrahedralization::build(&pts).unwrap();

        let total: f64 = tets.tetrahedra().iter().map(|t| volume(&pts, t)).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        assert_adjacency_consistent(&tets);

        for t in tets.tetrahedra() {
            assert!(volume(&pts, t) > -1e-12);
            let [a, b, c, d] = t.vertices.map(|v| &tets.local[v]);
            for n in t.neighbors.iter().flatten() {
                let other = &tets.tetrahedra()[*n];
                let opposite = other
                    .vertices
                    .iter()
                    .find(|v| !t.vertices.contains(v))
                    .unwrap();
                let e = &tets.local[*opposite];
                // Allow rounding noise on near co-spherical neighbors
                assert!(insphere(a, b, c, d, e) * orient3d(a, b, c, d) <= 1e-12);
            }
        }
    }

    #[test]
    fn grid_points_build() {
        let mut pts = Vec::new();
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..5 {
                    pts.push(Point3::new(f64::from(x), f64::from(y), f64::from(z)) * 0.05);
                }
            }
        }
        let tets = Tetrahedralization::build(&pts).unwrap();
        let total: f64 = tets.tetrahedra().iter().map(|t| volume(&pts, t)).sum();
        assert_relative_eq!(total, 0.2_f64.powi(3), epsilon = 1e-6);
        assert_adjacency_consistent(&tets);
    }

    #[test]
    fn duplicates_are_skipped() {
        let mut pts = cube_corners();
        pts.push(Point3::new(1.0, 1.0, 1.0));
        let tets = Tetrahedralization::build(&pts).unwrap();
        assert_eq!(tets.skipped_duplicates(), 1);
    }

    #[test]
    fn morton_spread() {
        assert_eq!(spread_bits(0b11), 0b1001);
        assert_eq!(spread_bits(0x3ff).count_ones(), 10);
    }
}
