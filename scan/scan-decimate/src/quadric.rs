//! Quadric error metric.
//!
//! A quadric accumulates squared distances to a set of planes. Summing the
//! quadrics of two vertices gives the cost of merging them at any position.

use nalgebra::{Point3, Vector3};

/// Symmetric 4x4 quadric stored as its upper triangle.
///
/// ```text
/// [a b c d]
/// [  e f g]
/// [    h i]
/// [      j]
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadric {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
    j: f64,
}

impl Quadric {
    /// Quadric of the plane `n . x + d = 0`; `n` must be unit length.
    #[must_use]
    pub fn from_plane(n: &Vector3<f64>, d: f64) -> Self {
        Self {
            a: n.x * n.x,
            b: n.x * n.y,
            c: n.x * n.z,
            d: n.x * d,
            e: n.y * n.y,
            f: n.y * n.z,
            g: n.y * d,
            h: n.z * n.z,
            i: n.z * d,
            j: d * d,
        }
    }

    /// Quadric of the plane through `p` with unit normal `n`.
    #[must_use]
    pub fn from_point_normal(p: &Point3<f64>, n: &Vector3<f64>) -> Self {
        Self::from_plane(n, -n.dot(&p.coords))
    }

    /// Add another quadric to this one.
    pub fn add(&mut self, other: &Self) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
        self.d += other.d;
        self.e += other.e;
        self.f += other.f;
        self.g += other.g;
        self.h += other.h;
        self.i += other.i;
        self.j += other.j;
    }

    /// Sum of two quadrics.
    #[must_use]
    pub fn combined(&self, other: &Self) -> Self {
        let mut q = *self;
        q.add(other);
        q
    }

    /// Scale every coefficient.
    #[must_use]
    pub fn scaled(mut self, s: f64) -> Self {
        self.a *= s;
        self.b *= s;
        self.c *= s;
        self.d *= s;
        self.e *= s;
        self.f *= s;
        self.g *= s;
        self.h *= s;
        self.i *= s;
        self.j *= s;
        self
    }

    /// Sum of squared plane distances at `p` (`v^T Q v` with `v = [p, 1]`).
    #[must_use]
    pub fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        x.mul_add(
            x.mul_add(self.a, 2.0 * y.mul_add(self.b, z.mul_add(self.c, self.d))),
            y.mul_add(
                y.mul_add(self.e, 2.0 * z.mul_add(self.f, self.g)),
                z.mul_add(z.mul_add(self.h, 2.0 * self.i), self.j),
            ),
        )
    }

    /// The point of minimum error, or `None` if the 3x3 system is singular.
    #[must_use]
    pub fn optimal_point(&self) -> Option<Point3<f64>> {
        // [a b c] [x]   [-d]
        // [b e f] [y] = [-g]
        // [c f h] [z]   [-i]
        let det = self.a.mul_add(
            self.f.mul_add(-self.f, self.e * self.h),
            self.b.mul_add(
                self.c.mul_add(self.f, -self.b * self.h),
                self.c * self.e.mul_add(-self.c, self.b * self.f),
            ),
        );

        if det.abs() < 1e-10 {
            return None;
        }

        let inv_det = 1.0 / det;

        let m00 = self.f.mul_add(-self.f, self.e * self.h) * inv_det;
        let m01 = self.c.mul_add(self.f, -self.b * self.h) * inv_det;
        let m02 = self.c.mul_add(-self.e, self.b * self.f) * inv_det;
        let m11 = self.c.mul_add(-self.c, self.a * self.h) * inv_det;
        let m12 = self.b.mul_add(self.c, -self.a * self.f) * inv_det;
        let m22 = self.b.mul_add(-self.b, self.a * self.e) * inv_det;

        let x = m00.mul_add(-self.d, m01.mul_add(-self.g, m02 * -self.i));
        let y = m01.mul_add(-self.d, m11.mul_add(-self.g, m12 * -self.i));
        let z = m02.mul_add(-self.d, m12.mul_add(-self.g, m22 * -self.i));

        let p = Point3::new(x, y, z);
        p.coords.iter().all(|c| c.is_finite()).then_some(p)
    }
}
