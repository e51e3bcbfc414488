//! Geometric predicates for the tetrahedralization.
//!
//! Plain floating-point evaluations of the classic determinant forms. Inputs
//! are expected in a normalized local frame with a tiny perturbation applied,
//! which keeps exact ties rare enough for the builder to repair the rest.

use nalgebra::{Point3, Vector3};

/// Six times the signed volume of `(a, b, c, d)`.
///
/// Positive when `d` lies below the plane through `a`, `b`, `c`, where
/// "below" means `a`, `b`, `c` appear counterclockwise seen from above.
#[inline]
pub(crate) fn orient3d(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let ad = a - d;
    let bd = b - d;
    let cd = c - d;
    ad.dot(&bd.cross(&cd))
}

/// Positive when `e` lies inside the sphere through `a`, `b`, `c`, `d`,
/// provided `orient3d(a, b, c, d) > 0`. The sign flips for negatively
/// oriented input.
#[inline]
#[allow(clippy::suboptimal_flops)]
pub(crate) fn insphere(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
    e: &Point3<f64>,
) -> f64 {
    let ae = a - e;
    let be = b - e;
    let ce = c - e;
    let de = d - e;

    let ab = ae.x * be.y - be.x * ae.y;
    let bc = be.x * ce.y - ce.x * be.y;
    let cd = ce.x * de.y - de.x * ce.y;
    let da = de.x * ae.y - ae.x * de.y;
    let ac = ae.x * ce.y - ce.x * ae.y;
    let bd = be.x * de.y - de.x * be.y;

    let abc = ae.z * bc - be.z * ac + ce.z * ab;
    let bcd = be.z * cd - ce.z * bd + de.z * bc;
    let cda = ce.z * da + de.z * ac + ae.z * cd;
    let dab = de.z * ab + ae.z * bd + be.z * da;

    let alift = ae.norm_squared();
    let blift = be.norm_squared();
    let clift = ce.norm_squared();
    let dlift = de.norm_squared();

    (dlift * abc - clift * dab) + (blift * cda - alift * bcd)
}

/// Circumcenter offset from `a` of the tetrahedron `(a, b, c, d)`.
///
/// Returns `None` when the tetrahedron is flat.
pub(crate) fn circumcenter_offset(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Option<Vector3<f64>> {
    let u = b - a;
    let v = c - a;
    let w = d - a;

    let vw = v.cross(&w);
    let denom = 2.0 * u.dot(&vw);
    if denom.abs() <= f64::MIN_POSITIVE {
        return None;
    }

    let num =
        vw * u.norm_squared() + w.cross(&u) * v.norm_squared() + u.cross(&v) * w.norm_squared();
    let offset = num / denom;
    offset.iter().all(|x| x.is_finite()).then_some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corner_tet() -> [Point3<f64>; 4] {
        [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn orientation_sign() {
        let [a, b, c, d] = corner_tet();
        assert_relative_eq!(orient3d(&a, &b, &c, &d), 1.0);
        assert_relative_eq!(orient3d(&b, &a, &c, &d), -1.0);
        let on_plane = Point3::new(1.0, 1.0, 1.0) * (1.0 / 3.0);
        assert_relative_eq!(orient3d(&a, &b, &c, &on_plane), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn insphere_inside_and_outside() {
        let [a, b, c, d] = corner_tet();
        let inside = Point3::new(0.25, 0.25, 0.25);
        let outside = Point3::new(2.0, 2.0, 2.0);
        assert_relative_eq!(insphere(&a, &b, &c, &d, &inside), 0.5625);
        assert!(insphere(&a, &b, &c, &d, &outside) < 0.0);

        // Swapping two vertices flips both signs
        let o = orient3d(&b, &a, &c, &d);
        assert!(insphere(&b, &a, &c, &d, &inside) * o > 0.0);
    }

    #[test]
    fn cospherical_point_is_zero() {
        let [a, b, c, d] = corner_tet();
        let on = Point3::new(1.0, 1.0, 1.0);
        assert_relative_eq!(insphere(&a, &b, &c, &d, &on), 0.0);
    }

    #[test]
    fn circumcenter_of_corner_tet() {
        let [a, b, c, d] = corner_tet();
        let offset = circumcenter_offset(&d, &a, &b, &c).unwrap();
        assert_relative_eq!(offset, Vector3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
        assert_relative_eq!(offset.norm(), 3.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_tet_has_no_circumcenter() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(1.0, 1.0, 0.0);
        assert!(circumcenter_offset(&a, &b, &c, &d).is_none());
    }
}
