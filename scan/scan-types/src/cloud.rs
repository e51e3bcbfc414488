//! Columnar point cloud storage.
//!
//! A [`PointCloud`] keeps positions and normalized colors in two parallel
//! buffers. The buffers are private so that every mutation keeps them the
//! same length.

use std::fmt;

use nalgebra::{Point3, Vector3};

use crate::{Aabb, PointRecord, TypesError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered scan samples held as parallel position/color buffers.
///
/// Colors are stored normalized to `[0, 1]`.
///
/// # Example
///
/// ```
/// use scan_types::{PointCloud, PointRecord};
///
/// let mut cloud = PointCloud::with_capacity(2);
/// cloud.push(PointRecord::from_raw(0.0, 0.0, 0.0, 255, 0, 0));
/// cloud.push(PointRecord::from_raw(1.0, 0.0, 0.0, 0, 255, 0));
///
/// assert_eq!(cloud.len(), 2);
/// assert_eq!(cloud.positions().len(), cloud.colors().len());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloud {
    positions: Vec<Point3<f64>>,
    colors: Vec<Vector3<f64>>,
}

impl PointCloud {
    /// Creates an empty point cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Creates a point cloud with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Builds a cloud from existing buffers.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::LengthMismatch`] if the buffers differ in length.
    pub fn from_parts(
        positions: Vec<Point3<f64>>,
        colors: Vec<Vector3<f64>>,
    ) -> Result<Self, TypesError> {
        if positions.len() != colors.len() {
            return Err(TypesError::LengthMismatch {
                positions: positions.len(),
                colors: colors.len(),
            });
        }
        Ok(Self { positions, colors })
    }

    /// Builds a cloud from positions only; every point gets the neutral color.
    #[must_use]
    pub fn from_positions(positions: Vec<Point3<f64>>) -> Self {
        let neutral = crate::RecordColor::NEUTRAL.normalized();
        let colors = vec![neutral; positions.len()];
        Self { positions, colors }
    }

    /// Splits the cloud into its position and color buffers.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
        (self.positions, self.colors)
    }

    /// Returns the number of points in the cloud.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position buffer.
    #[must_use]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Normalized color buffer, parallel to [`Self::positions`].
    #[must_use]
    pub fn colors(&self) -> &[Vector3<f64>] {
        &self.colors
    }

    /// Iterates over `(position, color)` pairs.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Point3<f64>, &Vector3<f64>)> {
        self.positions.iter().zip(self.colors.iter())
    }

    /// Appends a parsed record, normalizing its color.
    pub fn push(&mut self, record: PointRecord) {
        self.positions.push(record.position);
        self.colors.push(record.color.normalized());
    }

    /// Appends a point whose color is already normalized.
    pub fn push_normalized(&mut self, position: Point3<f64>, color: Vector3<f64>) {
        self.positions.push(position);
        self.colors.push(color);
    }

    /// Moves every point of `other` to the end of this cloud.
    ///
    /// `other` is consumed; its buffers are freed when this returns.
    pub fn append(&mut self, other: Self) {
        let (mut positions, mut colors) = other.into_parts();
        self.positions.append(&mut positions);
        self.colors.append(&mut colors);
    }

    /// Reserves capacity for at least `additional` more points.
    pub fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.colors.reserve(additional);
    }

    /// Returns the axis-aligned bounding box, or `None` if the cloud is empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        if self.is_empty() {
            return None;
        }
        Some(Aabb::from_points(self.positions.iter()))
    }

    /// Returns the arithmetic mean of all positions.
    ///
    /// Returns `None` if the cloud is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::{PointCloud, Point3};
    ///
    /// let cloud = PointCloud::from_positions(vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(2.0, 4.0, 6.0),
    /// ]);
    /// let c = cloud.centroid().unwrap();
    /// assert!((c.point().y - 2.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn centroid(&self) -> Option<Centroid> {
        if self.is_empty() {
            return None;
        }

        let sum: Vector3<f64> = self.positions.iter().map(|p| p.coords).sum();

        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.positions.len() as f64;

        Some(Centroid(Point3::from(mean)))
    }
}

impl FromIterator<PointRecord> for PointCloud {
    fn from_iter<I: IntoIterator<Item = PointRecord>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut cloud = Self::with_capacity(iter.size_hint().0);
        for record in iter {
            cloud.push(record);
        }
        cloud
    }
}

impl Extend<PointRecord> for PointCloud {
    fn extend<I: IntoIterator<Item = PointRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// The arithmetic mean of a cloud's positions.
///
/// Its [`Display`](fmt::Display) form is the persisted side artifact,
/// `center = [x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Centroid(pub Point3<f64>);

impl Centroid {
    /// The centroid as a point.
    #[must_use]
    pub const fn point(&self) -> &Point3<f64> {
        &self.0
    }
}

impl From<Point3<f64>> for Centroid {
    fn from(point: Point3<f64>) -> Self {
        Self(point)
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "center = [{:?}, {:?}, {:?}]", self.0.x, self.0.y, self.0.z)
    }
}
