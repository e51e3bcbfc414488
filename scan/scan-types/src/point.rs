//! Scan samples and their colors.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RGB color with 8-bit components, as stored in scanner exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordColor {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
}

impl RecordColor {
    /// Create a new color from RGB components.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::RecordColor;
    ///
    /// let red = RecordColor::new(255, 0, 0);
    /// assert_eq!(red.r, 255);
    /// ```
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Neutral mid-grey used when a sample carries no color.
    pub const NEUTRAL: Self = Self::new(128, 128, 128);

    /// Black color (0, 0, 0).
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// White color (255, 255, 255).
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Convert to floating point channels in the [0, 1] range.
    ///
    /// Each channel is divided by 255.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::RecordColor;
    ///
    /// let c = RecordColor::new(255, 0, 51).normalized();
    /// assert!((c.x - 1.0).abs() < 1e-12);
    /// assert!((c.z - 0.2).abs() < 1e-12);
    /// ```
    #[inline]
    #[must_use]
    pub fn normalized(self) -> Vector3<f64> {
        Vector3::new(
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }

    /// Convert normalized channels back to 8-bit, rounding to nearest.
    ///
    /// Values are clamped to [0, 1] first.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Truncation and sign loss are safe: values are clamped before scaling
    pub fn from_normalized(color: &Vector3<f64>) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(color.x), channel(color.y), channel(color.z))
    }
}

impl Default for RecordColor {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A single parsed scan sample.
///
/// Records are immutable once parsed; stages copy their values into the
/// columnar [`PointCloud`](crate::PointCloud) buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointRecord {
    /// Position in scanner coordinates.
    pub position: Point3<f64>,
    /// 8-bit color.
    pub color: RecordColor,
}

impl PointRecord {
    /// Create a record from a position and color.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>, color: RecordColor) -> Self {
        Self { position, color }
    }

    /// Create a record with the neutral color.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::{PointRecord, RecordColor, Point3};
    ///
    /// let record = PointRecord::from_position(Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(record.color, RecordColor::NEUTRAL);
    /// ```
    #[inline]
    #[must_use]
    pub const fn from_position(position: Point3<f64>) -> Self {
        Self::new(position, RecordColor::NEUTRAL)
    }

    /// Create a record from raw coordinates and channels.
    #[inline]
    #[must_use]
    pub fn from_raw(x: f64, y: f64, z: f64, r: u8, g: u8, b: u8) -> Self {
        Self::new(Point3::new(x, y, z), RecordColor::new(r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_divides_by_255() {
        let c = RecordColor::new(0, 255, 0).normalized();
        assert!(c.x.abs() < f64::EPSILON);
        assert!((c.y - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn from_normalized_rounds_and_clamps() {
        let c = RecordColor::from_normalized(&Vector3::new(0.5, 1.5, -0.2));
        assert_eq!(c, RecordColor::new(128, 255, 0));
    }

    #[test]
    fn default_color_is_neutral() {
        assert_eq!(RecordColor::default(), RecordColor::NEUTRAL);
    }
}
