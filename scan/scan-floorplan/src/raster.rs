//! Floor band extraction and top-down projection.

use std::fmt;

use nalgebra::Point3;
use scan_types::PointCloud;
use tracing::{debug, info, warn};

use crate::error::FloorPlanResult;
use crate::canvas::FloorPlanImage;
use crate::params::FloorPlanParams;

/// Height above the lowest point that counts as floor, in scan units.
pub const FLOOR_BAND_HEIGHT: f64 = 1.0;

/// Statistics from rasterizing a floor plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorPlanStats {
    /// Points inside the floor band.
    pub floor_points: usize,

    /// Pixels per scan unit.
    pub scale: f64,

    /// Pixel distance between the outermost plotted points, as (x, z).
    pub plotted_extent: (u32, u32),
}

impl fmt::Display for FloorPlanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Floor plan: {} points, scale {:.3} px/unit, extent {}x{} px",
            self.floor_points, self.scale, self.plotted_extent.0, self.plotted_extent.1
        )
    }
}

/// A rendered floor plan with its statistics.
#[derive(Debug, Clone)]
pub struct RasterizedFloorPlan {
    /// The rendered canvas.
    pub image: FloorPlanImage,

    /// How the canvas was produced.
    pub stats: FloorPlanStats,
}

/// Positions whose Y lies strictly below the lowest Y plus `band`.
///
/// # Example
///
/// ```
/// use scan_floorplan::floor_band;
/// use scan_types::{Point3, PointCloud};
///
/// let cloud = PointCloud::from_positions(
///     [0.0, 0.5, 1.5, 2.0].iter().map(|&y| Point3::new(0.0, y, 0.0)).collect(),
/// );
/// let floor = floor_band(&cloud, 1.0);
/// assert_eq!(floor.len(), 2);
/// ```
#[must_use]
pub fn floor_band(cloud: &PointCloud, band: f64) -> Vec<Point3<f64>> {
    let y_min = cloud
        .positions()
        .iter()
        .map(|p| p.y)
        .fold(f64::INFINITY, f64::min);
    let ceiling = y_min + band;

    cloud
        .positions()
        .iter()
        .filter(|p| p.y < ceiling)
        .copied()
        .collect()
}

/// Render the floor band of `cloud` as a top-down image.
///
/// Returns `Ok(None)` when the cloud has no points.
///
/// # Errors
///
/// Returns [`FloorPlanError::InvalidCanvas`](crate::FloorPlanError::InvalidCanvas)
/// if the canvas is not larger than twice its margin.
pub fn rasterize(
    cloud: &PointCloud,
    params: &FloorPlanParams,
) -> FloorPlanResult<Option<FloorPlanImage>> {
    Ok(rasterize_with_stats(cloud, params)?.map(|plan| plan.image))
}

/// Like [`rasterize`], also returning [`FloorPlanStats`].
///
/// Floor points are projected onto X/Z and scaled uniformly so the larger
/// relative side fills the drawable area. A side with zero extent
/// contributes a scale of 1.
///
/// # Errors
///
/// Returns [`FloorPlanError::InvalidCanvas`](crate::FloorPlanError::InvalidCanvas)
/// if the canvas is not larger than twice its margin.
pub fn rasterize_with_stats(
    cloud: &PointCloud,
    params: &FloorPlanParams,
) -> FloorPlanResult<Option<RasterizedFloorPlan>> {
    let (drawable_w, drawable_h) = params.drawable_area()?;

    let floor = floor_band(cloud, FLOOR_BAND_HEIGHT);
    if floor.is_empty() {
        warn!("no floor points, skipping floor plan");
        return Ok(None);
    }

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut z_min, mut z_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in &floor {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        z_min = z_min.min(p.z);
        z_max = z_max.max(p.z);
    }

    let scale = axis_scale(drawable_w, x_max - x_min).min(axis_scale(drawable_h, z_max - z_min));
    debug!(x_min, x_max, z_min, z_max, scale, "floor band bounds");

    let margin = i64::from(params.margin);
    let mut image = FloorPlanImage::blank(params.width, params.height);
    let (mut px_lo, mut px_hi) = (i64::MAX, i64::MIN);
    let (mut pz_lo, mut pz_hi) = (i64::MAX, i64::MIN);

    for p in &floor {
        let px = margin + to_pixel((p.x - x_min) * scale);
        let pz = margin + to_pixel((p.z - z_min) * scale);
        image.fill_disc(px, pz, params.dot_radius);

        px_lo = px_lo.min(px);
        px_hi = px_hi.max(px);
        pz_lo = pz_lo.min(pz);
        pz_hi = pz_hi.max(pz);
    }

    let stats = FloorPlanStats {
        floor_points: floor.len(),
        scale,
        plotted_extent: (
            u32::try_from(px_hi - px_lo).unwrap_or(u32::MAX),
            u32::try_from(pz_hi - pz_lo).unwrap_or(u32::MAX),
        ),
    };
    info!(
        floor_points = stats.floor_points,
        scale = stats.scale,
        "floor plan rasterized"
    );

    Ok(Some(RasterizedFloorPlan { image, stats }))
}

fn axis_scale(drawable: u32, extent: f64) -> f64 {
    if extent > 0.0 {
        f64::from(drawable) / extent
    } else {
        1.0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel(offset: f64) -> i64 {
    offset.floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FloorPlanError;
    use approx::assert_relative_eq;

    fn cloud(points: &[(f64, f64, f64)]) -> PointCloud {
        PointCloud::from_positions(points.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect())
    }

    #[test]
    fn band_keeps_points_below_threshold() {
        let c = cloud(&[(0.0, 0.0, 0.0), (0.0, 0.5, 0.0), (0.0, 1.5, 0.0), (0.0, 2.0, 0.0)]);
        let ys: Vec<f64> = floor_band(&c, FLOOR_BAND_HEIGHT).iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.5]);
    }

    #[test]
    fn band_is_relative_to_lowest_point() {
        let c = cloud(&[(0.0, -3.0, 0.0), (0.0, -2.0, 0.0), (0.0, -2.5, 0.0)]);
        assert_eq!(floor_band(&c, 1.0).len(), 2);
    }

    #[test]
    fn empty_cloud_has_no_plan() {
        let result = rasterize(&PointCloud::new(), &FloorPlanParams::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn invalid_canvas_is_rejected_before_drawing() {
        let params = FloorPlanParams::new(100, 100).with_margin(50);
        let err = rasterize(&PointCloud::new(), &params).unwrap_err();
        assert!(matches!(err, FloorPlanError::InvalidCanvas { .. }));
    }

    #[test]
    fn corners_land_on_drawable_area() {
        let c = cloud(&[(0.0, 0.0, 0.0), (4.0, 0.0, 2.0)]);
        let plan = rasterize_with_stats(&c, &FloorPlanParams::default()).unwrap().unwrap();

        assert_relative_eq!(plan.stats.scale, 175.0);
        assert_eq!(plan.stats.plotted_extent, (700, 350));
        assert!(plan.image.is_marked(50, 50));
        assert!(plan.image.is_marked(750, 400));
        assert_eq!(plan.image.marked_count(), 2);
    }

    #[test]
    fn aspect_ratio_matches_source() {
        let c = cloud(&[(1.0, 0.0, 1.0), (2.0, 0.0, 7.0), (4.0, 0.2, 3.0), (1.5, 0.1, 2.0)]);
        let params = FloorPlanParams::new(640, 480).with_margin(20);
        let plan = rasterize_with_stats(&c, &params).unwrap().unwrap();

        let (w, h) = plan.stats.plotted_extent;
        let source = 3.0 / 6.0;
        let plotted = f64::from(w) / f64::from(h);
        assert!((plotted - source).abs() < 0.01, "{plotted} vs {source}");
        assert!(h >= 439);
    }

    #[test]
    fn single_point_uses_unit_scale() {
        let c = cloud(&[(3.0, 0.0, 3.0)]);
        let plan = rasterize_with_stats(&c, &FloorPlanParams::default()).unwrap().unwrap();
        assert_relative_eq!(plan.stats.scale, 1.0);
        assert!(plan.image.is_marked(50, 50));
    }

    #[test]
    fn points_above_band_are_not_drawn() {
        let c = cloud(&[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0), (0.5, 2.5, 0.5)]);
        let plan = rasterize_with_stats(&c, &FloorPlanParams::default()).unwrap().unwrap();
        assert_eq!(plan.stats.floor_points, 2);
        assert_eq!(plan.image.marked_count(), 2);
    }

    #[test]
    fn dots_have_radius() {
        let c = cloud(&[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0)]);
        let params = FloorPlanParams::default().with_dot_radius(1);
        let plan = rasterize_with_stats(&c, &params).unwrap().unwrap();
        assert_eq!(plan.image.marked_count(), 10);
        assert!(plan.image.is_marked(49, 50));
    }
}
