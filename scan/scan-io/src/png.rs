//! Floor plan PNG output.

use std::path::Path;

use image::ImageFormat;
use scan_floorplan::FloorPlanImage;
use tracing::debug;

use crate::error::IoResult;

/// Save a floor plan as a PNG file.
///
/// # Errors
///
/// Returns an error if the file cannot be encoded or written.
pub fn save_floor_plan_png<P: AsRef<Path>>(plan: &FloorPlanImage, path: P) -> IoResult<()> {
    let path = path.as_ref();
    plan.as_rgb_image().save_with_format(path, ImageFormat::Png)?;
    debug!(path = %path.display(), width = plan.width(), height = plan.height(), "wrote floor plan");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_floorplan::{FloorPlanParams, rasterize};
    use scan_types::{Point3, PointCloud};

    #[test]
    fn png_matches_canvas() {
        let cloud = PointCloud::from_positions(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
        ]);
        let params = FloorPlanParams::new(320, 240).with_margin(10);
        let plan = rasterize(&cloud, &params).unwrap().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floor_plan.png");
        save_floor_plan_png(&plan, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (320, 240));
        assert_eq!(&decoded, plan.as_rgb_image());
    }
}
