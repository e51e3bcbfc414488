//! Top-down floor plan images from scan point clouds.
//!
//! The floor is taken to be every point within [`FLOOR_BAND_HEIGHT`] of the
//! lowest point (Y is vertical). Those points are projected onto the X/Z
//! plane, scaled uniformly into the canvas minus its margin, and drawn as
//! black dots on white.
//!
//! # Example
//!
//! ```
//! use scan_floorplan::{FloorPlanParams, rasterize};
//! use scan_types::{Point3, PointCloud};
//!
//! let cloud = PointCloud::from_positions(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(4.0, 0.1, 3.0),
//!     Point3::new(2.0, 2.5, 1.0), // ceiling, not drawn
//! ]);
//!
//! let plan = rasterize(&cloud, &FloorPlanParams::default()).unwrap().unwrap();
//! assert_eq!(plan.marked_count(), 2);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod canvas;
mod error;
mod params;
mod raster;

pub use canvas::FloorPlanImage;
pub use error::{FloorPlanError, FloorPlanResult};
pub use params::FloorPlanParams;
pub use raster::{
    FLOOR_BAND_HEIGHT, FloorPlanStats, RasterizedFloorPlan, floor_band, rasterize,
    rasterize_with_stats,
};
