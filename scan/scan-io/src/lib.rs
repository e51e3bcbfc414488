//! Output writers for scan processing.
//!
//! - **PLY** - Colored point clouds and triangle meshes, ASCII or binary
//! - **PNG** - Floor plan images
//! - **Centroid** - The one-line `center_coordinates.txt` artifact
//! - **Manifest** - `scenes.json`, the list of processed scans
//! - **TrueView** - Camera centers from panorama exports
//!
//! # Example
//!
//! ```no_run
//! use scan_io::{save_mesh_ply, write_centroid};
//! use scan_types::{Centroid, Point3, TriangleMesh};
//!
//! let mesh = TriangleMesh::new();
//! save_mesh_ply(&mesh, "output_mesh.ply", true).unwrap();
//!
//! let center = Centroid(Point3::new(0.5, 0.5, 0.0));
//! write_centroid(&center, "center_coordinates.txt").unwrap();
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod centroid;
mod error;
mod manifest;
mod ply;
mod png;
mod trueview;

pub use centroid::{read_centroid, write_centroid};
pub use error::{IoError, IoResult};
pub use manifest::{MANIFEST_FILE, read_manifest, write_manifest};
pub use ply::{load_mesh_ply, load_point_cloud_ply, save_mesh_ply, save_point_cloud_ply};
pub use png::save_floor_plan_png;
pub use trueview::{CENTER_FILE, TrueViewReport, extract_trueview_centers, read_camera_position};
