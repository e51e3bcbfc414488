//! Core data types for scan-to-visualization processing.
//!
//! This crate provides the foundational types shared by every pipeline stage:
//!
//! - [`PointRecord`] - A single parsed scan sample (position + 8-bit color)
//! - [`PointCloud`] - Parallel position/color buffers with a length invariant
//! - [`TriangleMesh`] - Indexed triangle mesh with optional vertex normals
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`Centroid`] - Mean position of a cloud, with its persisted text form
//!
//! # Coordinate System
//!
//! Scanner exports use **Y as the vertical axis**. The horizontal plane is
//! spanned by X and Z. Triangle winding is counter-clockwise when viewed from
//! outside, so face normals point outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use scan_types::{PointCloud, PointRecord, RecordColor, Point3};
//!
//! let mut cloud = PointCloud::new();
//! cloud.push(PointRecord::new(Point3::new(0.0, 0.0, 0.0), RecordColor::new(255, 0, 0)));
//! cloud.push(PointRecord::new(Point3::new(2.0, 0.0, 0.0), RecordColor::new(0, 0, 255)));
//!
//! let centroid = cloud.centroid().unwrap();
//! assert_eq!(centroid.to_string(), "center = [1.0, 0.0, 0.0]");
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod cloud;
mod error;
mod mesh;
mod point;

pub use bounds::Aabb;
pub use cloud::{Centroid, PointCloud};
pub use error::{MeshError, TypesError};
pub use mesh::TriangleMesh;
pub use point::{PointRecord, RecordColor};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

/// Index of the vertical axis in scanner coordinates (Y).
pub const VERTICAL_AXIS: usize = 1;
