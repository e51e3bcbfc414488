//! Point cloud reduction and surface reconstruction.
//!
//! - **Downsampling** - voxel-grid quantization, one averaged sample per voxel
//! - **Delaunay** - incremental 3D tetrahedralization
//! - **Alpha shapes** - surface extraction from the tetrahedralization
//!
//! # Quick Start
//!
//! ```
//! use scan_reconstruct::{AlphaParams, alpha_shape, voxel_downsample};
//! use scan_types::{Point3, PointCloud};
//!
//! // Corners of a unit cube
//! let mut corners = Vec::new();
//! for i in 0..8 {
//!     let bit = |b: u32| f64::from((i >> b) & 1);
//!     corners.push(Point3::new(bit(0), bit(1), bit(2)));
//! }
//! let cloud = voxel_downsample(PointCloud::from_positions(corners), 0.5).unwrap();
//!
//! let result = alpha_shape(&cloud, &AlphaParams::new(1.0)).unwrap();
//! assert_eq!(result.boundary_edge_count, 0);
//! println!("{result}");
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]

mod alpha;
mod delaunay;
mod downsample;
mod error;
mod predicates;

pub use alpha::{AlphaParams, ReconstructionResult, alpha_shape, reconstruct_or_empty};
pub use delaunay::{Tetrahedralization, Tetrahedron};
pub use downsample::{VoxelKey, voxel_downsample, voxel_key};
pub use error::{ReconstructError, ReconstructResult};
