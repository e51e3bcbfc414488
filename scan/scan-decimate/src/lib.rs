//! Mesh simplification for reconstructed scan surfaces.
//!
//! - **Decimation** - edge collapse with quadric error metrics
//! - **Smoothing** - Taubin lambda/mu smoothing without shrinkage
//! - **Simplify** - decimate toward a triangle budget, then smooth
//!
//! # Example
//!
//! ```
//! use scan_decimate::{SimplifyParams, simplify_mesh};
//! use scan_types::{Point3, TriangleMesh};
//!
//! let mesh = TriangleMesh::from_parts(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! );
//!
//! // Already within budget: returned as is
//! let result = simplify_mesh(mesh, &SimplifyParams::new(500_000)).unwrap();
//! println!("{result}");
//! ```
//!
//! # Algorithm
//!
//! 1. For each vertex, sum the quadrics of its incident face planes
//! 2. For each edge, find the position minimizing the combined quadric
//! 3. Collapse the cheapest valid edge until the target is reached
//! 4. Smooth with alternating positive and negative Laplacian passes

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod decimate;
mod error;
mod params;
mod quadric;
mod result;
mod simplify;
mod taubin;

pub use decimate::decimate_mesh;
pub use error::{DecimateError, DecimateResult};
pub use params::{DecimateParams, SimplifyParams, TaubinParams};
pub use quadric::Quadric;
pub use result::{DecimationResult, SimplifyResult, TaubinResult};
pub use simplify::simplify_mesh;
pub use taubin::smooth_taubin;
