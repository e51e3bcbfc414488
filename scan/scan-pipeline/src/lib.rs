//! Batch conversion of `.pts` scans into visualization assets.
//!
//! For every scan under the input directory, writes into
//! `<output>/<scan name>/`:
//!
//! - `output_cloud.ply` - voxel-downsampled colored point cloud
//! - `output_mesh.ply` - alpha-shape surface, decimated and smoothed
//! - `floor_plan.png` - top-down view of the floor band
//! - `center_coordinates.txt` - centroid of the full-resolution cloud
//!
//! plus a `scenes.json` manifest listing every converted scan.
//!
//! # Example
//!
//! ```no_run
//! use scan_pipeline::{PipelineConfig, run_batch};
//!
//! let config = PipelineConfig {
//!     voxel_size: 0.02,
//!     ..PipelineConfig::default()
//! };
//! let report = run_batch(&config).unwrap();
//! println!("{report}");
//! for failure in &report.failed {
//!     eprintln!("{failure}");
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod batch;
mod config;
mod error;
mod outputs;
mod process;

pub use batch::{BatchReport, run_batch};
pub use config::{ConfigError, PipelineConfig};
pub use error::{PipelineError, ScanFailure, Stage, StageError};
pub use outputs::{
    CLOUD_FILE, DuplicateScan, FLOOR_PLAN_FILE, MESH_FILE, ScanOutputs, discover_scans,
    scan_name, split_duplicate_names,
};
pub use process::{ScanOutcome, ScanSummary, process_scan};
