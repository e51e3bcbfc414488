//! Streaming ingestion of `.pts` scan exports.
//!
//! A `.pts` file is a whitespace-separated text table of samples: three
//! coordinates followed by three 8-bit color channels. Exports are often far
//! larger than the cloud that survives downsampling, so this crate never
//! holds more than one chunk of raw records at a time:
//!
//! - [`BatchReader`] - lazy iterator of fixed-size [`PointCloud`] chunks
//! - [`assemble`] - concatenates chunks into one cloud and computes its centroid
//! - [`parse_line`] - single-record parser used by the reader
//!
//! # Example
//!
//! ```
//! use scan_ingest::{BatchReader, assemble};
//!
//! let data = "4\n0 0 0 255 0 0\n1 0 0 0 255 0\n0 1 0 0 0 255\n1 1 0 255 255 0\n";
//! let reader = BatchReader::new(data.as_bytes(), 3).unwrap();
//! let assembled = assemble(reader).unwrap();
//!
//! assert_eq!(assembled.cloud.len(), 4);
//! assert_eq!(assembled.centroid.to_string(), "center = [0.5, 0.5, 0.0]");
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod assemble;
mod batch;
mod error;
mod pts;

pub use assemble::{AssembledCloud, AssemblyStats, assemble};
pub use batch::{BatchReader, IngestStats, count_candidate_records, open_pts};
pub use error::{IngestError, IngestResult, RecordParseError};
pub use pts::parse_line;

pub use scan_types::PointCloud;
