//! Per-scan failure reporting.

use std::fmt;
use std::path::PathBuf;

use scan_decimate::DecimateError;
use scan_floorplan::FloorPlanError;
use scan_ingest::IngestError;
use scan_io::IoError;
use scan_reconstruct::ReconstructError;
use thiserror::Error;

use crate::config::ConfigError;

/// A step of the per-scan pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Creating the scan's output directory.
    Prepare,
    /// Reading and assembling the `.pts` file.
    Ingest,
    /// Writing `center_coordinates.txt`.
    WriteCentroid,
    /// Voxel downsampling.
    Downsample,
    /// Writing `output_cloud.ply`.
    WriteCloud,
    /// Alpha-shape reconstruction.
    Reconstruct,
    /// Decimation and smoothing.
    Simplify,
    /// Writing `output_mesh.ply`.
    WriteMesh,
    /// Rasterizing the floor plan.
    FloorPlan,
    /// Writing `floor_plan.png`.
    WriteFloorPlan,
}

impl Stage {
    /// Short stage name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Ingest => "ingest",
            Self::WriteCentroid => "write-centroid",
            Self::Downsample => "downsample",
            Self::WriteCloud => "write-cloud",
            Self::Reconstruct => "reconstruct",
            Self::Simplify => "simplify",
            Self::WriteMesh => "write-mesh",
            Self::FloorPlan => "floor-plan",
            Self::WriteFloorPlan => "write-floor-plan",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The error behind a failed stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Ingestion failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Downsampling or reconstruction failed.
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    /// Simplification failed.
    #[error(transparent)]
    Decimate(#[from] DecimateError),

    /// Floor plan rasterization failed.
    #[error(transparent)]
    FloorPlan(#[from] FloorPlanError),

    /// Writing an output failed.
    #[error(transparent)]
    Output(#[from] IoError),

    /// Filesystem error outside the writers.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An earlier scan with the same name owns the output directory.
    #[error("output directory already belongs to {}", first.display())]
    DuplicateName {
        /// The scan that owns the directory.
        first: PathBuf,
    },
}

impl StageError {
    /// Whether the failure comes from a setting rather than the data.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Ingest(IngestError::InvalidBatchSize(_))
                | Self::Reconstruct(
                    ReconstructError::InvalidVoxelSize(_) | ReconstructError::InvalidAlpha(_)
                )
                | Self::Decimate(DecimateError::InvalidTargetCount(_))
                | Self::FloorPlan(FloorPlanError::InvalidCanvas { .. })
        )
    }
}

/// A scan that could not be converted.
#[derive(Debug, Error)]
#[error("scan {scan} failed at {stage}: {source}")]
pub struct ScanFailure {
    /// Scan name (file stem).
    pub scan: String,
    /// Stage that failed.
    pub stage: Stage,
    /// What went wrong.
    pub source: StageError,
}

impl ScanFailure {
    pub(crate) fn new(scan: &str, stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            scan: scan.to_string(),
            stage,
            source: source.into(),
        }
    }
}

/// Errors that stop a whole batch before or after the scans run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scan discovery or output directory setup failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the manifest failed.
    #[error(transparent)]
    Output(#[from] IoError),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
