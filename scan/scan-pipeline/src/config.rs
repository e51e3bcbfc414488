//! Pipeline configuration.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! input_dir = "scans"
//! voxel_size = 0.02
//!
//! [floor_plan]
//! width = 1200
//! dot_radius = 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use scan_decimate::{SimplifyParams, TaubinParams};
use scan_floorplan::{FloorPlanError, FloorPlanParams};
use scan_reconstruct::AlphaParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Voxel size must be positive and finite.
    #[error("invalid voxel size {0}: must be positive and finite")]
    InvalidVoxelSize(f64),

    /// Alpha must be positive and finite.
    #[error("invalid alpha {0}: must be positive and finite")]
    InvalidAlpha(f64),

    /// Target triangle count must be positive.
    #[error("invalid target triangle count {0}: must be at least 1")]
    InvalidTargetCount(usize),

    /// Batch size must be positive.
    #[error("invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),

    /// Worker count must be positive when given.
    #[error("invalid job count {0}: must be at least 1")]
    InvalidJobs(usize),

    /// The floor plan canvas has no drawable area.
    #[error(transparent)]
    InvalidCanvas(#[from] FloorPlanError),
}

/// Settings for a batch conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory searched recursively for `.pts` files. Default: `input`.
    pub input_dir: PathBuf,

    /// Directory receiving one subdirectory per scan. Default: `output`.
    pub output_dir: PathBuf,

    /// Records per ingestion chunk. Default: 1 000 000.
    pub batch_size: usize,

    /// Voxel edge length for downsampling. Default: 0.05.
    pub voxel_size: f64,

    /// Alpha-shape radius. Default: 0.1.
    pub alpha: f64,

    /// Triangle budget for simplification. Default: 500 000.
    pub target_triangles: usize,

    /// Taubin iterations after decimation. Default: 5.
    pub smoothing_iterations: u32,

    /// Floor plan canvas.
    pub floor_plan: FloorPlanParams,

    /// Write binary rather than ASCII PLY. Default: true.
    pub binary_ply: bool,

    /// Scans processed concurrently. `None` uses the rayon default.
    pub jobs: Option<usize>,

    /// TrueView export folder to extract camera centers from.
    pub trueview_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            batch_size: 1_000_000,
            voxel_size: 0.05,
            alpha: 0.1,
            target_triangles: 500_000,
            smoothing_iterations: 5,
            floor_plan: FloorPlanParams::default(),
            binary_ply: true,
            jobs: None,
            trueview_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every numeric setting.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.voxel_size > 0.0 && self.voxel_size.is_finite()) {
            return Err(ConfigError::InvalidVoxelSize(self.voxel_size));
        }
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if self.target_triangles == 0 {
            return Err(ConfigError::InvalidTargetCount(self.target_triangles));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::InvalidJobs(0));
        }
        self.floor_plan.validate()?;
        Ok(())
    }

    /// Alpha-shape parameters for reconstruction.
    #[must_use]
    pub fn alpha_params(&self) -> AlphaParams {
        AlphaParams::new(self.alpha)
    }

    /// Decimation and smoothing parameters.
    #[must_use]
    pub fn simplify_params(&self) -> SimplifyParams {
        SimplifyParams {
            smoothing: TaubinParams::default().with_iterations(self.smoothing_iterations),
            ..SimplifyParams::new(self.target_triangles)
        }
    }
}
