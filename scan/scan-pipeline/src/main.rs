//! `scan2viz` - convert `.pts` scans into point clouds, meshes and floor plans.
//!
//! # Usage
//!
//! ```bash
//! # Convert everything under ./input into ./output
//! scan2viz
//!
//! # Custom folders and a finer voxel grid
//! scan2viz run --input scans --output viz --voxel-size 0.02
//!
//! # Settings from a file, CLI flags win
//! scan2viz --config scan2viz.toml --jobs 2
//!
//! # Only extract TrueView camera centers
//! scan2viz trueview exports/trueview
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use scan_pipeline::{PipelineConfig, run_batch};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Convert terrestrial laser scans into web visualization assets
#[derive(Parser, Debug)]
#[command(name = "scan2viz")]
#[command(about = "Convert .pts scans into point clouds, meshes and floor plans", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    overrides: Overrides,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every scan in the input directory (default)
    Run,

    /// Extract camera centers from a TrueView export
    Trueview {
        /// TrueView export folder (one subfolder per scene)
        #[arg(name = "DIR")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Overrides {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Input directory searched for .pts files
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Voxel size for downsampling
    #[arg(long, global = true)]
    voxel_size: Option<f64>,

    /// Alpha-shape radius
    #[arg(long, global = true)]
    alpha: Option<f64>,

    /// Triangle budget for mesh simplification
    #[arg(long, global = true)]
    target_triangles: Option<usize>,

    /// Records per ingestion chunk
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Scans processed in parallel
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// TrueView export folder to extract after the batch
    #[arg(long, global = true)]
    trueview: Option<PathBuf>,

    /// Write ASCII instead of binary PLY
    #[arg(long, global = true)]
    ascii: bool,
}

impl Overrides {
    fn load(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = self.input {
            config.input_dir = input;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(voxel_size) = self.voxel_size {
            config.voxel_size = voxel_size;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(target) = self.target_triangles {
            config.target_triangles = target;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        if self.trueview.is_some() {
            config.trueview_dir = self.trueview;
        }
        if self.ascii {
            config.binary_ply = false;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.overrides.load()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let report = run_batch(&config)?;
            for failure in &report.failed {
                error!("{failure}");
            }
            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Trueview { dir } => {
            std::fs::create_dir_all(&config.output_dir)
                .with_context(|| format!("creating {}", config.output_dir.display()))?;
            let report = scan_io::extract_trueview_centers(&dir, &config.output_dir)?;
            info!("{report}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
