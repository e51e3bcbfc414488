//! Conversion of a single scan.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use scan_decimate::simplify_mesh;
use scan_floorplan::rasterize_with_stats;
use scan_ingest::{assemble, count_candidate_records, open_pts};
use scan_io::{save_floor_plan_png, save_mesh_ply, save_point_cloud_ply, write_centroid};
use scan_reconstruct::{reconstruct_or_empty, voxel_downsample};
use tracing::{info, info_span, warn};

use crate::config::PipelineConfig;
use crate::error::{ScanFailure, Stage};
use crate::outputs::ScanOutputs;

/// Counters from one converted scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    /// Scan name.
    pub scan: String,
    /// Records read from the `.pts` file.
    pub input_points: usize,
    /// Points after downsampling.
    pub downsampled_points: usize,
    /// Triangles in the written mesh.
    pub triangles: usize,
    /// Points drawn on the floor plan, if one was written.
    pub floor_points: Option<usize>,
    /// Wall-clock time spent on the scan.
    pub elapsed: Duration,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} points -> {} downsampled, {} triangles in {:.2}s",
            self.scan,
            self.input_points,
            self.downsampled_points,
            self.triangles,
            self.elapsed.as_secs_f64()
        )
    }
}

/// What happened to a scan that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// All outputs were written.
    Processed(ScanSummary),
    /// Outputs already existed; nothing was done.
    Skipped {
        /// Scan name.
        scan: String,
    },
}

impl ScanOutcome {
    /// Scan name.
    #[must_use]
    pub fn scan(&self) -> &str {
        match self {
            Self::Processed(summary) => &summary.scan,
            Self::Skipped { scan } => scan,
        }
    }
}

/// Convert one `.pts` file into its output directory.
///
/// Stages run in order: ingest, centroid, downsample, cloud, reconstruct,
/// simplify, mesh, floor plan. Each stage consumes the previous buffer, so
/// the full-resolution cloud is released once the downsampled cloud exists.
/// Reconstruction failures on degenerate data produce an empty mesh instead
/// of failing the scan.
///
/// A scan whose cloud, mesh and floor plan already exist is skipped.
///
/// # Errors
///
/// Returns a [`ScanFailure`] naming the stage that failed.
pub fn process_scan(scan_path: &Path, config: &PipelineConfig) -> Result<ScanOutcome, ScanFailure> {
    let outputs = ScanOutputs::for_scan(&config.output_dir, scan_path);
    let scan = outputs.name.as_str();
    let _span = info_span!("scan", name = %scan).entered();

    if outputs.is_complete() {
        info!("outputs already exist, skipping");
        return Ok(ScanOutcome::Skipped {
            scan: scan.to_string(),
        });
    }

    let start = Instant::now();
    info!(path = %scan_path.display(), "processing scan");
    fs::create_dir_all(&outputs.dir).map_err(|e| ScanFailure::new(scan, Stage::Prepare, e))?;

    // Ingest
    let assembled = ingest(scan_path, config.batch_size)
        .map_err(|e| ScanFailure::new(scan, Stage::Ingest, e))?;
    let input_points = assembled.cloud.len();
    info!(points = input_points, "{assembled}");

    write_centroid(&assembled.centroid, &outputs.centroid)
        .map_err(|e| ScanFailure::new(scan, Stage::WriteCentroid, e))?;

    // Downsample
    let cloud = voxel_downsample(assembled.cloud, config.voxel_size)
        .map_err(|e| ScanFailure::new(scan, Stage::Downsample, e))?;
    info!(
        original = input_points,
        downsampled = cloud.len(),
        voxel_size = config.voxel_size,
        "downsampled"
    );

    save_point_cloud_ply(&cloud, &outputs.cloud, config.binary_ply)
        .map_err(|e| ScanFailure::new(scan, Stage::WriteCloud, e))?;

    // Mesh
    let mesh = reconstruct_or_empty(&cloud, &config.alpha_params())
        .map_err(|e| ScanFailure::new(scan, Stage::Reconstruct, e))?;
    let simplified = simplify_mesh(mesh, &config.simplify_params())
        .map_err(|e| ScanFailure::new(scan, Stage::Simplify, e))?;
    info!("{simplified}");
    let triangles = simplified.final_triangles;

    save_mesh_ply(&simplified.mesh, &outputs.mesh, config.binary_ply)
        .map_err(|e| ScanFailure::new(scan, Stage::WriteMesh, e))?;
    drop(simplified);

    // Floor plan
    let plan = rasterize_with_stats(&cloud, &config.floor_plan)
        .map_err(|e| ScanFailure::new(scan, Stage::FloorPlan, e))?;
    let floor_points = match plan {
        Some(plan) => {
            save_floor_plan_png(&plan.image, &outputs.floor_plan)
                .map_err(|e| ScanFailure::new(scan, Stage::WriteFloorPlan, e))?;
            info!("{}", plan.stats);
            Some(plan.stats.floor_points)
        }
        None => {
            warn!("floor plan not written");
            None
        }
    };

    let summary = ScanSummary {
        scan: scan.to_string(),
        input_points,
        downsampled_points: cloud.len(),
        triangles,
        floor_points,
        elapsed: start.elapsed(),
    };
    info!("{summary}");
    Ok(ScanOutcome::Processed(summary))
}

fn ingest(
    scan_path: &Path,
    batch_size: usize,
) -> scan_ingest::IngestResult<scan_ingest::AssembledCloud> {
    let total = count_candidate_records(scan_path)?;
    info!(candidates = total, "counted records");
    let reader = open_pts(scan_path, batch_size)?.with_total_hint(total);
    assemble(reader)
}
