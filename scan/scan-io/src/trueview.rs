//! Camera centers from TrueView panorama exports.
//!
//! A TrueView export holds one folder per scene. Each scene carries a
//! cubemap configuration JSON whose `camera.position` is the scanner
//! location. The extractor writes that location as the scene's
//! `center_coordinates.txt`, matching the point cloud centroid artifact.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use scan_types::{Centroid, Point3};
use serde::Deserialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::centroid::write_centroid;
use crate::error::{IoError, IoResult};

/// Per-scene center file name.
pub const CENTER_FILE: &str = "center_coordinates.txt";

#[derive(Debug, Deserialize)]
struct CubemapConfig {
    camera: Option<Camera>,
}

#[derive(Debug, Deserialize)]
struct Camera {
    position: Option<Position>,
}

#[derive(Debug, Deserialize)]
struct Position {
    x: f64,
    y: f64,
    z: f64,
}

/// Read `camera.position` from a cubemap configuration file.
///
/// Returns `Ok(None)` if the file has no camera position.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn read_camera_position<P: AsRef<Path>>(path: P) -> IoResult<Option<Point3<f64>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    let config: CubemapConfig = serde_json::from_reader(BufReader::new(file))?;

    Ok(config
        .camera
        .and_then(|camera| camera.position)
        .map(|p| Point3::new(p.x, p.y, p.z)))
}

/// Outcome of a TrueView extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrueViewReport {
    /// Scenes whose center file was written.
    pub extracted: Vec<String>,

    /// Scenes that were skipped, with the reason.
    pub skipped: Vec<(String, String)>,
}

impl fmt::Display for TrueViewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrueView: {} scenes extracted, {} skipped",
            self.extracted.len(),
            self.skipped.len()
        )
    }
}

/// Write `<output_dir>/<scene>/center_coordinates.txt` for every scene
/// folder in `trueview_dir`.
///
/// Scenes are visited in name order. A scene without a readable cubemap
/// configuration is logged and skipped. A missing `trueview_dir` yields an
/// empty report.
///
/// # Errors
///
/// Returns an error only if `trueview_dir` itself cannot be listed.
pub fn extract_trueview_centers<P, Q>(trueview_dir: P, output_dir: Q) -> IoResult<TrueViewReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let trueview_dir = trueview_dir.as_ref();
    let output_dir = output_dir.as_ref();
    let mut report = TrueViewReport::default();

    if !trueview_dir.is_dir() {
        warn!(dir = %trueview_dir.display(), "TrueView folder not found");
        return Ok(report);
    }

    info!(dir = %trueview_dir.display(), "extracting TrueView centers");
    for entry in sorted_entries(trueview_dir) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let scene = entry.file_name().to_string_lossy().into_owned();

        match extract_scene(entry.path(), &output_dir.join(&scene)) {
            Ok(center) => {
                info!(scene = %scene, %center, "TrueView center extracted");
                report.extracted.push(scene);
            }
            Err(SceneSkip::Missing(reason)) => {
                warn!(scene = %scene, "{reason}");
                report.skipped.push((scene, reason));
            }
            Err(SceneSkip::Failed(err)) => {
                error!(scene = %scene, error = %err, "TrueView scene failed");
                report.skipped.push((scene, err.to_string()));
            }
        }
    }

    info!("{report}");
    Ok(report)
}

enum SceneSkip {
    Missing(String),
    Failed(IoError),
}

impl From<IoError> for SceneSkip {
    fn from(err: IoError) -> Self {
        Self::Failed(err)
    }
}

fn extract_scene(scene_dir: &Path, scene_output: &Path) -> Result<Centroid, SceneSkip> {
    let config = find_cubemap_config(scene_dir)
        .ok_or_else(|| SceneSkip::Missing("no cubemap configuration".to_string()))?;
    let position = read_camera_position(&config)?
        .ok_or_else(|| SceneSkip::Missing("no camera position".to_string()))?;

    fs::create_dir_all(scene_output).map_err(IoError::from)?;
    let center = Centroid(position);
    write_centroid(&center, scene_output.join(CENTER_FILE))?;
    Ok(center)
}

/// First `*cubemap*.json` file directly inside `scene_dir`, by name.
fn find_cubemap_config(scene_dir: &Path) -> Option<PathBuf> {
    sorted_entries(scene_dir)
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            let name = e.file_name().to_string_lossy();
            name.contains("cubemap") && name.ends_with(".json")
        })
        .map(walkdir::DirEntry::into_path)
}

fn sorted_entries(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
}
