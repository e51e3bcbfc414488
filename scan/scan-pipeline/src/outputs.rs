//! Scan discovery and per-scan output layout.

use std::io;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use scan_io::CENTER_FILE;
use walkdir::WalkDir;

/// Point cloud output file name.
pub const CLOUD_FILE: &str = "output_cloud.ply";
/// Mesh output file name.
pub const MESH_FILE: &str = "output_mesh.ply";
/// Floor plan output file name.
pub const FLOOR_PLAN_FILE: &str = "floor_plan.png";

/// Find every `.pts` file under `input_dir`, recursively, in path order.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn discover_scans<P: AsRef<Path>>(input_dir: P) -> io::Result<Vec<PathBuf>> {
    let mut scans = Vec::new();
    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry?;
        let is_pts = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pts"));
        if entry.file_type().is_file() && is_pts {
            scans.push(entry.into_path());
        }
    }
    Ok(scans)
}

/// Scan name used for the output subdirectory: the file stem.
#[must_use]
pub fn scan_name(scan_path: &Path) -> String {
    scan_path
        .file_stem()
        .map_or_else(|| "scan".to_string(), |s| s.to_string_lossy().into_owned())
}

/// A scan whose name repeats that of an earlier scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateScan {
    /// The later scan, which is not processed.
    pub path: PathBuf,
    /// The earlier scan that owns the output directory.
    pub first: PathBuf,
}

/// Split scans into uniquely named ones and later scans reusing a name.
///
/// Scans are taken in the given order; the first scan with a name owns
/// `<output_dir>/<name>`, and every later scan with that name is returned
/// as a [`DuplicateScan`].
#[must_use]
pub fn split_duplicate_names(scans: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<DuplicateScan>) {
    let mut owners: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<PathBuf> = Vec::with_capacity(scans.len());
    let mut duplicates = Vec::new();

    for path in scans {
        match owners.get(&scan_name(&path)) {
            Some(&owner) => duplicates.push(DuplicateScan {
                path,
                first: unique[owner].clone(),
            }),
            None => {
                owners.insert(scan_name(&path), unique.len());
                unique.push(path);
            }
        }
    }
    (unique, duplicates)
}

/// Output paths of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutputs {
    /// Scan name.
    pub name: String,
    /// `<output_dir>/<name>`.
    pub dir: PathBuf,
    /// Downsampled point cloud.
    pub cloud: PathBuf,
    /// Simplified mesh.
    pub mesh: PathBuf,
    /// Floor plan image.
    pub floor_plan: PathBuf,
    /// Centroid side artifact.
    pub centroid: PathBuf,
}

impl ScanOutputs {
    /// Output layout for `scan_path` under `output_dir`.
    #[must_use]
    pub fn for_scan(output_dir: &Path, scan_path: &Path) -> Self {
        let name = scan_name(scan_path);
        let dir = output_dir.join(&name);
        Self {
            cloud: dir.join(CLOUD_FILE),
            mesh: dir.join(MESH_FILE),
            floor_plan: dir.join(FLOOR_PLAN_FILE),
            centroid: dir.join(CENTER_FILE),
            name,
            dir,
        }
    }

    /// Whether the cloud, mesh and floor plan all exist.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cloud.is_file() && self.mesh.is_file() && self.floor_plan.is_file()
    }
}
