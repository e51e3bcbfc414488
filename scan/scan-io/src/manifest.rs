//! The `scenes.json` batch manifest.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IoError, IoResult};

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "scenes.json";

/// Write the processed scan names as a JSON array to `<dir>/scenes.json`.
///
/// Returns the manifest path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_manifest<P: AsRef<Path>>(dir: P, scans: &[String]) -> IoResult<PathBuf> {
    let path = dir.as_ref().join(MANIFEST_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, scans)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(path)
}

/// Read the scan names from `<dir>/scenes.json`.
///
/// # Errors
///
/// Returns an error if the manifest is missing or is not a JSON array of
/// strings.
pub fn read_manifest<P: AsRef<Path>>(dir: P) -> IoResult<Vec<String>> {
    let path = dir.as_ref().join(MANIFEST_FILE);
    let file = File::open(&path).map_err(|e| IoError::from_open(&path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let scans = vec!["lobby".to_string(), "stairwell_2".to_string()];

        let path = write_manifest(dir.path(), &scans).unwrap();
        assert_eq!(path.file_name().unwrap(), MANIFEST_FILE);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!(["lobby", "stairwell_2"]));
        assert_eq!(read_manifest(dir.path()).unwrap(), scans);
    }

    #[test]
    fn empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), &[]).unwrap();
        assert!(read_manifest(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_manifest(dir.path()),
            Err(IoError::FileNotFound { .. })
        ));
    }
}
