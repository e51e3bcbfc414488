//! The `center_coordinates.txt` side artifact.

use std::fs;
use std::path::Path;

use scan_types::{Centroid, Point3};

use crate::error::{IoError, IoResult};

/// Write `center = [x, y, z]` followed by a newline.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_centroid<P: AsRef<Path>>(centroid: &Centroid, path: P) -> IoResult<()> {
    fs::write(path, format!("{centroid}\n"))?;
    Ok(())
}

/// Read a centroid written by [`write_centroid`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a
/// `center = [x, y, z]` line.
pub fn read_centroid<P: AsRef<Path>>(path: P) -> IoResult<Centroid> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| IoError::from_open(path, e))?;
    parse_centroid(text.trim())
        .ok_or_else(|| IoError::invalid_content(format!("not a centroid line: {:?}", text.trim())))
}

fn parse_centroid(line: &str) -> Option<Centroid> {
    let inner = line.strip_prefix("center = [")?.strip_suffix(']')?;
    let mut coords = inner.split(',').map(|c| c.trim().parse::<f64>());
    let point = Point3::new(coords.next()?.ok()?, coords.next()?.ok()?, coords.next()?.ok()?);
    coords.next().is_none().then_some(Centroid(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_single_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("center_coordinates.txt");

        write_centroid(&Centroid(Point3::new(0.5, 0.5, 0.0)), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "center = [0.5, 0.5, 0.0]\n");
    }

    #[test]
    fn reads_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        let centroid = Centroid(Point3::new(-1.25, 1e-7, 123_456.789));

        write_centroid(&centroid, &path).unwrap();
        assert_eq!(read_centroid(&path).unwrap(), centroid);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_centroid("center = [1, 2]").is_none());
        assert!(parse_centroid("center = [1, 2, 3, 4]").is_none());
        assert!(parse_centroid("centre = [1, 2, 3]").is_none());
        assert!(parse_centroid("center = [1, 2, 3]").is_some());
    }
}
