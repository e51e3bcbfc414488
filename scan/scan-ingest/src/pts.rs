//! `.pts` record parsing.

use nalgebra::Point3;
use scan_types::{PointRecord, RecordColor};

use crate::RecordParseError;

/// Minimum number of fields in a record: x y z r g b.
const RECORD_FIELDS: usize = 6;

/// Returns true for lines that carry no record (blank or `#` comment).
pub(crate) fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Returns the count if `line` is a lone integer, as in the `.pts` header.
pub(crate) fn header_count(line: &str) -> Option<u64> {
    let mut fields = line.split_whitespace();
    let first = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    first.parse().ok()
}

/// Parse one line of a `.pts` stream.
///
/// Blank lines and `#` comments yield `Ok(None)`. Fields past the sixth are
/// ignored. `line_number` is only used for error reporting.
///
/// # Errors
///
/// Returns a [`RecordParseError`] for short lines, non-numeric fields,
/// non-finite coordinates and color channels outside `0..=255`.
///
/// # Example
///
/// ```
/// use scan_ingest::parse_line;
///
/// let record = parse_line("1.5 -2 3 255 128 0 0.73", 1).unwrap().unwrap();
/// assert_eq!(record.color.g, 128);
///
/// assert!(parse_line("# exported by scanner", 2).unwrap().is_none());
/// assert!(parse_line("1 2 3", 3).is_err());
/// ```
pub fn parse_line(
    line: &str,
    line_number: usize,
) -> Result<Option<PointRecord>, RecordParseError> {
    if is_skippable(line) {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().take(RECORD_FIELDS).collect();
    if fields.len() < RECORD_FIELDS {
        return Err(RecordParseError::new(
            line_number,
            format!("expected {RECORD_FIELDS} fields, found {}", fields.len()),
        ));
    }

    let mut coords = [0.0_f64; 3];
    for (axis, (slot, field)) in coords.iter_mut().zip(&fields[..3]).enumerate() {
        let value: f64 = field.parse().map_err(|_| {
            RecordParseError::new(line_number, format!("invalid coordinate {axis}: {field:?}"))
        })?;
        if !value.is_finite() {
            return Err(RecordParseError::new(
                line_number,
                format!("non-finite coordinate {axis}: {field:?}"),
            ));
        }
        *slot = value;
    }

    let mut channels = [0_u8; 3];
    for (slot, field) in channels.iter_mut().zip(&fields[3..]) {
        let value: i64 = field.parse().map_err(|_| {
            RecordParseError::new(line_number, format!("invalid color channel: {field:?}"))
        })?;
        *slot = u8::try_from(value).map_err(|_| {
            RecordParseError::new(line_number, format!("color channel {value} outside 0..=255"))
        })?;
    }

    Ok(Some(PointRecord::new(
        Point3::new(coords[0], coords[1], coords[2]),
        RecordColor::new(channels[0], channels[1], channels[2]),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_basic_record() {
        let r = parse_line("0.5 -1.25 3 10 20 30", 1).unwrap().unwrap();
        assert_relative_eq!(r.position.x, 0.5);
        assert_relative_eq!(r.position.y, -1.25);
        assert_relative_eq!(r.position.z, 3.0);
        assert_eq!(r.color, RecordColor::new(10, 20, 30));
    }

    #[test]
    fn ignores_trailing_fields() {
        let r = parse_line("1 2 3 4 5 6 -1200 0.5", 1).unwrap().unwrap();
        assert_eq!(r.color, RecordColor::new(4, 5, 6));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(parse_line("", 1).unwrap().is_none());
        assert!(parse_line("   \t", 1).unwrap().is_none());
        assert!(parse_line("  # header", 1).unwrap().is_none());
    }

    #[test]
    fn rejects_short_line() {
        let err = parse_line("1 2 3 4 5", 7).unwrap_err();
        assert_eq!(err.line, 7);
        assert!(err.reason.contains("found 5"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(parse_line("a 2 3 4 5 6", 1).is_err());
        assert!(parse_line("1 2 3 4 5 x", 1).is_err());
        assert!(parse_line("1 2 3 4 5 6.5", 1).is_err());
        assert!(parse_line("1 NaN 3 4 5 6", 1).is_err());
        assert!(parse_line("1 inf 3 4 5 6", 1).is_err());
    }

    #[test]
    fn rejects_out_of_range_channels() {
        assert!(parse_line("1 2 3 256 0 0", 1).is_err());
        assert!(parse_line("1 2 3 0 -1 0", 1).is_err());
        assert!(parse_line("1 2 3 255 0 0", 1).is_ok());
    }

    #[test]
    fn header_detection() {
        assert_eq!(header_count("  1024 "), Some(1024));
        assert_eq!(header_count("1 2 3 4 5 6"), None);
        assert_eq!(header_count("1.5"), None);
    }
}
