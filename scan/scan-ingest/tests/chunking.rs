//! Chunk-size independence and file-backed ingestion.

use std::io::Write;

use proptest::prelude::*;
use scan_ingest::{BatchReader, assemble, count_candidate_records, open_pts};

fn arb_record() -> impl Strategy<Value = String> {
    (
        -100.0..100.0_f64,
        -100.0..100.0_f64,
        -100.0..100.0_f64,
        any::<u8>(),
        any::<u8>(),
        any::<u8>(),
    )
        .prop_map(|(x, y, z, r, g, b)| format!("{x} {y} {z} {r} {g} {b}"))
}

fn arb_stream() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            8 => arb_record(),
            1 => Just("# comment".to_string()),
            1 => Just("1 2".to_string()),
            1 => Just(String::new()),
        ],
        1..200,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn assembled_cloud_is_independent_of_batch_size(
        stream in arb_stream(),
        a in 1usize..50,
        b in 1usize..50,
    ) {
        let left = assemble(BatchReader::new(stream.as_bytes(), a).unwrap());
        let right = assemble(BatchReader::new(stream.as_bytes(), b).unwrap());

        match (left, right) {
            (Ok(l), Ok(r)) => {
                prop_assert_eq!(l.cloud, r.cloud);
                prop_assert_eq!(l.centroid, r.centroid);
            }
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "batch size changed the outcome"),
        }
    }

    #[test]
    fn chunks_never_exceed_batch_size(stream in arb_stream(), size in 1usize..20) {
        for chunk in BatchReader::new(stream.as_bytes(), size).unwrap() {
            let chunk = chunk.unwrap();
            prop_assert!(!chunk.is_empty());
            prop_assert!(chunk.len() <= size);
        }
    }
}

#[test]
fn reads_from_file_with_progress() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "3").unwrap();
    writeln!(file, "0 0 0 10 20 30").unwrap();
    writeln!(file, "# interleaved comment").unwrap();
    writeln!(file, "2 0 0 10 20 30").unwrap();
    writeln!(file, "4 0 0 10 20 30").unwrap();

    let total = count_candidate_records(file.path()).unwrap();
    assert_eq!(total, 4);

    let mut reader = open_pts(file.path(), 2).unwrap().with_total_hint(total);
    let assembled = assemble(reader.by_ref()).unwrap();

    assert_eq!(assembled.cloud.len(), 3);
    assert_eq!(reader.stats().header_count, Some(3));
    assert_eq!(reader.stats().chunks, 2);
    assert!((assembled.centroid.point().x - 2.0).abs() < 1e-12);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(open_pts(dir.path().join("absent.pts"), 8).is_err());
    assert!(count_candidate_records(dir.path().join("absent.pts")).is_err());
}
