//! Chunked, lazy reading of point-record streams.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use scan_types::PointCloud;
use tracing::{debug, info, warn};

use crate::pts::{header_count, is_skippable, parse_line};
use crate::{IngestError, IngestResult};

/// Upper bound on the capacity reserved up front for one chunk.
const PREALLOC_LIMIT: usize = 1 << 16;

/// Running counters for a [`BatchReader`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Records accepted so far.
    pub records: u64,
    /// Malformed records skipped so far.
    pub skipped: u64,
    /// Chunks yielded so far.
    pub chunks: u64,
    /// Record count announced by the stream header, if any.
    pub header_count: Option<u64>,
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records in {} chunks ({} skipped)",
            self.records, self.chunks, self.skipped
        )?;
        if let Some(n) = self.header_count {
            write!(f, ", header announced {n}")?;
        }
        Ok(())
    }
}

/// Lazy iterator over fixed-size chunks of a `.pts` stream.
///
/// Each item is a [`PointCloud`] holding at most `batch_size` records, in
/// stream order. The reader keeps no reference to a chunk once it has been
/// yielded. Malformed records are logged and skipped. An I/O error is
/// yielded once as `Err` and ends the iteration; records read since the
/// previous chunk are discarded with it.
///
/// # Example
///
/// ```
/// use scan_ingest::BatchReader;
///
/// let data = "0 0 0 1 2 3\n1 0 0 1 2 3\nbad line\n2 0 0 1 2 3\n";
/// let mut reader = BatchReader::new(data.as_bytes(), 2).unwrap();
///
/// let sizes: Vec<usize> = reader.by_ref().map(|c| c.unwrap().len()).collect();
/// assert_eq!(sizes, vec![2, 1]);
/// assert_eq!(reader.stats().skipped, 1);
/// ```
#[derive(Debug)]
pub struct BatchReader<R> {
    reader: R,
    batch_size: usize,
    buf: Vec<u8>,
    line_number: usize,
    seen_first_line: bool,
    finished: bool,
    total_hint: Option<u64>,
    stats: IngestStats,
}

impl<R: BufRead> BatchReader<R> {
    /// Wrap a buffered stream.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidBatchSize`] if `batch_size` is zero.
    pub fn new(reader: R, batch_size: usize) -> IngestResult<Self> {
        if batch_size == 0 {
            return Err(IngestError::InvalidBatchSize(batch_size));
        }
        Ok(Self {
            reader,
            batch_size,
            buf: Vec::new(),
            line_number: 0,
            seen_first_line: false,
            finished: false,
            total_hint: None,
            stats: IngestStats::default(),
        })
    }

    /// Enable percentage progress logging against an expected record count.
    #[must_use]
    pub const fn with_total_hint(mut self, total: u64) -> Self {
        self.total_hint = Some(total);
        self
    }

    /// Maximum records per chunk.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &IngestStats {
        &self.stats
    }

    fn fill_chunk(&mut self) -> IngestResult<PointCloud> {
        let mut chunk = PointCloud::with_capacity(self.batch_size.min(PREALLOC_LIMIT));

        while chunk.len() < self.batch_size {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                self.finished = true;
                break;
            }
            self.line_number += 1;

            let line = String::from_utf8_lossy(&self.buf);
            if is_skippable(&line) {
                continue;
            }

            if !self.seen_first_line {
                self.seen_first_line = true;
                if let Some(count) = header_count(&line) {
                    debug!(count, "stream header");
                    self.stats.header_count = Some(count);
                    continue;
                }
            }

            match parse_line(&line, self.line_number) {
                Ok(Some(record)) => {
                    chunk.push(record);
                    self.stats.records += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(line = e.line, reason = %e.reason, "skipping malformed record");
                    self.stats.skipped += 1;
                }
            }
        }

        Ok(chunk)
    }

    fn check_header(&self) {
        if let Some(announced) = self.stats.header_count {
            let seen = self.stats.records + self.stats.skipped;
            if announced != seen {
                warn!(announced, seen, "record count differs from stream header");
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn log_progress(&self) {
        match self.total_hint {
            Some(total) if total > 0 => {
                let percent = (self.stats.records as f64 / total as f64 * 100.0).min(100.0);
                info!(
                    chunk = self.stats.chunks,
                    records = self.stats.records,
                    percent = format_args!("{percent:.1}"),
                    "ingested chunk"
                );
            }
            _ => info!(
                chunk = self.stats.chunks,
                records = self.stats.records,
                "ingested chunk"
            ),
        }
    }
}

impl<R: BufRead> Iterator for BatchReader<R> {
    type Item = IngestResult<PointCloud>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let filled = self.fill_chunk();
        if self.finished {
            self.check_header();
        }
        match filled {
            Ok(chunk) if chunk.is_empty() => None,
            Ok(chunk) => {
                self.stats.chunks += 1;
                self.log_progress();
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for BatchReader<R> {}

/// Open a `.pts` file for chunked reading.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or `batch_size` is zero.
pub fn open_pts<P: AsRef<Path>>(
    path: P,
    batch_size: usize,
) -> IngestResult<BatchReader<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    BatchReader::new(BufReader::new(file), batch_size)
}

/// Count non-empty, non-comment lines in a file.
///
/// This includes a header line if present, so it is an upper bound on the
/// record count. It is only meant for progress reporting.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read.
pub fn count_candidate_records<P: AsRef<Path>>(path: P) -> IngestResult<u64> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if !is_skippable(&String::from_utf8_lossy(&buf)) {
            count += 1;
        }
    }
    Ok(count)
}
