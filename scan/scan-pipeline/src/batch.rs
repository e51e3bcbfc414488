//! Batch conversion of every scan in the input directory.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use scan_io::{IoError, IoResult, TrueViewReport, extract_trueview_centers, write_manifest};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, ScanFailure, Stage, StageError};
use crate::outputs::{discover_scans, scan_name, split_duplicate_names};
use crate::process::{ScanOutcome, ScanSummary, process_scan};

/// Results of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Scans converted in this run, in discovery order.
    pub processed: Vec<ScanSummary>,
    /// Scans whose outputs already existed.
    pub skipped: Vec<String>,
    /// Scans that failed, with the failing stage.
    pub failed: Vec<ScanFailure>,
    /// Path of the written `scenes.json`.
    pub manifest: Option<PathBuf>,
    /// TrueView extraction results, if a TrueView folder was configured.
    pub trueview: Option<TrueViewReport>,
    /// Why TrueView extraction stopped, if it did.
    pub trueview_error: Option<IoError>,
    /// Wall-clock time for the whole batch.
    pub elapsed: Duration,
}

impl BatchReport {
    /// Total scans discovered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.processed.len() + self.skipped.len() + self.failed.len()
    }

    /// Whether no scan failed and TrueView extraction, if run, completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.trueview_error.is_none()
    }

    fn record_failure(&mut self, failure: ScanFailure) {
        error!(
            scan = %failure.scan,
            stage = %failure.stage,
            error = %failure.source,
            "scan failed"
        );
        self.failed.push(failure);
    }

    fn record_trueview(&mut self, result: IoResult<TrueViewReport>) {
        match result {
            Ok(trueview) => self.trueview = Some(trueview),
            Err(e) => {
                error!(error = %e, "TrueView extraction failed");
                self.trueview_error = Some(e);
            }
        }
    }

    /// Names of scans with complete outputs, sorted.
    #[must_use]
    pub fn scene_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .processed
            .iter()
            .map(|s| s.scan.clone())
            .chain(self.skipped.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch: {} scans, {} processed, {} skipped, {} failed in {:.2}s",
            self.total(),
            self.processed.len(),
            self.skipped.len(),
            self.failed.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Convert every `.pts` file under `config.input_dir`.
///
/// The configuration is validated once up front. Scans run concurrently on
/// a rayon pool of `config.jobs` workers; a failing scan is logged and the
/// rest continue. A scan whose name was already taken by an earlier scan in
/// discovery order is reported as failed without running, so no two scans
/// share an output directory. Afterwards `scenes.json` is written and, when
/// configured, TrueView camera centers are extracted; a TrueView failure is
/// kept in [`BatchReport::trueview_error`].
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the input directory
/// cannot be listed, the output directory or manifest cannot be written,
/// or the worker pool cannot be built. Individual scan failures are
/// reported in [`BatchReport::failed`] instead.
pub fn run_batch(config: &PipelineConfig) -> Result<BatchReport, PipelineError> {
    config.validate()?;
    let start = Instant::now();

    let (scans, duplicates) = split_duplicate_names(discover_scans(&config.input_dir)?);
    if scans.is_empty() {
        warn!(dir = %config.input_dir.display(), "no .pts files found");
    } else {
        info!(count = scans.len(), dir = %config.input_dir.display(), "found scans");
    }
    fs::create_dir_all(&config.output_dir)?;

    let run = || -> Vec<Result<ScanOutcome, ScanFailure>> {
        scans
            .par_iter()
            .map(|path| process_scan(path, config))
            .collect()
    };
    let results = match config.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()?
            .install(run),
        None => run(),
    };

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(ScanOutcome::Processed(summary)) => report.processed.push(summary),
            Ok(ScanOutcome::Skipped { scan }) => report.skipped.push(scan),
            Err(failure) => report.record_failure(failure),
        }
    }
    for duplicate in duplicates {
        let scan = scan_name(&duplicate.path);
        report.record_failure(ScanFailure::new(
            &scan,
            Stage::Prepare,
            StageError::DuplicateName {
                first: duplicate.first,
            },
        ));
    }

    report.manifest = Some(write_manifest(&config.output_dir, &report.scene_names())?);

    if let Some(trueview_dir) = &config.trueview_dir {
        report.record_trueview(extract_trueview_centers(trueview_dir, &config.output_dir));
    }

    report.elapsed = start.elapsed();
    info!("{report}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn invalid_config_refuses_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("out"),
            alpha: 0.0,
            ..PipelineConfig::default()
        };

        let err = run_batch(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ConfigError::InvalidAlpha(_))));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn empty_input_writes_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("out"),
            ..PipelineConfig::default()
        };

        let report = run_batch(&config).unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.is_success());
        assert!(scan_io::read_manifest(&config.output_dir).unwrap().is_empty());
    }

    #[test]
    fn trueview_failure_keeps_scan_results() {
        let mut report = BatchReport {
            skipped: vec!["lobby".to_string()],
            ..BatchReport::default()
        };
        report.record_trueview(Err(IoError::invalid_content("unreadable folder")));

        assert!(report.trueview.is_none());
        assert!(!report.is_success());
        assert!(matches!(report.trueview_error, Some(IoError::InvalidContent { .. })));
        assert_eq!(report.scene_names(), vec!["lobby"]);
    }

    #[test]
    fn scene_names_are_sorted() {
        let report = BatchReport {
            skipped: vec!["b".to_string(), "a".to_string()],
            ..BatchReport::default()
        };
        assert_eq!(report.scene_names(), vec!["a", "b"]);
    }
}
