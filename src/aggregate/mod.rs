//! Result aggregation.
//!
//! A single pass over the result tree: every `Z.txt` whose path and
//! content check out is written to the archive under its remapped group.
//! Malformed files are logged and skipped; a destination conflict or a
//! failure to open or write the archive aborts the run.

use crate::archive::ArchiveFile;
use crate::config::AggregateConfig;
use crate::layout::{parse_values, DATASET_NAME};
use crate::models::{AggregateSummary, PathLabels, ResultRecord, SkipReason, SkippedFile};
use crate::scanner::{ResultScanner, ScanConfig, ScannedFile};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for an aggregation run.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Stage the archive in a temporary file and rename it on success.
    pub atomic_write: bool,
    /// Show a spinner on stderr while walking.
    pub show_progress: bool,
    /// Directory walk settings.
    pub scan: ScanConfig,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            atomic_write: true,
            show_progress: false,
            scan: ScanConfig::default(),
        }
    }
}

impl From<&AggregateConfig> for AggregateOptions {
    fn from(config: &AggregateConfig) -> Self {
        Self {
            atomic_write: config.atomic_write,
            show_progress: config.show_progress,
            scan: ScanConfig::from(config),
        }
    }
}

/// Walks a result tree and writes one archive.
pub struct Aggregator {
    options: AggregateOptions,
}

impl Aggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Collect every result file under `root` into the archive at `output`.
    ///
    /// The archive is replaced as a whole; nothing from a previous archive
    /// at `output` is kept.
    pub fn run(&self, root: &Path, output: &Path) -> Result<AggregateSummary> {
        if !root.is_dir() {
            bail!("Result directory not found: {}", root.display());
        }

        let mut archive_file = ArchiveFile::create(output, self.options.atomic_write)
            .with_context(|| format!("Failed to open archive {}", output.display()))?;

        let scanner = ResultScanner::new(root.to_path_buf(), self.options.scan.clone());
        let progress = self.progress_bar();
        let mut summary = AggregateSummary::default();

        info!("Scanning {} for result files", root.display());

        for file in scanner.files() {
            summary.matched += 1;
            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            let relative = file.relative.display().to_string();

            let record = match load_record(&file) {
                Ok(record) => record,
                Err(reason) => {
                    if reason.is_path_problem() {
                        warn!("Skipping unexpected path: {} ({})", relative, reason);
                    } else {
                        warn!("Skipping {}: {}", relative, reason);
                    }
                    summary.skipped.push(SkippedFile {
                        path: relative,
                        reason,
                    });
                    continue;
                }
            };

            let group = record.labels.group_path();
            let ResultRecord { values, .. } = record;

            archive_file
                .archive_mut()
                .create_dataset(group.segments(), DATASET_NAME, values.to_vec())
                .with_context(|| {
                    format!(
                        "Conflicting result: {} maps to {}/{}, which is already written",
                        relative, group, DATASET_NAME
                    )
                })?;

            debug!("Stored {} as {}/{}", relative, group, DATASET_NAME);
            summary.written += 1;
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        archive_file
            .commit()
            .with_context(|| format!("Failed to write archive {}", output.display()))?;

        info!(
            "Aggregated {} of {} result files ({} skipped)",
            summary.written,
            summary.matched,
            summary.skipped.len()
        );

        Ok(summary)
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} result files")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

/// Collect the results under `root` into `output` with default options.
pub fn aggregate(root: &Path, output: &Path) -> Result<AggregateSummary> {
    Aggregator::new(AggregateOptions::default()).run(root, output)
}

/// Check the path, then read and check the content.
fn load_record(file: &ScannedFile) -> Result<ResultRecord, SkipReason> {
    let labels = PathLabels::from_relative_path(&file.relative)?;

    let content = fs::read_to_string(&file.path).map_err(|e| SkipReason::Unreadable {
        error: e.to_string(),
    })?;

    let values = parse_values(&content)?;
    Ok(ResultRecord { labels, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;
    use crate::errors::ArchiveError;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_result(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn run(root: &Path) -> (Result<AggregateSummary>, PathBuf) {
        let output = root.join("combined.json");
        (aggregate(&root.join("runs"), &output), output)
    }

    #[test]
    fn test_valid_file_round_trips_verbatim() {
        let temp = tempdir().unwrap();
        let content = "0.999999999999999999999999999999999999999999 1.5e-40\n-3.25 4\n";
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/16/32/0.75/128/7/Z.txt",
            content,
        );

        let (summary, output) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.written, 1);
        assert!(summary.skipped.is_empty());

        let archive = Archive::load(&output).unwrap();
        let dataset = archive.dataset("0.75/square/1.0/16/32/128/7/Z").unwrap();
        assert_eq!(
            dataset.values,
            vec![
                "0.999999999999999999999999999999999999999999",
                "1.5e-40",
                "-3.25",
                "4"
            ]
        );
        assert_eq!(archive.dataset_count(), 1);
    }

    #[test]
    fn test_shared_prefixes_reuse_groups() {
        let temp = tempdir().unwrap();
        for seed in ["1", "2", "3"] {
            write_result(
                temp.path(),
                &format!("runs/resultsGaussian/square/1.0/8/8/0.5/64/{}/Z.txt", seed),
                "1 2 3 4",
            );
        }
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.9/64/1/Z.txt",
            "5 6 7 8",
        );

        let (summary, output) = run(temp.path());
        assert_eq!(summary.unwrap().written, 4);

        let archive = Archive::load(&output).unwrap();
        assert_eq!(archive.root().groups.len(), 2);
        let leaf_parent = archive.group("0.5/square/1.0/8/8/64").unwrap();
        assert_eq!(leaf_parent.groups.len(), 3);
        assert_eq!(
            archive.dataset("0.9/square/1.0/8/8/64/1/Z").unwrap().values[0],
            "5"
        );
    }

    #[test]
    fn test_other_file_names_are_ignored() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/1/Z.dat",
            "1 2 3 4",
        );
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/1/log.txt",
            "1 2 3 4",
        );

        let (summary, output) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.matched, 0);
        assert!(summary.skipped.is_empty());
        assert_eq!(Archive::load(&output).unwrap().dataset_count(), 0);
    }

    #[test]
    fn test_wrong_root_is_skipped_with_path() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsUniform/square/1.0/8/8/0.5/64/1/Z.txt",
            "1 2 3 4",
        );

        let (summary, output) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.written, 0);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(
            PathBuf::from(&summary.skipped[0].path),
            PathBuf::from("resultsUniform/square/1.0/8/8/0.5/64/1/Z.txt")
        );
        assert!(matches!(
            summary.skipped[0].reason,
            SkipReason::WrongRoot { .. }
        ));
        assert_eq!(Archive::load(&output).unwrap().dataset_count(), 0);
    }

    #[test]
    fn test_shallow_path_is_skipped() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/Z.txt",
            "1 2 3 4",
        );

        let (summary, _) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.path_skips(), 1);
        assert_eq!(summary.written, 0);
    }

    #[test]
    fn test_file_one_level_short_is_written() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/a/b/c/d/e/f/Z.txt",
            "1 2 3 4",
        );
        write_result(temp.path(), "runs/resultsGaussian/a/b/c/d/e/Z.txt", "5 6 7 8");

        let (summary, output) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(
            summary.skipped[0].reason,
            SkipReason::TooShallow { segments: 7 }
        );

        let archive = Archive::load(&output).unwrap();
        assert_eq!(
            archive.dataset("e/a/b/c/d/f/Z.txt/Z").unwrap().values,
            vec!["1", "2", "3", "4"]
        );
    }

    #[test]
    fn test_non_decimal_tokens_are_written() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/1/Z.txt",
            "inf nan -inf 4",
        );

        let (summary, output) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.written, 1);
        assert!(summary.skipped.is_empty());
        assert_eq!(
            Archive::load(&output)
                .unwrap()
                .dataset("0.5/square/1.0/8/8/64/1/Z")
                .unwrap()
                .values,
            vec!["inf", "nan", "-inf", "4"]
        );
    }

    #[test]
    fn test_wrong_token_counts_are_skipped() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/1/Z.txt",
            "1 2 3",
        );
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/2/Z.txt",
            "1 2 3 4 5",
        );
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/3/Z.txt",
            "1 2 3 4",
        );

        let (summary, output) = run(temp.path());
        let summary = summary.unwrap();
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.content_skips(), 2);

        let archive = Archive::load(&output).unwrap();
        assert!(archive.dataset("0.5/square/1.0/8/8/64/1/Z").is_none());
        assert!(archive.dataset("0.5/square/1.0/8/8/64/2/Z").is_none());
        assert!(archive.dataset("0.5/square/1.0/8/8/64/3/Z").is_some());
    }

    #[test]
    fn test_colliding_destinations_are_fatal() {
        let temp = tempdir().unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/1/Z.txt",
            "1 2 3 4",
        );
        write_result(
            temp.path(),
            "runs/resultsGaussian/square/1.0/8/8/0.5/64/1/rerun/Z.txt",
            "5 6 7 8",
        );

        let (result, output) = run(temp.path());
        let err = result.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ArchiveError>(),
            Some(ArchiveError::DuplicateDataset { .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_run_keeps_previous_archive() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("combined.json");
        fs::write(&output, "previous").unwrap();

        write_result(
            temp.path(),
            "runs/resultsGaussian/a/b/c/d/e/f/g/Z.txt",
            "1 2 3 4",
        );
        write_result(
            temp.path(),
            "runs/resultsGaussian/a/b/c/d/e/f/g/h/Z.txt",
            "1 2 3 4",
        );

        assert!(aggregate(&temp.path().join("runs"), &output).is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_output_is_overwritten() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("combined.json");
        fs::write(&output, "previous").unwrap();
        write_result(
            temp.path(),
            "runs/resultsGaussian/a/b/c/d/e/f/g/Z.txt",
            "1 2 3 4",
        );

        aggregate(&temp.path().join("runs"), &output).unwrap();
        let archive = Archive::load(&output).unwrap();
        assert!(archive.dataset("e/a/b/c/d/f/g/Z").is_some());
    }

    #[test]
    fn test_non_atomic_run() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("combined.json");
        write_result(
            temp.path(),
            "runs/resultsGaussian/a/b/c/d/e/f/g/Z.txt",
            "1 2 3 4",
        );

        let options = AggregateOptions {
            atomic_write: false,
            ..AggregateOptions::default()
        };
        let summary = Aggregator::new(options)
            .run(&temp.path().join("runs"), &output)
            .unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(Archive::load(&output).unwrap().dataset_count(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("combined.json");
        assert!(aggregate(&temp.path().join("absent"), &output).is_err());
        assert!(!output.exists());
    }
}
