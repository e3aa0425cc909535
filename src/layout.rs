//! Result directory layout.
//!
//! Result files live at
//! `resultsGaussian/<problem>/<stddev>/<x>/<y>/<T_frac>/<precision>/<seed>/Z.txt`
//! relative to the scanned root. This module turns such a path into
//! [`PathLabels`], remaps the labels into the archive group path, and
//! validates the file content.

use crate::models::{GroupPath, PathLabels, SkipReason, VALUE_COUNT};
use bigdecimal::BigDecimal;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Base name of a qualifying result file.
pub const SENTINEL_FILE: &str = "Z.txt";

/// Required first component of a result file's relative path.
pub const SENTINEL_ROOT: &str = "resultsGaussian";

/// Name of the dataset written in every leaf group.
pub const DATASET_NAME: &str = "Z";

/// Number of labels encoded in the directory names.
pub const LABEL_COUNT: usize = 7;

/// Sentinel root and the labels. The last label may be the file name itself.
const MIN_SEGMENTS: usize = 1 + LABEL_COUNT;

/// True if the path names a `Z.txt` file.
pub fn is_result_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == SENTINEL_FILE)
        .unwrap_or(false)
}

impl PathLabels {
    /// Parse the labels out of a path relative to the scanned root.
    pub fn from_relative_path(relative: &Path) -> Result<Self, SkipReason> {
        let segments = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<&str>>>()
            .ok_or(SkipReason::NonUtf8Path)?;

        Self::from_segments(&segments)
    }

    /// Parse the labels out of already-split path segments.
    ///
    /// Only the seven components after the sentinel root become labels.
    /// Anything deeper is ignored, and a path one level short binds the
    /// file name as `seed`.
    pub fn from_segments(segments: &[&str]) -> Result<Self, SkipReason> {
        if segments.len() < MIN_SEGMENTS {
            return Err(SkipReason::TooShallow {
                segments: segments.len(),
            });
        }

        if segments[0] != SENTINEL_ROOT {
            return Err(SkipReason::WrongRoot {
                found: segments[0].to_string(),
            });
        }

        let [problem, stddev, x, y, t_frac, precision, seed] = [
            segments[1], segments[2], segments[3], segments[4], segments[5], segments[6],
            segments[7],
        ]
        .map(String::from);

        Ok(Self {
            problem,
            stddev,
            x,
            y,
            t_frac,
            precision,
            seed,
        })
    }

    /// Destination group in the archive: `T_frac` first, `seed` last.
    pub fn group_path(&self) -> GroupPath {
        GroupPath::new(vec![
            self.t_frac.clone(),
            self.problem.clone(),
            self.stddev.clone(),
            self.x.clone(),
            self.y.clone(),
            self.precision.clone(),
            self.seed.clone(),
        ])
    }
}

/// Split file content into exactly four tokens, kept as written.
pub fn parse_values(content: &str) -> Result<[String; VALUE_COUNT], SkipReason> {
    let tokens: Vec<&str> = content.split_whitespace().collect();

    if tokens.len() != VALUE_COUNT {
        return Err(SkipReason::WrongTokenCount {
            found: tokens.len(),
        });
    }

    if let Some(odd) = tokens.iter().find(|t| BigDecimal::from_str(t).is_err()) {
        debug!("Keeping non-decimal token '{}' verbatim", odd);
    }

    Ok([tokens[0], tokens[1], tokens[2], tokens[3]].map(String::from))
}
