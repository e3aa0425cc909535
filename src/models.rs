//! Data models for the result aggregator.
//!
//! This module contains the core data structures used throughout
//! the application for representing parsed result files, skip
//! reasons, and run summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of scalars a `Z.txt` file must hold.
pub const VALUE_COUNT: usize = 4;

/// Metadata recovered from a result file's directory path.
///
/// The on-disk order is `problem/stddev/x/y/T_frac/precision/seed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathLabels {
    pub problem: String,
    pub stddev: String,
    pub x: String,
    pub y: String,
    pub t_frac: String,
    pub precision: String,
    pub seed: String,
}

/// Remapped destination of a record inside the archive.
///
/// Always `T_frac/problem/stddev/x/y/precision/seed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupPath(Vec<String>);

impl GroupPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Path segments from the archive root down to the leaf group.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// A validated result file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// Labels parsed from the directory path.
    pub labels: PathLabels,
    /// The four scalar tokens, verbatim.
    pub values: [String; VALUE_COUNT],
}

/// Why a `Z.txt` file was left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The relative path is too short to hold the sentinel and the 7 labels.
    TooShallow { segments: usize },
    /// The first path component is not the sentinel root.
    WrongRoot { found: String },
    /// A path component is not valid UTF-8.
    NonUtf8Path,
    /// The file could not be read as text.
    Unreadable { error: String },
    /// The content does not split into exactly four tokens.
    WrongTokenCount { found: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooShallow { segments } => {
                write!(f, "path too shallow ({} segments)", segments)
            }
            SkipReason::WrongRoot { found } => write!(f, "unexpected root segment '{}'", found),
            SkipReason::NonUtf8Path => write!(f, "path is not valid UTF-8"),
            SkipReason::Unreadable { error } => write!(f, "unreadable: {}", error),
            SkipReason::WrongTokenCount { found } => {
                write!(f, "expected {} values, found {}", VALUE_COUNT, found)
            }
        }
    }
}

impl SkipReason {
    /// True for problems with the path layout rather than the file content.
    pub fn is_path_problem(&self) -> bool {
        matches!(
            self,
            SkipReason::TooShallow { .. } | SkipReason::WrongRoot { .. } | SkipReason::NonUtf8Path
        )
    }
}

/// A file that was seen but not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Path relative to the walk root.
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Number of `Z.txt` files found under the root.
    pub matched: usize,
    /// Number of datasets written to the archive.
    pub written: usize,
    /// Files that were skipped, in walk order.
    pub skipped: Vec<SkippedFile>,
}

impl AggregateSummary {
    /// Number of skipped files whose path did not fit the layout.
    pub fn path_skips(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| s.reason.is_path_problem())
            .count()
    }

    /// Number of skipped files whose content was rejected.
    pub fn content_skips(&self) -> usize {
        self.skipped.len() - self.path_skips()
    }
}
