use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the hierarchical archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("dataset '{name}' already exists in group '{group}'")]
    DuplicateDataset { group: String, name: String },
    #[error("'{path}' is a dataset, not a group")]
    NotAGroup { path: String },
    #[error("'{name}' in group '{group}' is already a group")]
    NameIsGroup { group: String, name: String },
    #[error("invalid group or dataset name '{0}'")]
    InvalidName(String),
    #[error("failed to open archive {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to write archive {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{path} is not a zresults archive: {reason}")]
    Format { path: PathBuf, reason: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised while comparing two result files.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("file {path} does not contain exactly four values (found {found})")]
    Format { path: PathBuf, found: usize },
    #[error("file {path}: '{token}' is not a decimal number")]
    Parse { path: PathBuf, token: String },
    #[error("invalid tolerance '{0}': must be a non-negative decimal")]
    Tolerance(String),
    #[error("precision must be at least 1 significant digit")]
    Precision,
}
