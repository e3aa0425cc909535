//! File scanner for discovering `Z.txt` result files.
//!
//! Walks the result root recursively and yields every file named
//! `Z.txt`, together with its path relative to the root. Anything
//! else is ignored without a log line.

use crate::layout::is_result_file;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for file scanning.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Follow symbolic links while walking.
    pub follow_links: bool,
}

impl From<&crate::config::AggregateConfig> for ScanConfig {
    fn from(config: &crate::config::AggregateConfig) -> Self {
        Self {
            follow_links: config.follow_links,
        }
    }
}

/// A result file found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path as reached by the walk (root joined with `relative`).
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative: PathBuf,
}

/// Scanner for result files below a root directory.
pub struct ResultScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl ResultScanner {
    /// Create a new scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Lazily walk the root, yielding result files in filesystem order.
    ///
    /// Entries that cannot be read are logged and skipped.
    pub fn files(&self) -> impl Iterator<Item = ScannedFile> + '_ {
        let root = self.root.as_path();

        WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    let location = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    warn!("Cannot read {}: {}", location, e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_result_file(entry.path()))
            .filter_map(move |entry| {
                let path = entry.into_path();
                match path.strip_prefix(root) {
                    Ok(relative) => Some(ScannedFile {
                        relative: relative.to_path_buf(),
                        path: path.clone(),
                    }),
                    Err(_) => {
                        debug!("Entry outside scan root: {}", path.display());
                        None
                    }
                }
            })
    }

    /// Collect all result files.
    pub fn scan(&self) -> Vec<ScannedFile> {
        self.files().collect()
    }
}
