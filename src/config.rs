//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.zresults.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".zresults.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregator settings.
    #[serde(default)]
    pub aggregate: AggregateConfig,

    /// Comparator settings.
    #[serde(default)]
    pub compare: CompareConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Stage the archive in a temporary file and rename it into place.
    #[serde(default = "default_true")]
    pub atomic_write: bool,

    /// Show a spinner while walking the result tree.
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Follow symbolic links while walking.
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            atomic_write: true,
            show_progress: true,
            follow_links: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Comparator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Largest accepted relative difference, as a decimal string.
    #[serde(default = "default_tolerance")]
    pub tolerance: String,

    /// Working precision in significant decimal digits.
    #[serde(default = "default_precision")]
    pub precision: u64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            precision: default_precision(),
        }
    }
}

fn default_tolerance() -> String {
    "1e-9".to_string()
}

fn default_precision() -> u64 {
    128
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.zresults.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply aggregator CLI arguments. CLI values take precedence.
    pub fn merge_with_combine_args(&mut self, args: &crate::cli::CombineArgs) {
        if args.verbose {
            self.general.verbose = true;
        }
        if args.quiet || args.no_progress {
            self.aggregate.show_progress = false;
        }
        if args.no_atomic {
            self.aggregate.atomic_write = false;
        }
        if args.follow_links {
            self.aggregate.follow_links = true;
        }
    }

    /// Apply comparator CLI arguments. CLI values take precedence.
    pub fn merge_with_compare_args(&mut self, args: &crate::cli::CompareArgs) {
        if args.verbose {
            self.general.verbose = true;
        }
        if let Some(ref tolerance) = args.tolerance {
            self.compare.tolerance = tolerance.clone();
        }
        if let Some(precision) = args.precision {
            self.compare.precision = precision;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
