//! Command-line interface argument parsing.
//!
//! This module handles CLI argument parsing for both binaries using
//! clap, including validation and default values.

use crate::config::GeneralConfig;
use clap::Parser;
use std::path::PathBuf;

/// zresults-combine - collect Z.txt results into one archive
///
/// Walks RESULT_DIR for `resultsGaussian/<problem>/<stddev>/<x>/<y>/<T_frac>/<precision>/<seed>/Z.txt`
/// files and writes their four values to OUTPUT under
/// `<T_frac>/<problem>/<stddev>/<x>/<y>/<precision>/<seed>/Z`.
///
/// Examples:
///   zresults-combine ./runs combined.json
///   zresults-combine ./runs combined.json --verbose
///   zresults-combine --init-config
#[derive(Parser, Debug, Clone)]
#[command(name = "zresults-combine", author, version, about, long_about = None)]
pub struct CombineArgs {
    /// Root directory containing resultsGaussian
    #[arg(value_name = "RESULT_DIR", required_unless_present = "init_config")]
    pub root: Option<PathBuf>,

    /// Output archive file
    #[arg(value_name = "OUTPUT", required_unless_present = "init_config")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .zresults.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Write the archive in place instead of through a temporary file
    #[arg(long)]
    pub no_atomic: bool,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_links: bool,

    /// Generate a default .zresults.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// zresults-compare - check that two Z.txt files agree
///
/// Reads four decimal values from the first line of each file and reports
/// the first position whose relative difference |v1 - v2| / v1 exceeds
/// the tolerance.
///
/// Exit codes: 0 match, 1 mismatch or unreadable input, 2 usage error.
#[derive(Parser, Debug, Clone)]
#[command(name = "zresults-compare", author, version, about, long_about = None)]
pub struct CompareArgs {
    /// Reference file (denominator of the relative difference)
    #[arg(value_name = "FILE1")]
    pub file1: PathBuf,

    /// File to check against the reference
    #[arg(value_name = "FILE2")]
    pub file2: PathBuf,

    /// Largest accepted relative difference
    ///
    /// Default: from config or 1e-9.
    #[arg(long, value_name = "TOL", env = "ZRESULTS_TOLERANCE")]
    pub tolerance: Option<String>,

    /// Working precision in significant decimal digits
    ///
    /// Default: from config or 128.
    #[arg(long, value_name = "DIGITS")]
    pub precision: Option<u64>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

fn level_for(verbose: bool, quiet: bool) -> tracing::Level {
    if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

impl CombineArgs {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let root = self
            .root
            .as_ref()
            .ok_or_else(|| "Missing result directory".to_string())?;
        if !root.exists() {
            return Err(format!("Result directory does not exist: {}", root.display()));
        }
        if !root.is_dir() {
            return Err(format!("Result path is not a directory: {}", root.display()));
        }

        match self.output {
            Some(ref output) if output.is_dir() => Err(format!(
                "Output path is a directory: {}",
                output.display()
            )),
            Some(_) => Ok(()),
            None => Err("Missing output archive path".to_string()),
        }
    }

    /// Returns the log level from the flags and the `[general]` config section.
    ///
    /// `--quiet` wins over a configured `verbose = true`.
    pub fn log_level(&self, general: &GeneralConfig) -> tracing::Level {
        level_for(self.verbose || general.verbose, self.quiet)
    }
}

impl CompareArgs {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.precision == Some(0) {
            return Err("Precision must be at least 1 digit".to_string());
        }

        Ok(())
    }

    /// Returns the log level from the flags and the `[general]` config section.
    ///
    /// `--quiet` wins over a configured `verbose = true`.
    pub fn log_level(&self, general: &GeneralConfig) -> tracing::Level {
        level_for(self.verbose || general.verbose, self.quiet)
    }
}
