//! zresults-compare - check that two Z.txt files agree within tolerance
//!
//! Exit codes:
//!   0 - All four values agree
//!   1 - Mismatch, unreadable input or bad options
//!   2 - Usage error

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::FmtSubscriber;
use zresults::cli::CompareArgs;
use zresults::config::{Config, CONFIG_FILE_NAME};
use zresults::{compare_files, CompareOptions};

fn main() {
    let args = CompareArgs::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let (mut config, config_warning) = match load_config(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) if args.config.is_none() => (Config::default(), Some(e)),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(&config.general));
    debug!("Arguments: {:?}", args);
    if let Some(e) = config_warning {
        warn!("Failed to load {}, using defaults: {:#}", CONFIG_FILE_NAME, e);
    }

    config.merge_with_compare_args(&args);

    match run_compare(&args, &config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn run_compare(args: &CompareArgs, config: &Config) -> Result<i32> {
    let options = CompareOptions::try_from(&config.compare).context("Invalid compare options")?;
    debug!(
        "Comparing {} and {} (tolerance {}, precision {})",
        args.file1.display(),
        args.file2.display(),
        options.tolerance,
        options.precision
    );

    let outcome = compare_files(&args.file1, &args.file2, &options)?;
    println!("{}", outcome);

    Ok(outcome.exit_code())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(config_path) => Config::load(config_path),
        None => Ok(Config::load_default()?.unwrap_or_default()),
    }
}
