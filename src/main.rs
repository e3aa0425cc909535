//! zresults-combine - collect Z.txt results into one archive
//!
//! Exit codes:
//!   0 - Success (skipped files are reported as warnings)
//!   1 - Runtime error (missing root, archive conflict, write failure, etc.)
//!   2 - Usage error

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zresults::cli::CombineArgs;
use zresults::config::{Config, CONFIG_FILE_NAME};
use zresults::{AggregateOptions, AggregateSummary, Aggregator, Archive};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = CombineArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first so [general] verbose can pick the log level
    let (mut config, config_warning) = match load_config(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) if args.config.is_none() => (Config::default(), Some(e)),
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(&config.general));

    info!("zresults-combine v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if let Some(e) = config_warning {
        warn!("Failed to load config, using defaults: {:#}", e);
    }

    config.merge_with_combine_args(&args);

    if let Err(e) = run_combine(&args, &config) {
        error!("Aggregation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .zresults.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn run_combine(args: &CombineArgs, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let (root, output) = match (&args.root, &args.output) {
        (Some(root), Some(output)) => (root, output),
        _ => anyhow::bail!("Both RESULT_DIR and OUTPUT are required"),
    };

    if !args.quiet {
        println!("🔍 Scanning {}", root.display());
    }

    let aggregator = Aggregator::new(AggregateOptions::from(&config.aggregate));
    let summary = aggregator.run(root, output)?;
    log_written_archive(output);

    if !args.quiet {
        print_summary(&summary, output, start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

fn print_summary(summary: &AggregateSummary, output: &Path, duration: f64) {
    println!("\n📊 Aggregation Summary:");
    println!("   Result files found: {}", summary.matched);
    println!("   Datasets written: {}", summary.written);
    if !summary.skipped.is_empty() {
        println!(
            "   Skipped: {} ({} unexpected paths, {} bad contents)",
            summary.skipped.len(),
            summary.path_skips(),
            summary.content_skips()
        );
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Archive saved to: {}", output.display());
}

/// Read the committed archive back and log what it holds.
fn log_written_archive(output: &Path) {
    match Archive::load(output) {
        Ok(archive) => debug!(
            "{} holds {} datasets (created {})",
            output.display(),
            archive.dataset_count(),
            archive.created_at().to_rfc3339()
        ),
        Err(e) => warn!("Could not read back {}: {}", output.display(), e),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so nothing is logged here.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(config_path) => Config::load(config_path),
        None => Ok(Config::load_default()?.unwrap_or_default()),
    }
}
