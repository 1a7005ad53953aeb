//! m3u8-sweep main entry point
//!
//! This is the command-line interface for the m3u8-sweep batch extractor.

use clap::Parser;
use m3u8_sweep::config::{load_config_with_hash, validate, Config};
use m3u8_sweep::runner::{print_summary, run_sweep, BatchRunner};
use m3u8_sweep::HttpManifestExtractor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// m3u8-sweep: batch extraction of m3u8 manifest URLs
///
/// Reads a CSV table with a `url` column, looks up the m3u8 manifest behind
/// each page and writes it back into the table. Progress is checkpointed so
/// an interrupted run continues where it stopped.
#[derive(Parser, Debug)]
#[command(name = "m3u8-sweep")]
#[command(version)]
#[command(about = "Batch m3u8 manifest URL extraction", long_about = None)]
struct Cli {
    /// Path to the CSV table
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(long)]
    workers: Option<usize>,

    /// Save the table after this many processed rows
    #[arg(long)]
    save: Option<usize>,

    /// Row to start from (overrides the checkpoint)
    #[arg(long)]
    start: Option<usize>,

    /// Attempts per row before giving up
    #[arg(long)]
    retries: Option<u32>,

    /// Optional TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the resolved settings and pending rows without extracting
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of `config`
    fn apply(&self, config: &mut Config) {
        if let Some(csv) = &self.csv {
            config.table.path = csv.clone();
        }
        if let Some(workers) = self.workers {
            config.runner.workers = workers;
        }
        if let Some(save) = self.save {
            config.runner.flush_every = save;
        }
        if let Some(start) = self.start {
            config.runner.resume_from = Some(start);
        }
        if let Some(retries) = self.retries {
            config.runner.max_retries = retries;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    cli.apply(&mut config);
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(config)?;
    } else {
        handle_sweep(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("m3u8_sweep=info,warn"),
            1 => EnvFilter::new("m3u8_sweep=debug,info"),
            2 => EnvFilter::new("m3u8_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: prints settings and the rows that would be processed
fn handle_dry_run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== m3u8-sweep Dry Run ===\n");

    println!("Runner Configuration:");
    println!("  Workers: {}", config.runner.workers);
    println!("  Batch size: {}", config.runner.batch_size);
    println!(
        "  Flush: every {} rows or {}s",
        config.runner.flush_every, config.runner.flush_interval_secs
    );
    println!(
        "  Attempts per row: {} ({}ms apart)",
        config.runner.max_retries, config.runner.retry_delay_ms
    );

    println!("\nTable:");
    println!("  Path: {}", config.table.path.display());
    println!("  Checkpoint: {}", config.table.checkpoint_path().display());
    println!("  Manifest column: {}", config.table.manifest_column);

    let extractor = HttpManifestExtractor::new(&config.extractor)?;
    let runner = BatchRunner::new(config, Arc::new(extractor));
    let sweep = runner.plan()?;

    println!("\nRows: {}", sweep.rows.len());
    println!("Starting at row: {}", sweep.resume_from);
    println!("Rows without URL: {}", sweep.plan.skipped.len());
    println!("\nPending Tasks ({}):", sweep.plan.tasks.len());
    for task in &sweep.plan.tasks {
        println!("  [{}] {} - {}", task.index + 1, task.display_name, task.url);
    }

    Ok(())
}

/// Handles the main sweep operation
async fn handle_sweep(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let started = chrono::Local::now();
    tracing::info!("Processing table: {}", config.table.path.display());
    tracing::info!("Start time: {}", started.format("%Y-%m-%d %H:%M:%S"));
    tracing::info!(
        "Settings: workers={}, save every {}, start={}",
        config.runner.workers,
        config.runner.flush_every,
        config
            .runner
            .resume_from
            .map(|s| s.to_string())
            .unwrap_or_else(|| "checkpoint".to_string())
    );

    match run_sweep(config).await {
        Ok(summary) => {
            tracing::info!(
                "Finish time: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}
