//! CMS-Scout main entry point
//!
//! This is the command-line interface for the CMS-Scout batch classifier.

use anyhow::Context;
use clap::Parser;
use cms_scout::batch::CheckpointStore;
use cms_scout::config::{load_config_with_hash, Config};
use cms_scout::input::load_records;
use cms_scout::output::{load_statistics, print_statistics};
use cms_scout::storage::open_storage;
use cms_scout::{submit_batch, BatchScheduler, JobEvent, JobState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// CMS-Scout: a resumable CMS classifier
///
/// CMS-Scout reads a list of website domains, decides which of them run on
/// the configured content-management platform, and enriches the matches with
/// authority, backlink, sitemap and search-index metrics.
#[derive(Parser, Debug)]
#[command(name = "cms-scout")]
#[command(version = "1.0.0")]
#[command(about = "A resumable CMS classifier", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// CSV file with one site per row
    #[arg(value_name = "INPUT", required_unless_present = "stats")]
    input: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the checkpoint and start from the first record
    #[arg(long)]
    fresh: bool,

    /// Validate config and input, print the plan, and exit
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let input = cli
        .input
        .context("An input CSV file is required")?;

    if cli.dry_run {
        handle_dry_run(&config, &input)
    } else {
        handle_run(config, config_hash, &input, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cms_scout=info,warn"),
            1 => EnvFilter::new("cms_scout=debug,info"),
            2 => EnvFilter::new("cms_scout=trace,debug"),
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

/// Handles the --dry-run mode: validates config and input and shows the plan
fn handle_dry_run(config: &Config, input: &Path) -> anyhow::Result<()> {
    let records = load_records(input, &config.input.domain_column)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    let checkpoint = CheckpointStore::new(&config.output.checkpoint_path);
    let resume_at = checkpoint.load()?;

    println!("=== CMS-Scout Dry Run ===\n");

    println!("Detection:");
    println!("  Platform: {}", config.detection.platform);
    println!("  Positive patterns: {}", config.detection.positive_patterns.len());
    println!("  Negative patterns: {}", config.detection.negative_patterns.len());
    println!(
        "  Confirmation: {}",
        if config.detection.confirm {
            config.detection.confirmation_path.as_str()
        } else {
            "off"
        }
    );
    println!(
        "  Technology fallback: {}",
        if config.detection.technology_fallback { "on" } else { "off" }
    );

    println!("\nPacing:");
    println!("  Requests per second: {}", config.rate_limit.requests_per_second);
    println!("  Max connections: {}", config.http.max_connections);
    println!("  Chunk size: {}", config.batch.chunk_size);
    println!("  Max concurrent records: {}", config.batch.max_concurrent);
    println!("  Chunk cooldown: {}ms", config.batch.chunk_cooldown_ms);
    println!(
        "  Retries: {} (from {}ms, x{})",
        config.retry.max_retries, config.retry.initial_delay_ms, config.retry.multiplier
    );

    println!("\nAPIs:");
    println!(
        "  Provider: {} ({})",
        config.api.base_url,
        if config.api.login.is_empty() { "no login" } else { "login set" }
    );
    println!(
        "  Search: {}",
        if config.api.search_key.is_empty() || config.api.search_engine_id.is_empty() {
            "disabled"
        } else {
            config.api.search_url.as_str()
        }
    );

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Database: {}", config.output.database_path);
    println!("  Output directory: {}", config.output.output_dir);

    println!("\nInput:");
    println!("  File: {}", input.display());
    println!("  Domain column: {}", config.input.domain_column);
    println!("  Records: {}", records.len());

    println!("\n✓ Configuration is valid");
    if resume_at > 0 && resume_at < records.len() {
        println!("✓ Would resume at record {} of {}", resume_at, records.len());
    } else {
        println!("✓ Would process {} records from the start", records.len());
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open the recovery store")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main batch run
async fn handle_run(
    config: Config,
    config_hash: String,
    input: &Path,
    fresh: bool,
) -> anyhow::Result<()> {
    let records = load_records(input, &config.input.domain_column)
        .with_context(|| format!("Failed to read input {}", input.display()))?;

    if fresh {
        tracing::info!("Starting fresh run (discarding checkpoint)");
        CheckpointStore::new(&config.output.checkpoint_path).clear()?;
    } else {
        tracing::info!("Starting run (will resume from checkpoint if present)");
    }

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open the recovery store")?;
    let scheduler = BatchScheduler::new(Arc::new(config), storage, config_hash)?;

    let mut job = submit_batch(scheduler, records);

    let cancel = job.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current chunk");
            cancel.cancel();
        }
    });

    while let Some(event) = job.next_event().await {
        match event {
            JobEvent::Progress {
                percent,
                processed,
                total,
            } => {
                tracing::info!("Progress: {:.1}% ({}/{})", percent, processed, total);
            }
            JobEvent::Error { message } => {
                tracing::warn!("{}", message);
            }
            JobEvent::Finished { state, outcomes } => {
                tracing::info!("Run finished: {} ({} outcomes stored)", state, outcomes.len());
            }
        }
    }

    let summary = job.wait().await.context("Batch run failed")?;
    match summary.state {
        JobState::Completed => {
            tracing::info!(
                "Processed {} records (from {} of {})",
                summary.processed,
                summary.resumed_from,
                summary.total
            );
        }
        JobState::Cancelled => {
            tracing::info!(
                "Run cancelled after {} records; rerun to resume",
                summary.resumed_from + summary.processed
            );
        }
        _ => {}
    }

    Ok(())
}
