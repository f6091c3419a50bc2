//! arxiv-catchup main entry point
//!
//! This is the command-line interface for the arXiv catch-up downloader.

use anyhow::Context;
use arxiv_catchup::config::{load_config_with_hash, validate, Config};
use arxiv_catchup::crawler::{catch_up, resolve_checkpoint, CatchupOptions, ShutdownSignal};
use arxiv_catchup::output::{load_statistics, print_run_summary, print_statistics};
use arxiv_catchup::storage::SqliteStorage;
use arxiv_catchup::{CatchupError, Checkpoint};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// arxiv-catchup: download everything new in an arXiv category
///
/// Pages through the arXiv listing newest-first, stops at the first entry
/// older than the checkpoint, and downloads the e-print of every newer
/// entry with a bounded number of parallel downloads.
#[derive(Parser, Debug)]
#[command(name = "arxiv-catchup")]
#[command(version)]
#[command(about = "Incremental arXiv catch-up downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Checkpoint to catch up from (RFC 3339 or YYYY-MM-DD); defaults to the
    /// checkpoint left by the last completed run
    #[arg(long, value_name = "TS")]
    since: Option<String>,

    /// Override the category from the config file
    #[arg(long)]
    category: Option<String>,

    /// Override the listing page size
    #[arg(long)]
    page_size: Option<u32>,

    /// Override the maximum number of parallel downloads
    #[arg(long)]
    max_parallel: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the resolved checkpoint without downloading
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the run ledger and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    let since = cli
        .since
        .as_deref()
        .map(Checkpoint::parse)
        .transpose()
        .context("invalid --since")?;

    if cli.dry_run {
        handle_dry_run(&config, since)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_catch_up(config, config_hash, since).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("arxiv_catchup=info,warn"),
            1 => EnvFilter::new("arxiv_catchup=debug,info"),
            2 => EnvFilter::new("arxiv_catchup=trace,debug"),
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

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(category) = &cli.category {
        config.feed.category = category.clone();
    }
    if let Some(page_size) = cli.page_size {
        config.feed.page_size = page_size;
    }
    if let Some(max_parallel) = cli.max_parallel {
        config.download.max_parallel_downloads = max_parallel;
    }

    validate(config).context("invalid command-line override")
}

/// Handles the --dry-run mode: shows the effective settings and checkpoint
fn handle_dry_run(config: &Config, since: Option<Checkpoint>) -> anyhow::Result<()> {
    println!("=== arxiv-catchup Dry Run ===\n");

    println!("Feed:");
    println!("  API URL: {}", config.feed.api_url);
    println!("  Category: {}", config.feed.category);
    println!("  Page size: {}", config.feed.page_size);
    println!("  Request delay: {}ms", config.feed.request_delay_ms);

    println!("\nDownload:");
    println!("  Artifact URL: {}", config.download.artifact_url);
    println!("  Output directory: {}", config.download.output_dir);
    println!(
        "  Max parallel downloads: {}",
        config.download.max_parallel_downloads
    );
    println!("  Skip existing: {}", config.download.skip_existing);
    println!("  Timeout: {}s", config.download.timeout_secs);
    for (media_type, extension) in &config.download.extensions {
        println!("  Extension: {} -> .{}", media_type, extension);
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");

    let checkpoint = match since {
        Some(checkpoint) => Some(checkpoint),
        None if Path::new(&config.storage.database_path).exists() => {
            let storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
            match resolve_checkpoint(&storage, &config.feed.category, None) {
                Ok(checkpoint) => Some(checkpoint),
                Err(CatchupError::MissingCheckpoint(_)) => None,
                Err(e) => return Err(e.into()),
            }
        }
        None => None,
    };

    match checkpoint {
        Some(checkpoint) => println!(
            "✓ Would download entries of cat:{} updated since {}",
            config.feed.category, checkpoint
        ),
        None => println!(
            "✗ No checkpoint recorded for cat:{}; a real run needs --since",
            config.feed.category
        ),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the run ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))
        .context("failed to open run ledger")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main catch-up operation
async fn handle_catch_up(
    config: Config,
    config_hash: String,
    since: Option<Checkpoint>,
) -> anyhow::Result<()> {
    let shutdown = ShutdownSignal::shared();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; finishing submitted downloads");
                shutdown.request_shutdown();
            }
        });
    }

    let options = CatchupOptions {
        since,
        config_hash,
        shutdown: Some(shutdown),
    };

    match catch_up(&config, options).await {
        Ok(report) => {
            print_run_summary(&report.summary);
            if report.summary.failures > 0 {
                tracing::warn!(
                    "{} downloads failed; checkpoint not advanced",
                    report.summary.failures
                );
            }
            Ok(())
        }
        Err(CatchupError::FeedQuery {
            offset,
            source,
            partial,
        }) => {
            print_run_summary(&partial.summary);
            Err(anyhow::Error::new(source))
                .with_context(|| format!("listing query at offset {} failed", offset))
        }
        Err(e) => Err(e).context("catch-up failed"),
    }
}
