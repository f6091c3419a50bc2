//! Crawler module for catch-up runs
//!
//! This module contains the core catch-up logic, including:
//! - Artifact fetching with extension resolution
//! - The checkpoint stopping rule over listing pages
//! - Bounded concurrent downloads
//! - Overall run orchestration and ledger bookkeeping

mod coordinator;
mod fetcher;
mod frontier;
mod pool;
mod shutdown;

pub use coordinator::{CrawlOrchestrator, CrawlReport, CrawlRequest};
pub use fetcher::{build_http_client, ArtifactFetcher, ExtensionMap};
pub use frontier::{FrontierWalker, StopReason, WalkState, WalkStats};
pub use pool::DownloadPool;
pub use shutdown::{SharedShutdown, ShutdownSignal};

use crate::config::Config;
use crate::output::RunSummary;
use crate::state::Checkpoint;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::{CatchupError, Result};
use std::path::Path;

/// Per-invocation inputs that do not come from the config file
#[derive(Debug, Clone, Default)]
pub struct CatchupOptions {
    /// Explicit checkpoint; overrides the one recorded in the ledger
    pub since: Option<Checkpoint>,

    /// Hash of the configuration file, recorded with the run
    pub config_hash: String,

    pub shutdown: Option<SharedShutdown>,
}

/// Picks the checkpoint for a run
///
/// An explicit `since` wins; otherwise the checkpoint left by the last
/// completed run of `category` is used.
pub fn resolve_checkpoint(
    storage: &dyn Storage,
    category: &str,
    since: Option<Checkpoint>,
) -> Result<Checkpoint> {
    if let Some(checkpoint) = since {
        return Ok(checkpoint);
    }

    storage
        .latest_checkpoint(category)?
        .ok_or_else(|| CatchupError::MissingCheckpoint(category.to_string()))
}

/// Runs a complete catch-up and records it in the ledger
///
/// This is the main entry point for a catch-up. It will:
/// 1. Open the ledger database
/// 2. Resolve the checkpoint
/// 3. Record the run as started
/// 4. Page, walk and download until the walker stops
/// 5. Record outcomes and the run's final status and next checkpoint
///
/// Cancelled runs are recorded as interrupted and fatal runs as failed;
/// neither leaves a checkpoint behind.
///
/// # Example
///
/// ```no_run
/// use arxiv_catchup::config::load_config;
/// use arxiv_catchup::crawler::{catch_up, CatchupOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = catch_up(&config, CatchupOptions::default()).await?;
/// println!("{} downloads", report.summary.successes);
/// # Ok(())
/// # }
/// ```
pub async fn catch_up(
    config: &Config,
    options: CatchupOptions,
) -> Result<CrawlReport> {
    let mut storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
    let checkpoint = resolve_checkpoint(&storage, &config.feed.category, options.since)?;

    let mut orchestrator = CrawlOrchestrator::from_config(config)?;
    if let Some(shutdown) = options.shutdown {
        orchestrator = orchestrator.with_shutdown(shutdown);
    }

    let request = CrawlRequest::from_config(config, checkpoint);
    let run_id = storage.create_run(&request.category, checkpoint, &options.config_hash)?;
    tracing::info!("Starting run {}", run_id);

    match orchestrator.run(&request).await {
        Ok(report) => {
            if report.was_cancelled() {
                settle_run(&mut storage, run_id, RunStatus::Interrupted, &report, None)?;
                tracing::info!("Run {} interrupted; checkpoint unchanged", run_id);
            } else {
                let next = report.next_checkpoint(checkpoint);
                settle_run(&mut storage, run_id, RunStatus::Completed, &report, Some(next))?;
                tracing::info!("Run {} completed; next checkpoint {}", run_id, next);
            }

            Ok(report)
        }
        Err(CatchupError::FeedQuery {
            offset,
            source,
            partial,
        }) => {
            settle_run(&mut storage, run_id, RunStatus::Failed, &partial, None)?;
            Err(CatchupError::FeedQuery {
                offset,
                source,
                partial,
            })
        }
        Err(e) => {
            if let Err(finish_err) =
                storage.finish_run(run_id, RunStatus::Failed, &RunSummary::default(), None)
            {
                tracing::error!("Failed to mark run {} as failed: {}", run_id, finish_err);
            }
            Err(e)
        }
    }
}

/// Records a run's outcomes and final status
///
/// If either write fails the run is marked failed on a best-effort basis,
/// so it never stays `running`, and the original error is returned.
fn settle_run(
    storage: &mut dyn Storage,
    run_id: i64,
    status: RunStatus,
    report: &CrawlReport,
    next: Option<Checkpoint>,
) -> Result<()> {
    let recorded = storage
        .record_outcomes(run_id, &report.outcomes)
        .and_then(|()| storage.finish_run(run_id, status, &report.summary, next));

    if let Err(e) = recorded {
        tracing::error!("Failed to record run {}: {}", run_id, e);
        if let Err(finish_err) = storage.finish_run(run_id, RunStatus::Failed, &report.summary, None) {
            tracing::error!("Failed to mark run {} as failed: {}", run_id, finish_err);
        }
        return Err(e.into());
    }

    Ok(())
}
