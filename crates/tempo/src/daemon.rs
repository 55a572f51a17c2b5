//! Daemon command: wires the stores and ports to the scheduler and runs
//! until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use miette::Result;
use tracing::info;

use tempo_compose::ChangeComposer;
use tempo_git::GitRepository;
use tempo_scheduler::{CommitScheduler, ErrorJournal, Orchestrator, RetryStore, StatsStore};

use crate::config::{self, FileConfig};

/// Build a fully-wired scheduler from the loaded configuration.
///
/// Initializes the repository work tree as a side effect, so a configured but
/// empty directory becomes usable on first run.
pub async fn build_scheduler(file: &FileConfig) -> Result<Arc<CommitScheduler>> {
    if file.repository.path.trim().is_empty() {
        return Err(miette::miette!(
            "repository.path is not configured - run 'tempo init' and edit the config file"
        ));
    }

    let scheduler_config = file.scheduler_config();
    scheduler_config
        .validate()
        .map_err(|e| miette::miette!("{}", e))?;

    let now = Utc::now();
    let retry = Arc::new(RetryStore::open(file.pending_path(), &scheduler_config));
    let stats = Arc::new(StatsStore::open(file.statistics_path(), now));
    let journal = Arc::new(ErrorJournal::open(
        file.errors_path(),
        ErrorJournal::DEFAULT_MAX_ENTRIES,
    ));

    let repository = GitRepository::new(&file.repository.path);
    repository
        .ensure_initialized()
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    let producer = ChangeComposer::new(file.composer_config());

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(producer),
        Arc::new(repository),
        Arc::clone(&retry),
        Arc::clone(&stats),
        Arc::clone(&journal),
        scheduler_config.queue_on_failure,
    ));

    Ok(Arc::new(CommitScheduler::new(
        scheduler_config,
        orchestrator,
        retry,
        stats,
        journal,
    )))
}

/// Run the daemon until interrupted.
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let path = config::resolve_path(config_path);
    let file = FileConfig::load(&path).map_err(|e| miette::miette!("{}", e))?;

    let scheduler = build_scheduler(&file).await?;
    scheduler.start().await.map_err(|e| miette::miette!("{}", e))?;

    info!("tempo daemon running, press ctrl-c to stop");

    // Signal handling is a thin adapter in the host: the scheduler itself
    // only knows its cooperative cancellation token.
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| miette::miette!("failed to listen for shutdown signal: {}", e))?;
    info!("received shutdown signal");

    scheduler.stop().await;
    Ok(())
}

/// Execute a single job immediately, bypassing the timetable.
pub async fn run_once(config_path: Option<PathBuf>) -> Result<()> {
    let path = config::resolve_path(config_path);
    let file = FileConfig::load(&path).map_err(|e| miette::miette!("{}", e))?;

    let scheduler = build_scheduler(&file).await?;
    scheduler
        .run_once()
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    println!("commit created");
    Ok(())
}
