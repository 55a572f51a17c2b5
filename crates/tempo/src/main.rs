//! tempo: keeps a repository active on a human-like daily cadence.
//!
//! Main binary with subcommands:
//! - `daemon`: run the scheduling loop until interrupted
//! - `run-once`: create a single commit immediately, bypassing the timetable
//! - `status`: print the statistics ledger and queue depth
//! - `queue`: inspect or clear the pending retry queue
//! - `init`: write a starter configuration file

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tempo_scheduler::{ErrorJournal, RetryStore, StatsStore};

mod config;
mod daemon;
mod init;

use config::FileConfig;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Human-cadence commit daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduling daemon until interrupted
    Daemon {
        /// Path to the configuration file
        #[arg(long, env = "TEMPO_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Create one commit immediately, bypassing the timetable
    RunOnce {
        /// Path to the configuration file
        #[arg(long, env = "TEMPO_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print statistics and queue depth
    Status {
        /// Path to the configuration file
        #[arg(long, env = "TEMPO_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Inspect or clear the pending retry queue
    Queue {
        /// Path to the configuration file
        #[arg(long, env = "TEMPO_CONFIG")]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: QueueAction,
    },

    /// Write a starter configuration file
    Init {
        /// Path to the configuration file
        #[arg(long, env = "TEMPO_CONFIG")]
        config: Option<PathBuf>,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List queued items
    List,
    /// Discard all queued items
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tempo=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { config } => daemon::run(config).await,
        Commands::RunOnce { config } => daemon::run_once(config).await,
        Commands::Status { config } => show_status(config).await,
        Commands::Queue { config, action } => queue_command(config, action).await,
        Commands::Init { config, force } => init::run(config, force),
    }
}

/// Print the persisted statistics and recent errors.
async fn show_status(config_path: Option<PathBuf>) -> Result<()> {
    let path = config::resolve_path(config_path);
    let file = FileConfig::load(&path).map_err(|e| miette::miette!("{}", e))?;

    let stats = StatsStore::open(file.statistics_path(), Utc::now());
    let snapshot = stats.snapshot().await;

    println!("Statistics");
    println!("  total commits:      {}", snapshot.total_commits);
    println!("  successful:         {}", snapshot.successful_commits);
    println!("  failed:             {}", snapshot.failed_commits);
    println!("  pending retries:    {}", snapshot.pending_commits);
    match snapshot.success_rate_percent() {
        Some(rate) => println!("  success rate:       {rate:.1}%"),
        None => println!("  success rate:       n/a"),
    }
    println!("  tracking since:     {}", snapshot.start_time);
    if let Some(last_update) = snapshot.last_update {
        println!("  last update:        {last_update}");
    }
    if let Some(last_error) = &snapshot.last_error {
        println!("  last error:         {last_error}");
    }

    let journal = ErrorJournal::open(file.errors_path(), ErrorJournal::DEFAULT_MAX_ENTRIES);
    let recent = journal.recent(5).await;
    if !recent.is_empty() {
        println!();
        println!("Recent errors");
        for record in recent {
            println!("  {} {:?}: {}", record.timestamp, record.kind, record.message);
        }
    }

    Ok(())
}

/// Inspect or clear the retry queue.
async fn queue_command(config_path: Option<PathBuf>, action: QueueAction) -> Result<()> {
    let path = config::resolve_path(config_path);
    let file = FileConfig::load(&path).map_err(|e| miette::miette!("{}", e))?;

    let store = RetryStore::open(file.pending_path(), &file.scheduler_config());

    match action {
        QueueAction::List => {
            let items = store.snapshot().await;
            if items.is_empty() {
                println!("retry queue is empty");
                return Ok(());
            }
            println!("{} item(s) queued", items.len());
            for item in items {
                println!(
                    "  {} attempt {}/{} next retry {} ({})",
                    item.id, item.attempt_count, item.max_attempts, item.next_retry_at,
                    item.last_error
                );
            }
        }
        QueueAction::Clear => {
            let count = store.len().await;
            store.clear().await;
            println!("cleared {count} item(s)");
        }
    }

    Ok(())
}
