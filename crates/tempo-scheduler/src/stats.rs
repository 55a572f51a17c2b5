//! Durable statistics ledger.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;
use crate::types::Statistics;

/// Persistent counters for completed executions.
///
/// Every update happens under one write lock and is flushed to disk before
/// the lock is released, so `total == successful + failed` holds at every
/// observation point between updates.
pub struct StatsStore {
    path: PathBuf,
    stats: RwLock<Statistics>,
}

impl StatsStore {
    /// Open the ledger at `path`, creating a fresh one when absent.
    ///
    /// An unreadable or corrupt file degrades to a fresh ledger with a
    /// warning rather than failing.
    pub fn open(path: impl AsRef<Path>, now: DateTime<Utc>) -> Self {
        let path = path.as_ref().to_path_buf();
        let stats = match load_stats(&path) {
            Ok(Some(stats)) => stats,
            Ok(None) => Statistics::new(now),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load statistics, starting fresh");
                Statistics::new(now)
            }
        };

        Self {
            path,
            stats: RwLock::new(stats),
        }
    }

    /// Count one completed execution.
    pub async fn record_completion(&self, success: bool) {
        let mut stats = self.stats.write().await;
        stats.total_commits += 1;
        if success {
            stats.successful_commits += 1;
        } else {
            stats.failed_commits += 1;
        }
        stats.last_update = Some(Utc::now());
        self.persist(&stats);
    }

    /// Update the retry-queue depth after a sweep.
    pub async fn record_pending(&self, count: usize) {
        let mut stats = self.stats.write().await;
        stats.pending_commits = count as u64;
        stats.last_update = Some(Utc::now());
        self.persist(&stats);
    }

    /// Remember the most recent error message.
    pub async fn record_error(&self, error: &str) {
        let mut stats = self.stats.write().await;
        stats.last_error = Some(error.to_string());
        stats.last_update = Some(Utc::now());
        self.persist(&stats);
    }

    /// Current values of the ledger.
    pub async fn snapshot(&self) -> Statistics {
        self.stats.read().await.clone()
    }

    fn persist(&self, stats: &Statistics) {
        if let Err(e) = save_stats(&self.path, stats) {
            warn!(path = %self.path.display(), error = %e, "failed to persist statistics");
        }
    }
}

fn load_stats(path: &Path) -> Result<Option<Statistics>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn save_stats(path: &Path, stats: &Statistics) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(stats)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
