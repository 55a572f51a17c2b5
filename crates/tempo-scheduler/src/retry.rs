//! Bounded, persistent retry queue.
//!
//! Failed units of work are absorbed here and replayed by the scheduler's
//! sweep path until they succeed or exhaust their attempts. The queue is the
//! single owner of every item: callers operate by id and never hold a
//! mutable copy.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::error::StoreError;
use crate::types::{RetryItem, WorkUnit};

/// Result of enqueueing a failed unit.
#[derive(Debug)]
pub struct Enqueued {
    /// The item now owned by the queue.
    pub item: RetryItem,
    /// The oldest item, dropped to stay within capacity. Callers must surface
    /// this as an observable event, not discard it silently.
    pub evicted: Option<RetryItem>,
}

/// Disposition of an item after an outcome is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDisposition {
    /// The retry succeeded; the item was removed.
    Completed,
    /// The retry failed with attempts remaining; the item stays queued.
    Rescheduled {
        /// Earliest time of the next attempt.
        next_retry_at: DateTime<Utc>,
    },
    /// The retry failed its final attempt; the item was permanently dropped.
    Exhausted,
    /// No item with that id exists.
    NotFound,
}

/// Durable, bounded mapping from item id to retry metadata.
///
/// Backed by a JSON file rewritten on every mutation. All read/modify/write
/// cycles happen under one write lock, so the store is safe against the loop
/// and externally-triggered calls racing each other.
pub struct RetryStore {
    path: PathBuf,
    max_attempts: u32,
    retry_delay: chrono::Duration,
    max_size: usize,
    items: RwLock<Vec<RetryItem>>,
}

impl RetryStore {
    /// Open the store at `path`, loading any persisted queue.
    ///
    /// An unreadable or corrupt file degrades to an empty queue with a
    /// warning rather than failing.
    pub fn open(path: impl AsRef<Path>, config: &SchedulerConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        let items = match load_items(&path) {
            Ok(items) => {
                if !items.is_empty() {
                    info!(count = items.len(), "loaded pending retry queue");
                }
                items
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load retry queue, starting empty");
                Vec::new()
            }
        };

        Self {
            path,
            max_attempts: config.retry_max_attempts,
            retry_delay: config.retry_delay(),
            max_size: config.retry_max_queue_size,
            items: RwLock::new(items),
        }
    }

    /// Queue a failed unit for retry.
    ///
    /// Evicts the oldest item first when the queue is at capacity. The
    /// mutation is persisted before this returns, so a crash immediately
    /// afterwards does not lose the item.
    pub async fn enqueue(&self, payload: WorkUnit, error: &str, now: DateTime<Utc>) -> Enqueued {
        let item = RetryItem {
            id: Uuid::new_v4().to_string(),
            payload,
            created_at: now,
            attempt_count: 0,
            max_attempts: self.max_attempts,
            next_retry_at: now + self.retry_delay,
            last_error: error.to_string(),
        };

        let mut items = self.items.write().await;

        let evicted = if items.len() >= self.max_size {
            let oldest = items
                .iter()
                .enumerate()
                .min_by_key(|(_, i)| i.created_at)
                .map(|(idx, _)| idx);
            oldest.map(|idx| items.remove(idx))
        } else {
            None
        };

        items.push(item.clone());
        self.persist(&items);

        debug!(id = %item.id, next_retry = %item.next_retry_at, "queued failed unit for retry");
        Enqueued { item, evicted }
    }

    /// Items whose retry time has arrived, earliest first.
    ///
    /// Items are not removed here; removal happens when an outcome is
    /// recorded.
    pub async fn due_items(&self, now: DateTime<Utc>) -> Vec<RetryItem> {
        let items = self.items.read().await;
        let mut due: Vec<RetryItem> = items
            .iter()
            .filter(|i| i.next_retry_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|i| i.next_retry_at);
        due
    }

    /// Record the outcome of a retry attempt for `id`.
    pub async fn record_outcome(
        &self,
        id: &str,
        success: bool,
        error: Option<&str>,
        now: DateTime<Utc>,
    ) -> RetryDisposition {
        let mut items = self.items.write().await;

        let Some(idx) = items.iter().position(|i| i.id == id) else {
            return RetryDisposition::NotFound;
        };

        if success {
            items.remove(idx);
            self.persist(&items);
            return RetryDisposition::Completed;
        }

        items[idx].attempt_count += 1;
        if let Some(error) = error {
            items[idx].last_error = error.to_string();
        }

        let disposition = if items[idx].attempt_count < items[idx].max_attempts {
            let next_retry_at = now + self.retry_delay;
            items[idx].next_retry_at = next_retry_at;
            RetryDisposition::Rescheduled { next_retry_at }
        } else {
            items.remove(idx);
            RetryDisposition::Exhausted
        };

        self.persist(&items);
        disposition
    }

    /// Current queue depth.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// True when nothing is queued.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Snapshot of all queued items, in insertion order.
    pub async fn snapshot(&self) -> Vec<RetryItem> {
        self.items.read().await.clone()
    }

    /// Discard all items unconditionally. Used for manual recovery.
    pub async fn clear(&self) {
        let mut items = self.items.write().await;
        let dropped = items.len();
        items.clear();
        self.persist(&items);
        info!(dropped, "retry queue cleared");
    }

    /// Rewrite the backing file. A write failure is logged and the in-memory
    /// state stays authoritative; the loop must not crash on storage trouble.
    fn persist(&self, items: &[RetryItem]) {
        if let Err(e) = save_items(&self.path, items) {
            warn!(path = %self.path.display(), error = %e, "failed to persist retry queue");
        }
    }
}

fn load_items(path: &Path) -> Result<Vec<RetryItem>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn save_items(path: &Path, items: &[RetryItem]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(items)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
