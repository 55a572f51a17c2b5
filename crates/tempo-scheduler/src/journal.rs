//! Append-only, bounded error journal.
//!
//! Reportable conditions that must not be swallowed — capacity evictions,
//! exhausted retries, persistence trouble — land here as well as in the log,
//! so they stay observable after the process restarts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;

/// Classification of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A scheduled or retried job failed.
    Execution,
    /// An item used all permitted attempts and was discarded.
    ExhaustedRetries,
    /// An item was evicted from the retry queue purely due to capacity.
    CapacityEviction,
    /// A store's backing file could not be read or written.
    Persistence,
    /// A health-check probe reported trouble.
    Health,
}

/// One recorded condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// When the condition occurred.
    pub timestamp: DateTime<Utc>,
    /// What kind of condition it was.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Optional extra context (item id, file path, ...).
    pub context: Option<String>,
}

/// Bounded journal of reportable error conditions.
pub struct ErrorJournal {
    path: PathBuf,
    max_entries: usize,
    entries: RwLock<Vec<ErrorRecord>>,
}

impl ErrorJournal {
    /// Default retention.
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    /// Open the journal at `path`, keeping at most `max_entries` records.
    pub fn open(path: impl AsRef<Path>, max_entries: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load error journal, starting empty");
                Vec::new()
            }
        };

        Self {
            path,
            max_entries,
            entries: RwLock::new(entries),
        }
    }

    /// Append a record, dropping the oldest entries beyond the retention
    /// bound.
    pub async fn record(&self, kind: ErrorKind, message: &str, context: Option<String>) {
        let mut entries = self.entries.write().await;
        entries.push(ErrorRecord {
            timestamp: Utc::now(),
            kind,
            message: message.to_string(),
            context,
        });

        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        if let Err(e) = save_entries(&self.path, &entries) {
            warn!(path = %self.path.display(), error = %e, "failed to persist error journal");
        }
    }

    /// The most recent `limit` records, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<ErrorRecord> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }
}

fn load_entries(path: &Path) -> Result<Vec<ErrorRecord>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn save_entries(path: &Path, entries: &[ErrorRecord]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(entries)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retention_bound() {
        let dir = tempfile::tempdir().unwrap();
        let journal = ErrorJournal::open(dir.path().join("errors.json"), 3);

        for i in 0..5 {
            journal
                .record(ErrorKind::Execution, &format!("failure {i}"), None)
                .await;
        }

        let recent = journal.recent(10).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "failure 2");
        assert_eq!(recent[2].message, "failure 4");
    }

    #[tokio::test]
    async fn test_journal_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.json");

        {
            let journal = ErrorJournal::open(&path, 10);
            journal
                .record(
                    ErrorKind::CapacityEviction,
                    "oldest item dropped",
                    Some("id=abc".to_string()),
                )
                .await;
        }

        let reopened = ErrorJournal::open(&path, 10);
        let recent = reopened.recent(10).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].kind, ErrorKind::CapacityEviction);
        assert_eq!(recent[0].context.as_deref(), Some("id=abc"));
    }
}
