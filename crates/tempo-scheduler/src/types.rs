//! Core data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single file change inside a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository work tree.
    pub path: String,
    /// Content to write.
    pub content: String,
    /// Append to the file instead of replacing it.
    #[serde(default)]
    pub append: bool,
}

/// An opaque unit of work: file changes plus a commit message.
///
/// Produced once by the change producer and replayed verbatim on retry, so a
/// retried commit is identical to the one that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Human-readable commit message.
    pub message: String,
    /// File changes to apply before committing.
    pub changes: Vec<FileChange>,
}

impl WorkUnit {
    /// True when the unit carries no changes and should be skipped.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// The timetable computed for one calendar date.
///
/// Immutable once created; discarded at the next day rollover. Timestamps are
/// sorted ascending and duplicates are allowed (executed in order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPlan {
    /// The date this plan covers.
    pub date: NaiveDate,
    /// Execution timestamps, non-decreasing.
    pub times: Vec<DateTime<Utc>>,
}

impl DailyPlan {
    /// Create an empty plan for a date (weekend, zero quota, or exhausted window).
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            times: Vec::new(),
        }
    }

    /// Number of scheduled executions.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when nothing is scheduled for the day.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// A failed unit of work awaiting a bounded number of re-execution attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryItem {
    /// Opaque store-assigned id.
    pub id: String,
    /// The unit of work to replay.
    pub payload: WorkUnit,
    /// When the item entered the queue.
    pub created_at: DateTime<Utc>,
    /// Retry attempts consumed so far.
    pub attempt_count: u32,
    /// Attempts permitted before the item is dropped.
    pub max_attempts: u32,
    /// Earliest time the next attempt may run.
    pub next_retry_at: DateTime<Utc>,
    /// Message of the most recent failure.
    pub last_error: String,
}

/// Cumulative statistics, persisted for the installation lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// All completed executions, scheduled and retried.
    pub total_commits: u64,
    /// Executions that produced a commit.
    pub successful_commits: u64,
    /// Executions that failed.
    pub failed_commits: u64,
    /// Current retry-queue depth, updated after each sweep.
    pub pending_commits: u64,
    /// Most recent error message, if any.
    pub last_error: Option<String>,
    /// When this ledger was first created.
    pub start_time: DateTime<Utc>,
    /// When the ledger was last updated.
    pub last_update: Option<DateTime<Utc>>,
}

impl Statistics {
    /// Fresh ledger starting now.
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            total_commits: 0,
            successful_commits: 0,
            failed_commits: 0,
            pending_commits: 0,
            last_error: None,
            start_time,
            last_update: None,
        }
    }

    /// Success rate as a percentage. `None` until at least one execution completed.
    pub fn success_rate_percent(&self) -> Option<f64> {
        if self.total_commits == 0 {
            None
        } else {
            Some(self.successful_commits as f64 / self.total_commits as f64 * 100.0)
        }
    }
}

/// Counters for the current day, reset at rollover.
///
/// Distinct from the lifetime-cumulative [`Statistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollingStats {
    /// Scheduled jobs fired today.
    pub fired: u64,
    /// Jobs that committed successfully today.
    pub succeeded: u64,
    /// Jobs that failed today.
    pub failed: u64,
    /// Jobs skipped because the producer yielded nothing.
    pub skipped: u64,
}

/// Read-only snapshot of the scheduler, safe to take from any thread.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Whether the loop is running.
    pub running: bool,
    /// Today's rolling counters.
    pub rolling: RollingStats,
    /// Next unfired timestamp in today's plan, if any.
    pub next_due: Option<DateTime<Utc>>,
    /// Total executions scheduled for today.
    pub scheduled_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_work_unit() {
        let unit = WorkUnit {
            message: "Update docs".to_string(),
            changes: vec![],
        };
        assert!(unit.is_empty());
    }

    #[test]
    fn test_work_unit_roundtrip() {
        let unit = WorkUnit {
            message: "Add notes".to_string(),
            changes: vec![FileChange {
                path: "notes/worklog.md".to_string(),
                content: "- entry\n".to_string(),
                append: true,
            }],
        };

        let json = serde_json::to_string(&unit).unwrap();
        let decoded: WorkUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, unit);
    }

    #[test]
    fn test_success_rate_undefined_without_commits() {
        let stats = Statistics::new(Utc::now());
        assert!(stats.success_rate_percent().is_none());
    }

    #[test]
    fn test_success_rate() {
        let mut stats = Statistics::new(Utc::now());
        stats.total_commits = 4;
        stats.successful_commits = 3;
        stats.failed_commits = 1;

        let rate = stats.success_rate_percent().unwrap();
        assert!((rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_plan() {
        let plan = DailyPlan::empty(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }
}
