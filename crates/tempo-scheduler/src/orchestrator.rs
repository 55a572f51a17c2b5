//! Per-job action: produce a unit of work, commit it, route the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{ExecutionError, PortError};
use crate::journal::{ErrorJournal, ErrorKind};
use crate::retry::{RetryDisposition, RetryStore};
use crate::stats::StatsStore;
use crate::types::{RetryItem, WorkUnit};

/// Synthesizes the content of a unit of work. Purely generative; owns no
/// scheduling state.
#[async_trait]
pub trait ChangeProducer: Send + Sync {
    /// Produce the next unit of work. `Ok(None)` means there is nothing to
    /// commit right now; the job is skipped, not retried.
    async fn produce(&self) -> Result<Option<WorkUnit>, PortError>;
}

/// Performs the actual write/commit of a unit of work.
///
/// Assumed non-reentrant: a single work tree cannot take two concurrent
/// writers, which is why the scheduler serializes all executions.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Apply the unit's changes and commit them. Returns the commit hash.
    async fn commit(&self, unit: &WorkUnit) -> Result<String, PortError>;

    /// Cheap availability probe, used at startup and by health checks.
    async fn check(&self) -> Result<(), PortError>;
}

/// Outcome of one scheduled execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A commit was created.
    Committed(String),
    /// The producer yielded nothing; no repository call was made.
    Skipped,
}

/// Glue between the ports and the stores.
///
/// Successes land in the statistics ledger; failures additionally land in the
/// retry queue (when enabled) and the error journal. The orchestrator never
/// retains a private copy of a queued item — retries always read back through
/// the store.
pub struct Orchestrator {
    producer: Arc<dyn ChangeProducer>,
    repository: Arc<dyn Repository>,
    retry: Arc<RetryStore>,
    stats: Arc<StatsStore>,
    journal: Arc<ErrorJournal>,
    queue_on_failure: bool,
}

impl Orchestrator {
    /// Wire the orchestrator to its collaborators.
    pub fn new(
        producer: Arc<dyn ChangeProducer>,
        repository: Arc<dyn Repository>,
        retry: Arc<RetryStore>,
        stats: Arc<StatsStore>,
        journal: Arc<ErrorJournal>,
        queue_on_failure: bool,
    ) -> Self {
        Self {
            producer,
            repository,
            retry,
            stats,
            journal,
            queue_on_failure,
        }
    }

    /// Execute one scheduled job.
    ///
    /// Failures are fully routed (stats, journal, retry queue) before the
    /// error is returned, so callers may ignore the `Err` without losing
    /// anything; the loop does exactly that.
    pub async fn execute_scheduled(&self) -> Result<JobOutcome, ExecutionError> {
        let unit = match self.producer.produce().await {
            Ok(Some(unit)) if !unit.is_empty() => unit,
            Ok(_) => {
                debug!("producer yielded no changes, skipping job");
                return Ok(JobOutcome::Skipped);
            }
            Err(e) => {
                let err = ExecutionError::Producer(e.to_string());
                // No payload exists yet, so there is nothing to queue.
                self.record_failure(&err, None).await;
                return Err(err);
            }
        };

        match self.repository.commit(&unit).await {
            Ok(hash) => {
                self.stats.record_completion(true).await;
                info!(hash = %short_hash(&hash), message = %unit.message, "created scheduled commit");
                Ok(JobOutcome::Committed(hash))
            }
            Err(e) => {
                let err = ExecutionError::Repository(e.to_string());
                self.record_failure(&err, Some(unit)).await;
                Err(err)
            }
        }
    }

    /// Re-attempt a queued item, replaying its payload verbatim.
    #[tracing::instrument(skip(self, item), fields(id = %item.id))]
    pub async fn execute_retry(&self, item: &RetryItem, now: DateTime<Utc>) -> RetryDisposition {
        debug!(id = %item.id, attempt = item.attempt_count + 1, "retrying queued unit");

        match self.repository.commit(&item.payload).await {
            Ok(hash) => {
                self.stats.record_completion(true).await;
                let disposition = self.retry.record_outcome(&item.id, true, None, now).await;
                info!(id = %item.id, hash = %short_hash(&hash), "retry succeeded");
                disposition
            }
            Err(e) => {
                let message = e.to_string();
                self.stats.record_completion(false).await;
                self.stats.record_error(&message).await;

                let disposition = self
                    .retry
                    .record_outcome(&item.id, false, Some(&message), now)
                    .await;

                if disposition == RetryDisposition::Exhausted {
                    error!(
                        id = %item.id,
                        attempts = item.max_attempts,
                        error = %message,
                        "retries exhausted, dropping unit"
                    );
                    self.journal
                        .record(
                            ErrorKind::ExhaustedRetries,
                            &format!(
                                "unit dropped after {} failed attempts: {}",
                                item.max_attempts, message
                            ),
                            Some(format!("id={}", item.id)),
                        )
                        .await;
                } else {
                    warn!(id = %item.id, error = %message, "retry failed, rescheduled");
                }

                disposition
            }
        }
    }

    /// Probe the repository port.
    pub async fn repository_check(&self) -> Result<(), PortError> {
        self.repository.check().await
    }

    /// Record a failed execution: statistics, journal, and — when queueing is
    /// enabled and a payload exists — the retry queue.
    async fn record_failure(&self, err: &ExecutionError, payload: Option<WorkUnit>) {
        let message = err.to_string();
        error!(error = %message, "job execution failed");

        self.stats.record_completion(false).await;
        self.stats.record_error(&message).await;
        self.journal
            .record(ErrorKind::Execution, &message, None)
            .await;

        if !self.queue_on_failure {
            return;
        }
        let Some(payload) = payload else {
            return;
        };

        let enqueued = self.retry.enqueue(payload, &message, Utc::now()).await;
        if let Some(evicted) = enqueued.evicted {
            warn!(
                evicted_id = %evicted.id,
                created_at = %evicted.created_at,
                "retry queue at capacity, evicted oldest item"
            );
            self.journal
                .record(
                    ErrorKind::CapacityEviction,
                    "retry queue at capacity, oldest item evicted",
                    Some(format!("id={}", evicted.id)),
                )
                .await;
        }
    }
}

/// Abbreviate a commit hash for log lines.
fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}
