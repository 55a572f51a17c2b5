//! Error types for the scheduler.

use thiserror::Error;

/// Errors surfaced by scheduler lifecycle operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Invalid or missing required settings. Fatal to `start()`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start()` was called while the loop is already running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// A job execution failed (manual `run_once` path).
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Failure of a collaborator during a scheduled or retried job.
///
/// Never fatal to the loop; always recorded in statistics and, when
/// queueing is enabled, routed to the retry queue.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The change producer failed to synthesize a unit of work.
    #[error("change producer failed: {0}")]
    Producer(String),

    /// The repository rejected or failed the commit.
    #[error("repository failed: {0}")]
    Repository(String),
}

/// Read/write failure against a store's backing file.
///
/// Stores degrade to in-memory state on these rather than failing the loop.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error reported by a collaborator port.
///
/// Ports live behind narrow contracts; only a display message crosses the
/// boundary.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PortError(pub String);

impl PortError {
    /// Create a port error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
