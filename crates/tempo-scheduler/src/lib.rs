//! Daily cadence scheduler for tempo.
//!
//! This crate provides the temporal core of tempo:
//! - Turns a daily commit quota into a jittered timetable
//! - Runs a single-threaded execution loop that fires due jobs
//! - Absorbs failures into a bounded, persistent retry queue
//! - Keeps a durable statistics ledger and error journal

mod config;
mod error;
mod journal;
mod orchestrator;
mod planner;
mod retry;
mod scheduler;
mod stats;
mod types;

pub use config::SchedulerConfig;
pub use error::{ExecutionError, PortError, SchedulerError, StoreError};
pub use journal::{ErrorJournal, ErrorKind, ErrorRecord};
pub use orchestrator::{ChangeProducer, JobOutcome, Orchestrator, Repository};
pub use planner::generate_plan;
pub use retry::{Enqueued, RetryDisposition, RetryStore};
pub use scheduler::CommitScheduler;
pub use stats::StatsStore;
pub use types::{
    DailyPlan, FileChange, RetryItem, RollingStats, Statistics, StatusSnapshot, WorkUnit,
};
