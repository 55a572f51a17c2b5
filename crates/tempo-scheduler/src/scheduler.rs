//! Scheduler lifecycle and execution loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{ExecutionError, SchedulerError};
use crate::journal::{ErrorJournal, ErrorKind};
use crate::orchestrator::{JobOutcome, Orchestrator};
use crate::planner::generate_plan;
use crate::retry::RetryStore;
use crate::stats::StatsStore;
use crate::types::{DailyPlan, RollingStats, StatusSnapshot};

/// Mutable loop state, shared between the loop and external callers.
struct LoopState {
    running: bool,
    plan: DailyPlan,
    /// Index of the next unfired timestamp in `plan.times`.
    fired: usize,
    rolling: RollingStats,
    last_sweep: DateTime<Utc>,
    last_health: DateTime<Utc>,
    last_success: Option<DateTime<Utc>>,
}

/// Handle to a running loop: cancellation signal plus the task itself.
struct LoopHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// The job scheduler.
///
/// Owns one background execution loop. At most one job or retry executes at
/// any instant: the repository work tree cannot take two concurrent writers.
/// Lifecycle is `Stopped → Running → Stopped`; `start()` and `stop()` may be
/// called from any task, and `status()` never blocks on the loop.
pub struct CommitScheduler {
    config: SchedulerConfig,
    orchestrator: Arc<Orchestrator>,
    retry: Arc<RetryStore>,
    stats: Arc<StatsStore>,
    journal: Arc<ErrorJournal>,
    sweep_every: chrono::Duration,
    health_every: chrono::Duration,
    state: RwLock<LoopState>,
    lifecycle: Mutex<Option<LoopHandle>>,
}

impl CommitScheduler {
    /// Wire a scheduler to its collaborators. The loop is not started yet.
    pub fn new(
        config: SchedulerConfig,
        orchestrator: Arc<Orchestrator>,
        retry: Arc<RetryStore>,
        stats: Arc<StatsStore>,
        journal: Arc<ErrorJournal>,
    ) -> Self {
        let now = Utc::now();
        let sweep_every =
            chrono::Duration::from_std(config.sweep_interval).unwrap_or(chrono::Duration::MAX);
        let health_every =
            chrono::Duration::from_std(config.health_interval).unwrap_or(chrono::Duration::MAX);

        Self {
            config,
            orchestrator,
            retry,
            stats,
            journal,
            sweep_every,
            health_every,
            state: RwLock::new(LoopState {
                running: false,
                plan: DailyPlan::empty(now.date_naive()),
                fired: 0,
                rolling: RollingStats::default(),
                last_sweep: now,
                last_health: now,
                last_success: None,
            }),
            lifecycle: Mutex::new(None),
        }
    }

    /// Start the background loop.
    ///
    /// Validates configuration and probes the repository before any state
    /// transition; on success computes today's plan immediately (covering a
    /// mid-day process start) and spawns the loop.
    #[tracing::instrument(skip(self))]
    pub async fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.config.validate()?;
        self.orchestrator.repository_check().await.map_err(|e| {
            SchedulerError::InvalidConfig(format!("repository unavailable: {e}"))
        })?;

        let now = Utc::now();
        let plan = generate_plan(now.date_naive(), now, &self.config, &mut rand::rng())?;
        info!(date = %plan.date, scheduled = plan.len(), "planned today's timetable");

        {
            let mut state = self.state.write().await;
            state.plan = plan;
            state.fired = 0;
            state.rolling = RollingStats::default();
            state.last_sweep = now;
            state.last_health = now;
            state.running = true;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(self).run_loop(shutdown_rx));
        *lifecycle = Some(LoopHandle { shutdown_tx, task });

        Ok(())
    }

    /// Signal the loop and wait (bounded) for it to exit.
    ///
    /// A job already in flight finishes; no new job starts after the signal
    /// is observed. Idempotent: stopping a stopped scheduler is a no-op.
    pub async fn stop(&self) {
        let handle = self.lifecycle.lock().await.take();
        let Some(LoopHandle { shutdown_tx, task }) = handle else {
            debug!("stop requested while already stopped");
            return;
        };

        let _ = shutdown_tx.send(true);
        match tokio::time::timeout(self.config.stop_timeout, task).await {
            Ok(_) => info!("scheduler stopped"),
            Err(_) => warn!("scheduler loop did not exit within timeout, detaching"),
        }

        // Stopped is reached even when the wait timed out.
        self.state.write().await.running = false;
    }

    /// Read-only snapshot; never blocks on the loop.
    pub async fn status(&self) -> StatusSnapshot {
        let state = self.state.read().await;
        StatusSnapshot {
            running: state.running,
            rolling: state.rolling.clone(),
            next_due: state.plan.times.get(state.fired).copied(),
            scheduled_count: state.plan.len(),
        }
    }

    /// Execute one job right now, bypassing the timetable.
    ///
    /// Direct blocking path for manual and test invocation.
    pub async fn run_once(&self) -> Result<(), ExecutionError> {
        self.orchestrator.execute_scheduled().await.map(|_| ())
    }

    /// Run one retry sweep as of `now`: re-attempt every due item, then
    /// refresh the pending gauge. Called by the loop on its sweep cadence and
    /// available for manual invocation.
    pub async fn sweep(&self, now: DateTime<Utc>) {
        let due = self.retry.due_items(now).await;
        if !due.is_empty() {
            info!(count = due.len(), "sweeping retry queue");
        }

        for item in &due {
            self.orchestrator.execute_retry(item, now).await;
        }

        self.stats.record_pending(self.retry.len().await).await;
    }

    /// The background loop: tick on a fixed cadence until cancelled.
    async fn run_loop(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        info!("scheduler loop started");
        let mut interval = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    self.tick(Utc::now(), &shutdown_rx).await;
                }
            }
        }

        self.state.write().await.running = false;
        info!("scheduler loop stopped");
    }

    /// One pass of the loop: rollover, due jobs, sweep, health.
    ///
    /// Errors inside a tick are contained; the loop itself only terminates
    /// via `stop()`.
    async fn tick(&self, now: DateTime<Utc>, shutdown_rx: &watch::Receiver<bool>) {
        let rolled_over = { self.state.read().await.plan.date != now.date_naive() };
        if rolled_over {
            self.rollover(now).await;
        }

        self.fire_due_jobs(now, shutdown_rx).await;

        let sweep_due = {
            let state = self.state.read().await;
            now.signed_duration_since(state.last_sweep) >= self.sweep_every
        };
        if sweep_due && !*shutdown_rx.borrow() {
            self.sweep(now).await;
            self.state.write().await.last_sweep = now;
        }

        let health_due = {
            let state = self.state.read().await;
            now.signed_duration_since(state.last_health) >= self.health_every
        };
        if health_due {
            self.health_check(now).await;
            self.state.write().await.last_health = now;
        }
    }

    /// Fire every due job in timestamp order, one at a time.
    ///
    /// The state lock is not held across executions, so `status()` stays
    /// responsive while a job runs.
    async fn fire_due_jobs(&self, now: DateTime<Utc>, shutdown_rx: &watch::Receiver<bool>) {
        loop {
            let due_at = {
                let state = self.state.read().await;
                state
                    .plan
                    .times
                    .get(state.fired)
                    .copied()
                    .filter(|at| *at <= now)
            };
            let Some(due_at) = due_at else {
                break;
            };

            if *shutdown_rx.borrow() {
                debug!("shutdown requested, not starting new jobs");
                break;
            }

            debug!(scheduled_for = %due_at, "firing scheduled job");
            let result = self.orchestrator.execute_scheduled().await;

            let mut state = self.state.write().await;
            state.fired += 1;
            state.rolling.fired += 1;
            match result {
                Ok(JobOutcome::Committed(_)) => {
                    state.rolling.succeeded += 1;
                    state.last_success = Some(Utc::now());
                }
                Ok(JobOutcome::Skipped) => state.rolling.skipped += 1,
                // Already recorded and routed by the orchestrator.
                Err(_) => state.rolling.failed += 1,
            }
        }
    }

    /// Day rollover: flush the rolling counters, then plan the new date.
    async fn rollover(&self, now: DateTime<Utc>) {
        let previous = {
            let state = self.state.read().await;
            (state.plan.date, state.rolling.clone())
        };
        info!(
            date = %previous.0,
            fired = previous.1.fired,
            succeeded = previous.1.succeeded,
            failed = previous.1.failed,
            skipped = previous.1.skipped,
            "daily rolling stats"
        );

        let today = now.date_naive();
        let plan = match generate_plan(today, now, &self.config, &mut rand::rng()) {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "failed to plan new day, scheduling nothing");
                DailyPlan::empty(today)
            }
        };
        info!(date = %plan.date, scheduled = plan.len(), "planned today's timetable");

        {
            let mut state = self.state.write().await;
            state.plan = plan;
            state.fired = 0;
            state.rolling = RollingStats::default();
        }

        // Refresh the pending gauge once a day even if no sweep ran.
        self.stats.record_pending(self.retry.len().await).await;
    }

    /// Hourly probe: repository reachability and commit recency.
    async fn health_check(&self, now: DateTime<Utc>) {
        if let Err(e) = self.orchestrator.repository_check().await {
            warn!(error = %e, "repository health check failed");
            self.journal
                .record(ErrorKind::Health, &format!("repository check failed: {e}"), None)
                .await;
        }

        let last_success = self.state.read().await.last_success;
        if let Some(last) = last_success
            && now.signed_duration_since(last) > chrono::Duration::hours(24)
        {
            warn!(last_success = %last, "no successful commit in over 24 hours");
        }

        debug!("health check complete");
    }
}
