//! Typed configuration consumed by the core.

use std::time::Duration;

use crate::error::SchedulerError;

/// Default loop tick interval.
const DEFAULT_TICK_SECS: u64 = 60;

/// Default retry-sweep interval (30 minutes).
const DEFAULT_SWEEP_SECS: u64 = 30 * 60;

/// Default health-check interval (1 hour).
const DEFAULT_HEALTH_SECS: u64 = 60 * 60;

/// Default bounded wait for the loop to observe `stop()`.
const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

/// Settings that drive planning, execution, and retry behavior.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minimum commits drawn per day.
    pub min_commits_per_day: u32,
    /// Maximum commits drawn per day.
    pub max_commits_per_day: u32,
    /// First hour of day (UTC) jobs may fire.
    pub active_start_hour: u32,
    /// Last hour of day (UTC) jobs may fire.
    pub active_end_hour: u32,
    /// Whether to schedule anything on Saturday/Sunday.
    pub weekends_allowed: bool,
    /// Bound of the random perturbation applied to each timestamp.
    pub jitter_minutes: i64,
    /// Retry attempts permitted per queued item.
    pub retry_max_attempts: u32,
    /// Fixed delay between retry attempts.
    pub retry_delay_minutes: i64,
    /// Retry queue capacity; the oldest item is evicted beyond this.
    pub retry_max_queue_size: usize,
    /// Route repository failures to the retry queue.
    pub queue_on_failure: bool,
    /// Loop cadence.
    pub tick_interval: Duration,
    /// How often the retry queue is swept.
    pub sweep_interval: Duration,
    /// How often repository health is probed.
    pub health_interval: Duration,
    /// How long `stop()` waits for the loop to exit.
    pub stop_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_commits_per_day: 1,
            max_commits_per_day: 5,
            active_start_hour: 9,
            active_end_hour: 21,
            weekends_allowed: false,
            jitter_minutes: 15,
            retry_max_attempts: 3,
            retry_delay_minutes: 30,
            retry_max_queue_size: 50,
            queue_on_failure: true,
            tick_interval: Duration::from_secs(DEFAULT_TICK_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
            health_interval: Duration::from_secs(DEFAULT_HEALTH_SECS),
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
        }
    }
}

impl SchedulerConfig {
    /// Validate the configuration, reporting every violation at once.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let mut errors = Vec::new();

        if self.min_commits_per_day > self.max_commits_per_day {
            errors.push("min_commits_per_day cannot be greater than max_commits_per_day");
        }
        if self.active_start_hour > 23 {
            errors.push("active_start_hour must be between 0 and 23");
        }
        if self.active_end_hour > 23 {
            errors.push("active_end_hour must be between 0 and 23");
        }
        if self.active_start_hour >= self.active_end_hour {
            errors.push("active_start_hour must be less than active_end_hour");
        }
        if self.jitter_minutes < 0 {
            errors.push("jitter_minutes cannot be negative");
        }
        if self.retry_max_attempts == 0 {
            errors.push("retry_max_attempts must be positive");
        }
        if self.retry_delay_minutes < 0 {
            errors.push("retry_delay_minutes cannot be negative");
        }
        if self.retry_max_queue_size == 0 {
            errors.push("retry_max_queue_size must be positive");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchedulerError::InvalidConfig(errors.join("; ")))
        }
    }

    /// Fixed delay applied before each retry attempt.
    pub fn retry_delay(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.retry_delay_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_quota_rejected() {
        let config = SchedulerConfig {
            min_commits_per_day: 6,
            max_commits_per_day: 2,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_commits_per_day"));
    }

    #[test]
    fn test_inverted_hours_rejected() {
        let config = SchedulerConfig {
            active_start_hour: 21,
            active_end_hour: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_hour_rejected() {
        let config = SchedulerConfig {
            active_end_hour: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_violations_reported() {
        let config = SchedulerConfig {
            min_commits_per_day: 9,
            max_commits_per_day: 1,
            retry_max_attempts: 0,
            retry_max_queue_size: 0,
            ..Default::default()
        };

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("min_commits_per_day"));
        assert!(message.contains("retry_max_attempts"));
        assert!(message.contains("retry_max_queue_size"));
    }
}
