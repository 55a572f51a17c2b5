//! User-facing configuration file.
//!
//! A YAML file deserialized over built-in defaults: absent keys keep their
//! default values, so a minimal config only names the repository path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tempo_compose::ComposerConfig;
use tempo_scheduler::SchedulerConfig;

/// Errors from loading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML for this schema.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySection {
    /// Path to the local work tree commits are created in. Required.
    pub path: String,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            path: String::new(),
        }
    }
}

/// Active-hours window, in UTC hours of day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveHours {
    pub start: u32,
    pub end: u32,
}

impl Default for ActiveHours {
    fn default() -> Self {
        Self { start: 9, end: 21 }
    }
}

/// Commit cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitsSection {
    pub min_per_day: u32,
    pub max_per_day: u32,
    pub active_hours: ActiveHours,
    pub weekends: bool,
    pub jitter_minutes: i64,
    pub max_changes_per_commit: usize,
    /// Optional file with one commit-message template per line.
    pub messages_file: Option<PathBuf>,
}

impl Default for CommitsSection {
    fn default() -> Self {
        Self {
            min_per_day: 1,
            max_per_day: 5,
            active_hours: ActiveHours::default(),
            weekends: false,
            jitter_minutes: 15,
            max_changes_per_commit: 3,
            messages_file: None,
        }
    }
}

/// Failure-recovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub delay_minutes: i64,
    pub max_queue_size: usize,
    pub queue_on_failure: bool,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_minutes: 30,
            max_queue_size: 50,
            queue_on_failure: true,
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory holding the pending queue, statistics, and error journal.
    pub data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub repository: RepositorySection,
    pub commits: CommitsSection,
    pub retry: RetrySection,
    pub storage: StorageSection,
}

impl FileConfig {
    /// Load the file at `path`. A missing file yields the defaults, so
    /// `tempo status` and friends work before `tempo init` ran.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Write this configuration as YAML to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Typed settings for the scheduling core.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            min_commits_per_day: self.commits.min_per_day,
            max_commits_per_day: self.commits.max_per_day,
            active_start_hour: self.commits.active_hours.start,
            active_end_hour: self.commits.active_hours.end,
            weekends_allowed: self.commits.weekends,
            jitter_minutes: self.commits.jitter_minutes,
            retry_max_attempts: self.retry.max_attempts,
            retry_delay_minutes: self.retry.delay_minutes,
            retry_max_queue_size: self.retry.max_queue_size,
            queue_on_failure: self.retry.queue_on_failure,
            ..Default::default()
        }
    }

    /// Settings for the change producer.
    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            max_changes_per_commit: self.commits.max_changes_per_commit,
            messages_file: self.commits.messages_file.clone(),
        }
    }

    /// Path of the pending retry queue file.
    pub fn pending_path(&self) -> PathBuf {
        self.storage.data_dir.join("pending_commits.json")
    }

    /// Path of the statistics ledger file.
    pub fn statistics_path(&self) -> PathBuf {
        self.storage.data_dir.join("statistics.json")
    }

    /// Path of the error journal file.
    pub fn errors_path(&self) -> PathBuf {
        self.storage.data_dir.join("errors.json")
    }
}

/// Resolve the configuration path: explicit flag, or the platform default.
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(default_config_path)
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("tempo").join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from("./tempo.yaml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tempo"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}
