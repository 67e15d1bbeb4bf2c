use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::convergence::ConvergenceThresholds;

/// Main configuration structure for bulletin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Task convergence thresholds
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// Actual-LRP read path tuning
    #[serde(default)]
    pub actual_lrp: ActualLrpConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".bulletin/bulletin.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `sqlx` connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Convergence thresholds, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceConfig {
    /// Age after which a stalled task is kicked
    #[serde(default = "default_kick_tasks_after_secs")]
    pub kick_tasks_after_secs: u64,

    /// Age after which a never-placed pending task is failed
    #[serde(default = "default_expire_pending_after_secs")]
    pub expire_pending_after_secs: u64,

    /// Age after which a completed task is deleted
    #[serde(default = "default_expire_completed_after_secs")]
    pub expire_completed_after_secs: u64,
}

const fn default_kick_tasks_after_secs() -> u64 {
    30
}

const fn default_expire_pending_after_secs() -> u64 {
    30 * 60
}

const fn default_expire_completed_after_secs() -> u64 {
    120
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            kick_tasks_after_secs: default_kick_tasks_after_secs(),
            expire_pending_after_secs: default_expire_pending_after_secs(),
            expire_completed_after_secs: default_expire_completed_after_secs(),
        }
    }
}

impl ConvergenceConfig {
    pub const fn thresholds(&self) -> ConvergenceThresholds {
        ConvergenceThresholds {
            kick_tasks_after: Duration::from_secs(self.kick_tasks_after_secs),
            expire_pending_after: Duration::from_secs(self.expire_pending_after_secs),
            expire_completed_after: Duration::from_secs(self.expire_completed_after_secs),
        }
    }
}

/// Actual-LRP reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ActualLrpConfig {
    /// Concurrency ceiling for parsing process subtrees
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

const fn default_max_workers() -> usize {
    50
}

impl Default for ActualLrpConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}
