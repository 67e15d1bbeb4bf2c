use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid actual_lrp.max_workers: {0}. Must be at least 1")]
    InvalidMaxWorkers(usize),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .bulletin/config.yaml
    /// 3. .bulletin/local.yaml (optional local overrides)
    /// 4. Environment variables (BULLETIN_* prefix, `__` between sections)
    pub fn load() -> Result<Config> {
        let config: Config = Self::base_figment()
            .merge(Yaml::file(".bulletin/config.yaml"))
            .merge(Yaml::file(".bulletin/local.yaml"))
            .merge(Env::prefixed("BULLETIN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Self::base_figment()
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn base_figment() -> Figment {
        Figment::new().merge(Serialized::defaults(Config::default()))
    }

    /// Validate configuration after loading
    ///
    /// Convergence thresholds are taken as given.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.actual_lrp.max_workers == 0 {
            return Err(ConfigError::InvalidMaxWorkers(config.actual_lrp.max_workers));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".bulletin/bulletin.db");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.convergence.kick_tasks_after_secs, 30);
        assert_eq!(config.convergence.expire_pending_after_secs, 1800);
        assert_eq!(config.convergence.expire_completed_after_secs, 120);
        assert_eq!(config.actual_lrp.max_workers, 50);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/path.db
  max_connections: 5
logging:
  level: debug
  format: pretty
convergence:
  kick_tasks_after_secs: 10
actual_lrp:
  max_workers: 8
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.convergence.kick_tasks_after_secs, 10);
        assert_eq!(config.convergence.expire_pending_after_secs, 1800);
        assert_eq!(config.actual_lrp.max_workers, 8);

        let thresholds = config.convergence.thresholds();
        assert_eq!(thresholds.kick_tasks_after, Duration::from_secs(10));

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyDatabasePath
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_zero_max_workers() {
        let mut config = Config::default();
        config.actual_lrp.max_workers = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxWorkers(0)
        ));
    }

    #[test]
    fn test_thresholds_are_not_validated() {
        let mut config = Config::default();
        config.convergence.kick_tasks_after_secs = 0;
        config.convergence.expire_completed_after_secs = 0;

        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: warn\nactual_lrp:\n  max_workers: 4").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.actual_lrp.max_workers, 4);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "database:\n  max_connections: 0").unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_env::with_vars(
            [
                ("BULLETIN_LOGGING__LEVEL", Some("debug")),
                ("BULLETIN_CONVERGENCE__KICK_TASKS_AFTER_SECS", Some("45")),
            ],
            || {
                Figment::new()
                    .merge(Serialized::defaults(Config::default()))
                    .merge(Yaml::file(dir.path().join("missing.yaml")))
                    .merge(Env::prefixed("BULLETIN_").split("__"))
                    .extract::<Config>()
                    .unwrap()
            },
        );

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.convergence.kick_tasks_after_secs, 45);
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "logging:\n  level: info\n  format: pretty").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(
            config.logging.format, "pretty",
            "Base value should persist when not overridden"
        );
    }
}
