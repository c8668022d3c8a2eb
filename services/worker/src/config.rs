//! services/worker/src/config.rs
//!
//! Defines the worker's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;

/// The queue grading jobs are published to and consumed from.
pub const DEFAULT_QUEUE_NAME: &str = "exam_analytics";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub log_level: Level,
    pub queue_name: String,
    pub poll_interval: Duration,
    pub db_max_connections: u32,
    pub db_connect_attempts: u32,
    pub db_connect_retry_delay: Duration,
    pub run_migrations: bool,
}

impl WorkerConfig {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Database Settings ---
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;
        let db_connect_attempts = parse_or(&lookup, "DB_CONNECT_ATTEMPTS", 10u32)?;
        if db_connect_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_CONNECT_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let db_connect_retry_delay =
            Duration::from_secs(parse_or(&lookup, "DB_CONNECT_RETRY_SECS", 5u64)?);
        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        // --- Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Queue Settings ---
        let queue_name = lookup("QUEUE_NAME").unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string());
        if queue_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "QUEUE_NAME".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let poll_interval = Duration::from_millis(parse_or(&lookup, "POLL_INTERVAL_MS", 1000u64)?);

        Ok(Self {
            database_url,
            log_level,
            queue_name,
            poll_interval,
            db_max_connections,
            db_connect_attempts,
            db_connect_retry_delay,
            run_migrations,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            WorkerConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/exams")]))
                .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/exams");
        assert_eq!(config.queue_name, DEFAULT_QUEUE_NAME);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_connect_attempts, 10);
        assert_eq!(config.db_connect_retry_delay, Duration::from_secs(5));
        assert!(config.run_migrations);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = WorkerConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = WorkerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/exams"),
            ("RUST_LOG", "debug"),
            ("QUEUE_NAME", "grading"),
            ("POLL_INTERVAL_MS", "250"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();

        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.queue_name, "grading");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.db_max_connections, 12);
        assert!(!config.run_migrations);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = WorkerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/exams"),
            ("POLL_INTERVAL_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "POLL_INTERVAL_MS"));

        let err = WorkerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/exams"),
            ("RUST_LOG", "loud"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "RUST_LOG"));

        let err = WorkerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/exams"),
            ("DB_CONNECT_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "DB_CONNECT_ATTEMPTS"));
    }
}
