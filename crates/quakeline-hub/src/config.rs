//! Hub configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;

/// Top-level hub configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Indexer settings.
    #[serde(default)]
    pub indexer: IndexerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "quakeline_indexer=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Indexer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Source treated as the authoritative aggregator for weighting.
    #[serde(default = "default_aggregator_source")]
    pub aggregator_source: String,
}

fn default_db_path() -> String {
    "quakeline.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_aggregator_source() -> String {
    quakeline_modules::DEFAULT_AGGREGATOR_SOURCE.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            aggregator_source: default_aggregator_source(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `QUAKELINE_DB_PATH` overrides `database.path`
/// - `QUAKELINE_LOG_LEVEL` overrides `logging.level`
/// - `QUAKELINE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `QUAKELINE_AGGREGATOR_SOURCE` overrides `indexer.aggregator_source`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(db_path) = std::env::var("QUAKELINE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("QUAKELINE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("QUAKELINE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(source) = std::env::var("QUAKELINE_AGGREGATOR_SOURCE") {
        config.indexer.aggregator_source = source;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = Config::default();
        assert_eq!(config.database.path, "quakeline.db");
        assert_eq!(config.database.pool_max_size, 8);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.indexer.aggregator_source, "atlas");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/var/lib/quakeline/index.db"

            [indexer]
            aggregator_source = "official"
            "#,
        )
        .expect("parse");

        assert_eq!(config.database.path, "/var/lib/quakeline/index.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.indexer.aggregator_source, "official");
        assert_eq!(config.logging.level, "info");
    }
}
