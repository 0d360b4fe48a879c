//! Engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                        | Default          |
//! |---------------------------------|------------------|
//! | `SWEETSHOP_DB_PATH`             | `./sweetshop.db` |
//! | `SWEETSHOP_DB_MAX_CONNECTIONS`  | `5`              |
//! | `SWEETSHOP_STORE_TIMEOUT_MS`    | `5000`           |
//! | `SWEETSHOP_MAX_RESTOCK_DELTA`   | `100000`         |
//! | `SWEETSHOP_LOW_STOCK_THRESHOLD` | `10`             |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sweetshop_core::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_MAX_RESTOCK_DELTA};
use sweetshop_db::DbConfig;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Deadline for every individual store call, in milliseconds
    pub store_timeout_ms: u64,

    /// Largest quantity one restock may add
    pub max_restock_delta: i64,

    /// Threshold used when a low-stock report is asked for without one
    pub low_stock_threshold: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: PathBuf::from("./sweetshop.db"),
            max_connections: 5,
            store_timeout_ms: 5_000,
            max_restock_delta: DEFAULT_MAX_RESTOCK_DELTA,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            database_path: lookup("SWEETSHOP_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "SWEETSHOP_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            store_timeout_ms: parse_or(&lookup, "SWEETSHOP_STORE_TIMEOUT_MS", defaults.store_timeout_ms)?,

            max_restock_delta: parse_or(
                &lookup,
                "SWEETSHOP_MAX_RESTOCK_DELTA",
                defaults.max_restock_delta,
            )?,

            low_stock_threshold: parse_or(
                &lookup,
                "SWEETSHOP_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the engine unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("SWEETSHOP_DB_MAX_CONNECTIONS".to_string()));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("SWEETSHOP_STORE_TIMEOUT_MS".to_string()));
        }
        if self.max_restock_delta <= 0 {
            return Err(ConfigError::InvalidValue("SWEETSHOP_MAX_RESTOCK_DELTA".to_string()));
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue("SWEETSHOP_LOW_STOCK_THRESHOLD".to_string()));
        }
        Ok(())
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn max_restock_delta(mut self, delta: i64) -> Self {
        self.max_restock_delta = delta;
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Store call deadline as a Duration.
    pub fn store_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Pool settings derived from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
