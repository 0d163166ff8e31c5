//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                         | Default              |
//! |----------------------------------|----------------------|
//! | `COMMERCE_DB_PATH`               | `./commerce_dev.db`  |
//! | `COMMERCE_MAX_CONNECTIONS`       | `5`                  |
//! | `COMMERCE_CONNECT_TIMEOUT_SECS`  | `30`                 |
//! | `COMMERCE_BUSY_TIMEOUT_MS`       | `5000`               |
//! | `COMMERCE_CHECKOUT_MAX_ATTEMPTS` | `3`                  |
//! | `COMMERCE_RETRY_BACKOFF_MS`      | `25`                 |
//! | `COMMERCE_TOP_LIMIT`             | `5`                  |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use commerce_core::{MAX_RANKING_LIMIT, TOP_ORDERED_OPTIONS_LIMIT};
use commerce_db::{CheckoutConfig, DbConfig};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub connect_timeout: Duration,

    /// How long a checkout waits for SQLite's write lock
    pub busy_timeout: Duration,

    /// Checkout attempts before a conflict is reported
    pub checkout_max_attempts: u32,

    /// First wait between checkout attempts; later waits double
    pub retry_backoff: Duration,

    /// Default size of the `top` ranking
    pub top_limit: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_path: lookup("COMMERCE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./commerce_dev.db")),

            max_connections: parse(&lookup, "COMMERCE_MAX_CONNECTIONS", 5)?,

            connect_timeout: Duration::from_secs(parse(
                &lookup,
                "COMMERCE_CONNECT_TIMEOUT_SECS",
                30,
            )?),

            busy_timeout: Duration::from_millis(parse(&lookup, "COMMERCE_BUSY_TIMEOUT_MS", 5000)?),

            checkout_max_attempts: parse(&lookup, "COMMERCE_CHECKOUT_MAX_ATTEMPTS", 3)?,

            retry_backoff: Duration::from_millis(parse(&lookup, "COMMERCE_RETRY_BACKOFF_MS", 25)?),

            top_limit: parse(&lookup, "COMMERCE_TOP_LIMIT", TOP_ORDERED_OPTIONS_LIMIT)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("COMMERCE_MAX_CONNECTIONS".to_string()));
        }
        if config.checkout_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "COMMERCE_CHECKOUT_MAX_ATTEMPTS".to_string(),
            ));
        }
        if config.top_limit == 0 || config.top_limit > MAX_RANKING_LIMIT {
            return Err(ConfigError::InvalidValue("COMMERCE_TOP_LIMIT".to_string()));
        }

        Ok(config)
    }

    /// Pool settings for [`commerce_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .connect_timeout(self.connect_timeout)
            .busy_timeout(self.busy_timeout)
    }

    /// Retry policy for the checkout engine.
    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig::default()
            .max_attempts(self.checkout_max_attempts)
            .retry_backoff(self.retry_backoff)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
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
