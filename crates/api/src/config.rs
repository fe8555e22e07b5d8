use std::env;
use std::str::FromStr;

use booking_core::StoreConfig;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// Document store URL: `postgres://...`, or `memory://` for an in-process store.
    pub database_url: String,
    /// Logical database name.
    pub database_name: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{name} must be a valid {expected}, got {value:?}")]
pub struct ConfigError {
    name: &'static str,
    expected: &'static str,
    value: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: string("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", "u16", 8000)?,
            database_url: string("DATABASE_URL", "postgres://localhost:5432"),
            database_name: string("DATABASE_NAME", "app_db"),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", "u32", 10)?,
            db_min_connections: parse(&lookup, "DB_MIN_CONNECTIONS", "u32", 1)?,
            log_level: string("LOG_LEVEL", "info"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store(&self) -> StoreConfig {
        StoreConfig {
            url: self.database_url.clone(),
            database_name: self.database_name.clone(),
            max_connections: self.db_max_connections,
            min_connections: self.db_min_connections,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError {
            name,
            expected,
            value,
        }),
    }
}
