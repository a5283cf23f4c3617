//! Environment-driven configuration.
//!
//! Every knob reads a `STAMP_RECS_*` variable and falls back to a
//! sensible default, so the service boots with no configuration at all.

use std::env;
use std::str::FromStr;

use crate::error::{RecsError, Result};

/// Loaded-from-environment configuration sections implement this.
pub trait ConfigLoader: Sized {
    fn from_env() -> Result<Self>;
    fn validate(&self) -> Result<()>;
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self> {
        let config = Self {
            host: env::var("STAMP_RECS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_var("STAMP_RECS_PORT", 8083),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RecsError::Configuration {
                message: "listen host must not be empty".to_string(),
                key: Some("STAMP_RECS_HOST".to_string()),
            });
        }
        if self.port == 0 {
            return Err(RecsError::Configuration {
                message: "listen port must be non-zero".to_string(),
                key: Some("STAMP_RECS_PORT".to_string()),
            });
        }
        Ok(())
    }
}

/// Location of the store catalog snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub path: String,
}

impl ConfigLoader for SnapshotConfig {
    fn from_env() -> Result<Self> {
        let config = Self {
            path: env::var("STAMP_RECS_SNAPSHOT_PATH")
                .unwrap_or_else(|_| "data/stores.csv".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(RecsError::Configuration {
                message: "snapshot path must not be empty".to_string(),
                key: Some("STAMP_RECS_SNAPSHOT_PATH".to_string()),
            });
        }
        Ok(())
    }
}

/// Postgres connection settings. The database is optional: when no URL
/// is configured the service runs without stored visit history.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Reads `STAMP_RECS_DATABASE_URL`, falling back to `DATABASE_URL`.
    /// Returns `Ok(None)` when neither is set.
    pub fn from_env_optional() -> Result<Option<Self>> {
        let url = match env_with_fallback("STAMP_RECS_DATABASE_URL", "DATABASE_URL") {
            Some(url) => url,
            None => return Ok(None),
        };
        let config = Self {
            url,
            max_connections: parse_env_var("STAMP_RECS_DATABASE_MAX_CONNECTIONS", 5),
            connect_timeout_secs: parse_env_var("STAMP_RECS_DATABASE_CONNECT_TIMEOUT", 5),
        };
        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("postgres") {
            return Err(RecsError::Configuration {
                message: "database URL must be a postgres:// URL".to_string(),
                key: Some("STAMP_RECS_DATABASE_URL".to_string()),
            });
        }
        if self.max_connections == 0 {
            return Err(RecsError::Configuration {
                message: "max connections must be at least 1".to_string(),
                key: Some("STAMP_RECS_DATABASE_MAX_CONNECTIONS".to_string()),
            });
        }
        Ok(())
    }
}

/// Reads `primary`, then `fallback`. Blank values count as unset.
fn env_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary)
        .or_else(|_| env::var(fallback))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Parses an environment variable, keeping the default on absence or
/// parse failure.
fn parse_env_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
