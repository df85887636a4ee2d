use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "sqlite://golfcourse.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 180;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 3;

/// Process settings, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub max_lifetime: Duration,
    pub query_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing keys fall back
    /// to defaults; present but unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(&lookup, "BIND_ADDR", || {
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
        })?;
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", || DEFAULT_MAX_CONNECTIONS)?;
        let max_lifetime_secs =
            parse_or(&lookup, "DB_MAX_LIFETIME_SECS", || DEFAULT_MAX_LIFETIME_SECS)?;
        let query_timeout_secs =
            parse_or(&lookup, "QUERY_TIMEOUT_SECS", || DEFAULT_QUERY_TIMEOUT_SECS)?;

        if max_connections == 0 {
            return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
        }

        Ok(Self {
            bind_addr,
            database_url,
            max_connections,
            max_lifetime: Duration::from_secs(max_lifetime_secs),
            query_timeout: Duration::from_secs(query_timeout_secs),
        })
    }
}

fn parse_or<F, T, D>(lookup: &F, key: &str, default: D) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> T,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} is invalid ({:?}): {}", key, raw, e))),
        None => Ok(default()),
    }
}
