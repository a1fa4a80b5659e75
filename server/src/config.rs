use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_ttl_days: i64,
    pub max_image_bytes: usize,
    /// Cheap argon2 parameters for dev and test databases.
    pub insecure_password_hashing: bool,
    /// Adds an `X-DB-Query-Count` header to every response.
    pub track_db_query_count: bool,
}

/// Collector settings, read before logging is up.
#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub endpoint: Option<String>,
    pub service_name: String,
}

impl OtelConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.trim().is_empty()),
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "foodgram-server".to_string()),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            bind_addr: try_load("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            session_ttl_days: try_load("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?,
            max_image_bytes: try_load("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            insecure_password_hashing: env::var("INSECURE_PASSWORD_HASHING").is_ok(),
            track_db_query_count: env::var("TRACK_DB_QUERY_COUNT").is_ok_and(|v| v == "1"),
        })
    }
}

fn try_load<T>(key: &'static str, default: impl Display) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse(key, &value)
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr() {
        let addr: SocketAddr = parse("BIND_ADDR", DEFAULT_BIND_ADDR).unwrap();
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse::<usize>("MAX_IMAGE_BYTES", "ten megs").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "MAX_IMAGE_BYTES",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_trims() {
        let days: i64 = parse("SESSION_TTL_DAYS", " 7 ").unwrap();
        assert_eq!(days, 7);
    }
}
