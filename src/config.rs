use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::event::DEFAULT_SUBSCRIBER_CAPACITY;
use crate::room::CleanupConfig;

const BIND_ADDR_VAR: &str = "TEAMHEALTH_BIND_ADDR";
const ROOM_MAX_AGE_VAR: &str = "TEAMHEALTH_ROOM_MAX_AGE_SECS";
const CLEANUP_INTERVAL_VAR: &str = "TEAMHEALTH_CLEANUP_INTERVAL_SECS";
const SUBSCRIBER_BUFFER_VAR: &str = "TEAMHEALTH_SUBSCRIBER_BUFFER";
const KEEP_ALIVE_VAR: &str = "TEAMHEALTH_KEEP_ALIVE_SECS";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Server settings, read from `TEAMHEALTH_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cleanup: CleanupConfig,
    /// Events a single stream may have queued before new ones are dropped
    pub subscriber_buffer: usize,
    pub keep_alive: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cleanup: CleanupConfig::default(),
            subscriber_buffer: DEFAULT_SUBSCRIBER_CAPACITY,
            keep_alive: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = parse_or(&lookup, BIND_ADDR_VAR, defaults.bind_addr)?;
        let max_room_age = parse_secs_or(
            &lookup,
            ROOM_MAX_AGE_VAR,
            defaults.cleanup.max_room_age,
        )?;
        let cleanup_interval = parse_secs_or(
            &lookup,
            CLEANUP_INTERVAL_VAR,
            defaults.cleanup.cleanup_interval,
        )?;
        let subscriber_buffer =
            parse_or(&lookup, SUBSCRIBER_BUFFER_VAR, defaults.subscriber_buffer)?;
        if subscriber_buffer == 0 {
            return Err(ConfigError::Zero {
                key: SUBSCRIBER_BUFFER_VAR,
            });
        }
        let keep_alive = parse_secs_or(&lookup, KEEP_ALIVE_VAR, defaults.keep_alive)?;

        Ok(Self {
            bind_addr,
            cleanup: CleanupConfig {
                cleanup_interval,
                max_room_age,
            },
            subscriber_buffer,
            keep_alive,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parse_secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(lookup, key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Zero { key });
    }
    Ok(Duration::from_secs(secs))
}
