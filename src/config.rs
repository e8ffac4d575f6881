//! Process configuration.
//!
//! Values are read once at startup and handed to the components that need
//! them; request handlers never consult the environment themselves.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_UPSTREAM_URL: &str = "https://gtfsapi.translink.ca/v3/gtfsposition";
pub const DEFAULT_API_KEY_PARAM: &str = "apikey";
pub const DEFAULT_RELAY_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3001/api/gtfs";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the feed relay.
#[derive(Clone)]
pub struct RelayConfig {
    pub upstream_url: String,
    pub api_key: String,
    pub api_key_param: String,
    pub bind_addr: SocketAddr,
    /// Upper bound on a whole vendor request.
    pub upstream_timeout: Duration,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("upstream_url", &self.upstream_url)
            .field("api_key", &"<redacted>")
            .field("api_key_param", &self.api_key_param)
            .field("bind_addr", &self.bind_addr)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl RelayConfig {
    /// Reads the relay settings from process environment variables.
    ///
    /// | Variable            | Default                               |
    /// |---------------------|---------------------------------------|
    /// | `TRANSLINK_API_KEY` | required                              |
    /// | `GTFS_API_URL`      | [`DEFAULT_UPSTREAM_URL`]              |
    /// | `GTFS_API_KEY_PARAM`| [`DEFAULT_API_KEY_PARAM`]             |
    /// | `RELAY_BIND`        | [`DEFAULT_RELAY_BIND`]                |
    /// | `UPSTREAM_TIMEOUT_SECS` | [`DEFAULT_UPSTREAM_TIMEOUT`]      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("TRANSLINK_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("TRANSLINK_API_KEY"))?;

        let bind = lookup("RELAY_BIND").unwrap_or_else(|| DEFAULT_RELAY_BIND.to_string());
        let bind_addr: SocketAddr = bind.parse().map_err(|_| ConfigError::Invalid {
            key: "RELAY_BIND",
            value: bind.clone(),
        })?;

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => positive_secs("UPSTREAM_TIMEOUT_SECS", raw)?,
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        Ok(Self {
            upstream_url: lookup("GTFS_API_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            api_key,
            api_key_param: lookup("GTFS_API_KEY_PARAM")
                .unwrap_or_else(|| DEFAULT_API_KEY_PARAM.to_string()),
            bind_addr,
            upstream_timeout,
        })
    }
}

/// Parses a whole number of seconds, rejecting zero.
pub fn positive_secs(key: &'static str, raw: String) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

/// Settings for the realtime status poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Where the relay serves the raw feed.
    pub feed_url: String,
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_RELAY_URL.to_string(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollerConfig {
    /// Reads `RELAY_URL` and `POLL_INTERVAL_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let interval = match lookup("POLL_INTERVAL_SECS") {
            Some(raw) => positive_secs("POLL_INTERVAL_SECS", raw)?,
            None => defaults.interval,
        };

        Ok(Self {
            feed_url: lookup("RELAY_URL").unwrap_or(defaults.feed_url),
            interval,
        })
    }
}
