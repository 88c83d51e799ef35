//! Sync configuration with defaults and validation.
//!
//! # Invariants
//! - A validated config always has an http(s) endpoint, a fetch limit in
//!   `1..=MAX_FETCH_LIMIT` and an interval of at least `MIN_SYNC_INTERVAL`.

use crate::sync::reconcile::ResolutionPolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
pub const DEFAULT_FETCH_LIMIT: u32 = 5;
pub const MAX_FETCH_LIMIT: u32 = 100;
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Remote endpoint and auto-sync settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub endpoint: String,
    pub fetch_limit: u32,
    pub interval: Duration,
    /// Policy applied by auto-sync and by `sync` without an explicit choice.
    pub policy: ResolutionPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            interval: DEFAULT_SYNC_INTERVAL,
            policy: ResolutionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidEndpoint(String),
    FetchLimitOutOfRange(u32),
    IntervalTooShort(Duration),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => {
                write!(f, "endpoint must start with http:// or https://, got `{value}`")
            }
            Self::FetchLimitOutOfRange(value) => {
                write!(f, "fetch limit must be within 1..={MAX_FETCH_LIMIT}, got {value}")
            }
            Self::IntervalTooShort(value) => write!(
                f,
                "sync interval must be at least {}s, got {}ms",
                MIN_SYNC_INTERVAL.as_secs(),
                value.as_millis()
            ),
        }
    }
}

impl Error for ConfigError {}

impl SyncConfig {
    /// Checks ranges and normalizes the endpoint (trimmed, no trailing `/`).
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint));
        }
        if self.fetch_limit == 0 || self.fetch_limit > MAX_FETCH_LIMIT {
            return Err(ConfigError::FetchLimitOutOfRange(self.fetch_limit));
        }
        if self.interval < MIN_SYNC_INTERVAL {
            return Err(ConfigError::IntervalTooShort(self.interval));
        }
        self.endpoint = endpoint;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SyncConfig, DEFAULT_ENDPOINT};
    use std::time::Duration;

    #[test]
    fn default_config_is_valid() {
        let config = SyncConfig::default().validate().expect("defaults are valid");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn rejects_non_http_endpoint_and_short_interval() {
        let bad_endpoint = SyncConfig {
            endpoint: "ftp://example.com".to_string(),
            ..SyncConfig::default()
        };
        assert!(matches!(
            bad_endpoint.validate(),
            Err(ConfigError::InvalidEndpoint(_))
        ));

        let short = SyncConfig {
            interval: Duration::from_millis(200),
            ..SyncConfig::default()
        };
        assert!(matches!(
            short.validate(),
            Err(ConfigError::IntervalTooShort(_))
        ));
    }

    #[test]
    fn trims_trailing_slash() {
        let config = SyncConfig {
            endpoint: " https://example.com/posts/ ".to_string(),
            ..SyncConfig::default()
        }
        .validate()
        .expect("valid endpoint");
        assert_eq!(config.endpoint, "https://example.com/posts");
    }
}
