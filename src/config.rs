//! Service configuration from environment variables
//!
//! Every value has a default. Values that fail to parse fall back to the
//! default; values that parse but cannot be used are rejected up front.

use std::env;
use std::time::Duration;

/// Default remote source root
pub const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service/";

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the stats server
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listening address for the HTTP surface
    pub bind_addr: String,

    /// Remote source root, always ending in `/`
    pub base_url: String,

    /// Bearer credential attached to every outbound call
    pub bearer_token: Option<String>,

    /// Window capacity per category
    pub window_size: usize,

    /// Budget for the averaging path (also its per-call timeout)
    pub numbers_deadline_ms: u64,

    /// Per-call timeout for social-graph fetches
    pub remote_timeout_ms: u64,

    /// Maximum permits held by the rate limiter
    pub rate_limit_capacity: usize,

    /// Period over which `rate_limit_capacity` permits are refilled
    pub rate_limit_window_ms: u64,

    /// Cap on concurrently running fan-out units
    pub fanout_max_in_flight: usize,

    /// Length of the ranked lists
    pub top_k: usize,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `FEEDSTATS_BIND_ADDR` (default: 0.0.0.0:8080)
    /// - `REMOTE_BASE_URL` (default: [`DEFAULT_BASE_URL`])
    /// - `REMOTE_BEARER_TOKEN` (default: unset)
    /// - `WINDOW_SIZE` (default: 10)
    /// - `NUMBERS_DEADLINE_MS` (default: 500)
    /// - `REMOTE_TIMEOUT_MS` (default: 10000)
    /// - `RATE_LIMIT_CAPACITY` (default: 10)
    /// - `RATE_LIMIT_WINDOW_MS` (default: 10000)
    /// - `FANOUT_MAX_IN_FLIGHT` (default: 16)
    /// - `TOP_K` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let mut base_url = lookup("REMOTE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "REMOTE_BASE_URL must start with http:// or https://".to_string(),
            ));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let bearer_token = lookup("REMOTE_BEARER_TOKEN").filter(|t| !t.trim().is_empty());

        let config = Self {
            bind_addr: lookup("FEEDSTATS_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            base_url,
            bearer_token,
            window_size: parsed("WINDOW_SIZE", 10) as usize,
            numbers_deadline_ms: parsed("NUMBERS_DEADLINE_MS", 500),
            remote_timeout_ms: parsed("REMOTE_TIMEOUT_MS", 10_000),
            rate_limit_capacity: parsed("RATE_LIMIT_CAPACITY", 10) as usize,
            rate_limit_window_ms: parsed("RATE_LIMIT_WINDOW_MS", 10_000),
            fanout_max_in_flight: parsed("FANOUT_MAX_IN_FLIGHT", 16) as usize,
            top_k: parsed("TOP_K", 5) as usize,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidValue("WINDOW_SIZE must be at least 1".to_string()));
        }

        if self.rate_limit_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_CAPACITY must be at least 1".to_string(),
            ));
        }

        if self.refill_interval().is_zero() {
            return Err(ConfigError::InvalidValue(format!(
                "refill interval rounds to zero ({}ms window / {} permits)",
                self.rate_limit_window_ms, self.rate_limit_capacity
            )));
        }

        if self.fanout_max_in_flight == 0 {
            return Err(ConfigError::InvalidValue(
                "FANOUT_MAX_IN_FLIGHT must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Wall-clock period after which one permit is returned to the pool
    pub fn refill_interval(&self) -> Duration {
        let capacity = self.rate_limit_capacity.max(1) as u64;
        Duration::from_millis(self.rate_limit_window_ms / capacity)
    }

    pub fn numbers_deadline(&self) -> Duration {
        Duration::from_millis(self.numbers_deadline_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}
