//! Simulation service configuration.

use std::time::Duration;

pub const ENV_API_BASE_URL: &str = "CARBONFLOW_API_BASE_URL";
pub const ENV_API_TIMEOUT_MS: &str = "CARBONFLOW_API_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Wall-clock interval between playback ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(90);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service root without a trailing slash.
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Simulation service address is not configured ({key} is unset)")]
    MissingBaseUrl { key: &'static str },

    #[error("Invalid timeout value: {value}")]
    InvalidTimeout { value: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(mut getter: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = getter(ENV_API_BASE_URL)
            .map(|v| normalize_base_url(&v))
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingBaseUrl {
                key: ENV_API_BASE_URL,
            })?;
        let timeout_ms = match getter(ENV_API_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout { value })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            base_url,
            timeout_ms,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn simulate_url(&self) -> String {
        format!("{}/simulate", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
