use std::env;
use std::time::Duration;

use spots::{DEFAULT_GRACE, StaleTimerPolicy};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidPolicy(String),
    InvalidUrl(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer, got {value:?}")
            }
            ConfigError::InvalidPolicy(v) => {
                write!(f, "stale timer policy must be `cancel` or `legacy`, got {v:?}")
            }
            ConfigError::InvalidUrl(v) => write!(f, "api url must start with http(s)://, got {v:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Externally supplied settings for a spot feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Base URL of the backend, without trailing slash.
    pub api_url: String,
    /// Map provider access token. Presentation only.
    pub map_token: Option<String>,
    pub grace: Duration,
    pub stale_timers: StaleTimerPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            map_token: None,
            grace: DEFAULT_GRACE,
            stale_timers: StaleTimerPolicy::default(),
        }
    }
}

impl FeedConfig {
    /// Read `PARKING_API_URL`, `PARKING_MAP_TOKEN`, `PARKING_GRACE_MS` and
    /// `PARKING_STALE_TIMERS`, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(url) = lookup("PARKING_API_URL") {
            cfg = cfg.with_api_url(url)?;
        }
        cfg.map_token = lookup("PARKING_MAP_TOKEN").filter(|t| !t.trim().is_empty());
        if let Some(raw) = lookup("PARKING_GRACE_MS") {
            let ms = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: "PARKING_GRACE_MS",
                value: raw.clone(),
            })?;
            cfg.grace = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("PARKING_STALE_TIMERS") {
            cfg.stale_timers =
                StaleTimerPolicy::parse(&raw).ok_or(ConfigError::InvalidPolicy(raw))?;
        }
        Ok(cfg)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url));
        }
        self.api_url = trimmed.to_string();
        Ok(self)
    }

    pub fn spots_url(&self) -> String {
        format!("{}/spots", self.api_url)
    }

    /// Update channel URL: the API scheme swapped for its streaming
    /// equivalent (`http` -> `ws`, `https` -> `wss`).
    pub fn ws_url(&self) -> String {
        let rest = self.api_url.strip_prefix("http").unwrap_or(&self.api_url);
        format!("ws{rest}/ws")
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FeedConfig};
    use spots::StaleTimerPolicy;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_loopback() {
        let cfg = FeedConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.api_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.spots_url(), "http://127.0.0.1:8000/spots");
        assert_eq!(cfg.ws_url(), "ws://127.0.0.1:8000/ws");
        assert_eq!(cfg.grace, Duration::from_millis(3000));
        assert_eq!(cfg.map_token, None);
    }

    #[test]
    fn https_maps_to_wss_and_trailing_slash_is_trimmed() {
        let cfg = FeedConfig::from_lookup(lookup(&[("PARKING_API_URL", "https://parking.example/api/")]))
            .unwrap();
        assert_eq!(cfg.spots_url(), "https://parking.example/api/spots");
        assert_eq!(cfg.ws_url(), "wss://parking.example/api/ws");
    }

    #[test]
    fn reads_grace_policy_and_token() {
        let cfg = FeedConfig::from_lookup(lookup(&[
            ("PARKING_GRACE_MS", "1500"),
            ("PARKING_STALE_TIMERS", "legacy"),
            ("PARKING_MAP_TOKEN", "pk.test"),
        ]))
        .unwrap();
        assert_eq!(cfg.grace, Duration::from_millis(1500));
        assert_eq!(cfg.stale_timers, StaleTimerPolicy::Legacy);
        assert_eq!(cfg.map_token.as_deref(), Some("pk.test"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let cfg = FeedConfig::from_lookup(lookup(&[("PARKING_MAP_TOKEN", "  ")])).unwrap();
        assert_eq!(cfg.map_token, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            FeedConfig::from_lookup(lookup(&[("PARKING_GRACE_MS", "soon")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            FeedConfig::from_lookup(lookup(&[("PARKING_STALE_TIMERS", "never")])),
            Err(ConfigError::InvalidPolicy(_))
        ));
        assert!(matches!(
            FeedConfig::from_lookup(lookup(&[("PARKING_API_URL", "ftp://x")])),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
