//! EngineConfig - 実行エンジンの設定
//!
//! Defaults, then an optional JSON document, then `CONDUIT_*` environment
//! overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ENV_POLL_INTERVAL_MS: &str = "CONDUIT_POLL_INTERVAL_MS";
pub const ENV_DEFAULT_BACKOFF_MS: &str = "CONDUIT_DEFAULT_BACKOFF_MS";
pub const ENV_LEASE_MS: &str = "CONDUIT_LEASE_MS";
pub const ENV_INSTANCES: &str = "CONDUIT_INSTANCES";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed delay between two polls of one worker loop.
    pub poll_interval_ms: u64,

    /// Re-poll delay for a RUNNING task that declares no backoff of its own.
    pub default_backoff_ms: u64,

    /// How long a polled message stays invisible before it is redelivered.
    pub lease_ms: u64,

    /// Number of independent poll loops.
    pub instances: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            default_backoff_ms: 1_000,
            lease_ms: 60_000,
            instances: 1,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_backoff(&self) -> Duration {
        Duration::from_millis(self.default_backoff_ms)
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }

    /// Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `CONDUIT_*` overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_POLL_INTERVAL_MS)? {
            self.poll_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_DEFAULT_BACKOFF_MS)? {
            self.default_backoff_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_LEASE_MS)? {
            self.lease_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_INSTANCES)? {
            self.instances = v;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.lease_ms == 0 {
            return Err(ConfigError::Zero("lease_ms"));
        }
        if self.instances == 0 {
            return Err(ConfigError::Zero("instances"));
        }
        Ok(self)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.default_backoff(), Duration::from_secs(1));
        assert_eq!(config.lease_duration(), Duration::from_secs(60));
        assert_eq!(config.instances, 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"instances": 4}"#).unwrap();
        assert_eq!(config.instances, 4);
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[test]
    fn env_overrides_win() {
        let config = EngineConfig::default()
            .with_overrides(vars(&[
                (ENV_POLL_INTERVAL_MS, "25"),
                (ENV_DEFAULT_BACKOFF_MS, " 500 "),
                (ENV_INSTANCES, "3"),
            ]))
            .unwrap();
        assert_eq!(config.poll_interval_ms, 25);
        assert_eq!(config.default_backoff_ms, 500);
        assert_eq!(config.instances, 3);
        assert_eq!(config.lease_ms, 60_000);
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        let err = EngineConfig::default()
            .with_overrides(vars(&[(ENV_LEASE_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { key: ENV_LEASE_MS, ref value } if value == "soon"
        ));
    }

    #[test]
    fn zero_instances_is_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"instances": 0}"#),
            Err(ConfigError::Zero("instances"))
        ));
    }
}
