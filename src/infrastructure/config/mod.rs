//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::{FeedSettings, RetryPolicy, DEFAULT_COLLECTION};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AppConfig {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    Memory,
    JsonFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: Option<PathBuf>,
    pub collection: String,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FeedConfig {
    pub send_retry: RetryConfig,
}

/// Bounded retry for sends. One attempt means no retry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "duo-chat".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: None,
            collection: DEFAULT_COLLECTION.to_string(),
            poll_interval_ms: 500,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 250,
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load_env() -> Self {
        Config::default().with_env()
    }

    /// Apply `DUO_CHAT_*` environment overrides
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("DUO_CHAT_STORE_PATH") {
            self.store.backend = StoreBackend::JsonFile;
            self.store.path = Some(PathBuf::from(path));
        }

        if let Some(collection) = lookup("DUO_CHAT_COLLECTION") {
            self.store.collection = collection;
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::JsonFile && self.store.path.is_none() {
            return Err(ConfigError::MissingField("store.path".to_string()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::InvalidValue("store.collection must not be empty".to_string()));
        }
        if self.store.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("store.poll-interval-ms must be positive".to_string()));
        }
        if self.feed.send_retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("feed.send-retry.max-attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            collection: self.store.collection.clone(),
            send_retry: RetryPolicy::new(
                self.feed.send_retry.max_attempts,
                Duration::from_millis(self.feed.send_retry.backoff_ms),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("poll-interval-ms"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("store:\n  backend: json-file\n  path: /tmp/chat\n").unwrap();
        assert_eq!(config.store.backend, StoreBackend::JsonFile);
        assert_eq!(config.store.collection, "messages");
        assert_eq!(config.app.name, "duo-chat");
        assert_eq!(config.feed.send_retry.max_attempts, 1);
    }

    #[test]
    fn test_json_file_without_path_is_rejected() {
        let err = Config::from_yaml("store:\n  backend: json-file\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "store.path"));
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let err = Config::from_yaml("feed:\n  send-retry:\n    max-attempts: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DUO_CHAT_STORE_PATH", "/var/lib/duo-chat"),
            ("DUO_CHAT_COLLECTION", "lobby"),
        ]
        .into_iter()
        .collect();
        let config = Config::default().with_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.backend, StoreBackend::JsonFile);
        assert_eq!(config.store.path, Some(PathBuf::from("/var/lib/duo-chat")));
        assert_eq!(config.feed_settings().collection, "lobby");
    }

    #[test]
    fn test_feed_settings_from_retry_config() {
        let mut config = Config::default();
        config.feed.send_retry = RetryConfig {
            max_attempts: 3,
            backoff_ms: 100,
        };
        let settings = config.feed_settings();
        assert_eq!(settings.send_retry.max_attempts, 3);
        assert_eq!(settings.send_retry.backoff, Duration::from_millis(100));
    }
}
