// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::CacheConfig;
use crate::constants::{
    DEFAULT_ONLINE_MESSAGE, DEFAULT_ORIGIN, DEFAULT_QUEUE_DIR, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STORE_NAME, DEFAULT_SYNC_TAG,
};

pub mod retry;

pub use retry::RetryConfigYaml;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Where requests go when they leave the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Origin that relative request URLs are resolved against
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.origin)
            .map_err(|e| format!("network.origin '{}' is not a valid URL: {}", self.origin, e))?;
        if self.request_timeout_secs == 0 {
            return Err("network.request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_queue_dir() -> String {
    DEFAULT_QUEUE_DIR.to_string()
}

fn default_store_name() -> String {
    DEFAULT_STORE_NAME.to_string()
}

/// Durable queue location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_dir")]
    pub dir: String,
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dir: default_queue_dir(),
            store_name: default_store_name(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.dir.is_empty() {
            return Err("queue.dir cannot be empty".to_string());
        }
        if self.store_name.is_empty()
            || self.store_name.contains('/')
            || self.store_name.contains('\\')
            || self.store_name.starts_with('.')
        {
            return Err(format!(
                "queue.store_name '{}' must be a plain directory name",
                self.store_name
            ));
        }
        Ok(())
    }
}

fn default_sync_tag() -> String {
    DEFAULT_SYNC_TAG.to_string()
}

fn default_online_message() -> String {
    DEFAULT_ONLINE_MESSAGE.to_string()
}

/// Replay triggers and policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Background-sync registration tag
    #[serde(default = "default_sync_tag")]
    pub tag: String,
    /// Literal in-process message meaning "connectivity restored"
    #[serde(default = "default_online_message")]
    pub online_message: String,
    #[serde(default)]
    pub retry: RetryConfigYaml,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tag: default_sync_tag(),
            online_message: default_online_message(),
            retry: RetryConfigYaml::default(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tag.is_empty() {
            return Err("sync.tag cannot be empty".to_string());
        }
        if self.online_message.is_empty() {
            return Err("sync.online_message cannot be empty".to_string());
        }
        self.retry.validate()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter directive; RUST_LOG overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config = Self::from_yaml_with_env(&yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.network.validate()?;
        self.cache.validate()?;
        self.queue.validate()?;
        self.sync.validate()
    }
}
