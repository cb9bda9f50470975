//! Cache generation configuration
//!
//! Names the current cache generation, the precache manifest pulled at
//! install time, and the cacheable API surface used by the router.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_PATTERNS, DEFAULT_CACHE_NAME, DEFAULT_CACHE_VERSION, DEFAULT_MAX_CACHE_SIZE_MB,
    DEFAULT_OFFLINE_PAGE, DEFAULT_PRECACHE,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Generation name; the current generation is "{name}-{version}"
    #[serde(default = "default_name")]
    pub name: String,
    /// Bumped on every deployment to supersede the previous generation
    #[serde(default = "default_version")]
    pub version: String,
    /// Must-have assets fetched at install time
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
    /// Document served in place of a failed top-level page load
    #[serde(default = "default_offline_page")]
    pub offline_page: String,
    /// Ordered path patterns (regex) routed network-first and cached
    #[serde(default = "default_api_patterns")]
    pub api_patterns: Vec<String>,
    #[serde(default = "default_max_cache_size_mb")]
    pub max_cache_size_mb: u64,
}

fn default_name() -> String {
    DEFAULT_CACHE_NAME.to_string()
}

fn default_version() -> String {
    DEFAULT_CACHE_VERSION.to_string()
}

fn default_precache() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect()
}

fn default_offline_page() -> String {
    DEFAULT_OFFLINE_PAGE.to_string()
}

fn default_api_patterns() -> Vec<String> {
    DEFAULT_API_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_max_cache_size_mb() -> u64 {
    DEFAULT_MAX_CACHE_SIZE_MB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            precache: default_precache(),
            offline_page: default_offline_page(),
            api_patterns: default_api_patterns(),
            max_cache_size_mb: default_max_cache_size_mb(),
        }
    }
}

impl CacheConfig {
    /// Identifier of the one generation that survives activation
    pub fn current_generation(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Convert max_cache_size_mb to bytes, saturating at u64::MAX
    pub fn max_cache_size_bytes(&self) -> u64 {
        self.max_cache_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("cache.name cannot be empty".to_string());
        }
        if self.version.is_empty() {
            return Err("cache.version cannot be empty".to_string());
        }
        if self.max_cache_size_mb == 0 {
            return Err("cache.max_cache_size_mb must be greater than 0".to_string());
        }
        if !self.offline_page.starts_with('/') {
            return Err(format!(
                "cache.offline_page '{}' must be an absolute path",
                self.offline_page
            ));
        }
        for pattern in &self.api_patterns {
            Regex::new(pattern)
                .map_err(|e| format!("cache.api_patterns: invalid pattern '{}': {}", pattern, e))?;
        }
        Ok(())
    }
}
