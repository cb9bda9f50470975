//! Cache trait definitions
//!
//! - `Cache`: one generation of (request key -> response) pairs
//! - `CacheStorage`: the set of named generations

use async_trait::async_trait;
use std::sync::Arc;

use super::entry::{CacheEntry, CacheKey};
use super::error::CacheError;
use super::stats::CacheStats;

/// A single cache generation
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a cache entry by key
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Store an entry, overwriting any previous one (last write wins)
    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError>;

    /// Delete a cache entry by key
    /// Returns true if the entry was deleted, false if it didn't exist
    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<(), CacheError>;

    /// All keys currently held
    async fn keys(&self) -> Result<Vec<CacheKey>, CacheError>;

    async fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Run pending async tasks (for caches that use async backends like moka)
    async fn run_pending_tasks(&self) {}
}

/// Named cache generations
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if it does not exist
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError>;

    /// Existing generation only; never creates one
    async fn get(&self, name: &str) -> Option<Arc<dyn Cache>>;

    /// Generation of the most recently activated worker
    fn current(&self) -> Option<String>;

    fn set_current(&self, name: &str);

    /// Names of every existing generation
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a generation and all its entries
    /// Returns true if it existed
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;
}
