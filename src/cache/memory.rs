//! Memory cache implementation
//!
//! - `MemoryCache`: one cache generation backed by moka, weighted by entry size
//! - `MemoryCacheStorage`: the set of named generations

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::entry::{CacheEntry, CacheKey};
use super::error::CacheError;
use super::stats::{CacheStats, Counters};
use super::traits::{Cache, CacheStorage};

/// MemoryCache wraps moka for our Cache trait
pub struct MemoryCache {
    cache: moka::future::Cache<CacheKey, CacheEntry>,
    counters: Arc<Counters>,
    max_size_bytes: u64,
}

impl MemoryCache {
    pub fn new(max_size_bytes: u64) -> Self {
        let counters = Arc::new(Counters::default());
        let listener_counters = counters.clone();

        let cache = moka::future::Cache::builder()
            .max_capacity(max_size_bytes)
            .weigher(|_key, entry: &CacheEntry| {
                let size = entry.size_bytes();
                if size > u32::MAX as usize {
                    u32::MAX
                } else {
                    size as u32
                }
            })
            .eviction_listener(move |_key, _value, cause| {
                // Explicit removals and overwrites are not evictions
                if cause == moka::notification::RemovalCause::Size {
                    listener_counters.evicted();
                }
            })
            .build();

        Self {
            cache,
            counters,
            max_size_bytes,
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let entry = self.cache.get(key).await;
        self.counters.lookup(entry.is_some());
        Ok(entry)
    }

    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        if !key.is_get() {
            return Err(CacheError::NotCacheable(key.to_string()));
        }

        let size = entry.size_bytes() as u64;
        if size > self.max_size_bytes {
            return Err(CacheError::EntryTooLarge {
                size,
                max: self.max_size_bytes,
            });
        }

        self.cache.insert(key, entry).await;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<CacheKey>, CacheError> {
        let mut keys: Vec<CacheKey> = self.cache.iter().map(|(k, _)| (*k).clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        self.cache.run_pending_tasks().await;
        Ok(self.counters.apply(CacheStats {
            entries: self.cache.entry_count(),
            weighted_bytes: self.cache.weighted_size(),
            capacity_bytes: self.max_size_bytes,
            ..Default::default()
        }))
    }

    async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

/// In-process set of named cache generations
pub struct MemoryCacheStorage {
    generations: RwLock<BTreeMap<String, Arc<MemoryCache>>>,
    current: RwLock<Option<String>>,
    max_size_bytes: u64,
}

impl MemoryCacheStorage {
    /// `max_size_bytes` bounds each generation independently
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            generations: RwLock::new(BTreeMap::new()),
            current: RwLock::new(None),
            max_size_bytes,
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        if let Some(existing) = self.generations.read().get(name) {
            let cache: Arc<dyn Cache> = existing.clone();
            return Ok(cache);
        }

        let mut generations = self.generations.write();
        let cache: Arc<dyn Cache> = generations
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(generation = name, "Creating cache generation");
                Arc::new(MemoryCache::new(self.max_size_bytes))
            })
            .clone();
        Ok(cache)
    }

    async fn get(&self, name: &str) -> Option<Arc<dyn Cache>> {
        let cache: Arc<dyn Cache> = self.generations.read().get(name)?.clone();
        Some(cache)
    }

    fn current(&self) -> Option<String> {
        self.current.read().clone()
    }

    fn set_current(&self, name: &str) {
        *self.current.write() = Some(name.to_string());
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.generations.read().keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let removed = self.generations.write().remove(name);
        match removed {
            Some(cache) => {
                // Handles still held elsewhere must not keep serving the old generation
                cache.clear().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
