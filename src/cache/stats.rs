//! Per-generation usage summary

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of one cache generation
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    /// Sum of entry weights (body plus headers)
    pub weighted_bytes: u64,
    pub capacity_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to stay under capacity
    pub evictions: u64,
}

impl CacheStats {
    /// Share of lookups answered from the generation; None before any lookup
    pub fn hit_ratio(&self) -> Option<f64> {
        match self.hits + self.misses {
            0 => None,
            lookups => Some(self.hits as f64 / lookups as f64),
        }
    }

    /// How full the generation is, 0.0 to 1.0
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        (self.weighted_bytes as f64 / self.capacity_bytes as f64).min(1.0)
    }
}

/// Lookup and eviction counters shared with the moka eviction listener
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    pub fn lookup(&self, found: bool) {
        let counter = if found { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Fill the counter fields of a summary
    pub fn apply(&self, stats: CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            ..stats
        }
    }
}
