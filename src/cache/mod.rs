// Cache module
//
// Named cache generations (one "current", the rest eviction candidates) and
// the strategy engine that serves intercepted reads from them.

pub mod config;
pub mod entry;
pub mod error;
pub mod memory;
pub mod stats;
pub mod strategy;
pub mod traits;

pub use config::CacheConfig;
pub use entry::{CacheEntry, CacheKey};
pub use error::CacheError;
pub use memory::{MemoryCache, MemoryCacheStorage};
pub use stats::CacheStats;
pub use strategy::{Generation, StrategyEngine};
pub use traits::{Cache, CacheStorage};
