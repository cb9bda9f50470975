//! Cache error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Only GET requests with a 2xx response are written
    #[error("response for {0} is not cacheable")]
    NotCacheable(String),

    /// Entry larger than the whole generation capacity
    #[error("entry of {size} bytes exceeds generation capacity of {max} bytes")]
    EntryTooLarge { size: u64, max: u64 },
}
