//! Cache key and entry types
//!
//! - `CacheKey`: request identity inside a generation (method + URL)
//! - `CacheEntry`: a stored response plus the time it was written

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::http::{Request, Response};

/// Cache key for identifying cached responses
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    /// HTTP method (only GET responses are ever written)
    pub method: String,
    /// Request URL exactly as issued by the application
    pub url: String,
}

impl CacheKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn from_request(request: &Request) -> Self {
        Self::new(request.method.as_str(), request.url.clone())
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response held by a cache generation
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: Response,
    /// When this entry was written (each refresh overwrites it)
    pub stored_at: SystemTime,
}

impl CacheEntry {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            stored_at: SystemTime::now(),
        }
    }

    /// Approximate footprint: body plus header strings
    pub fn size_bytes(&self) -> usize {
        let headers: usize = self
            .response
            .headers
            .iter()
            .map(|(name, value)| name.len() + value.len())
            .sum();
        self.response.body.len() + headers + std::mem::size_of::<SystemTime>()
    }
}
