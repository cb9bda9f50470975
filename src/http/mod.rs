//! Request and response model shared by every layer of the worker
//!
//! This module defines:
//! - `Request` / `Response`: the intercepted call and its answer
//! - `Network`: the seam to the real network (transport failure = `Err`)
//! - `Connectivity`: the injected "is the client online" provider
//! - Synthesized responses for offline reads and queued writes

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use url::Url;

mod connectivity;
mod network;

pub use connectivity::{Connectivity, ConnectivityFlag};
pub use network::{Network, NetworkError, ReqwestNetwork};

use crate::constants::{OFFLINE_MESSAGE, QUEUED_MESSAGE};

/// Header map as persisted in the durable queue: plain string pairs
pub type Headers = BTreeMap<String, String>;

/// How the request was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document load
    Navigate,
    /// Everything else (fetch/XHR, scripts, images)
    #[default]
    Subresource,
}

/// An intercepted network call
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Bytes,
    pub mode: RequestMode,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: Bytes::new(),
            mode: RequestMode::Subresource,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// A top-level document load
    pub fn navigate(url: impl Into<String>) -> Self {
        let mut request = Self::get(url);
        request.mode = RequestMode::Navigate;
        request
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Path component of the URL, without query or fragment
    ///
    /// Absolute URLs are reduced to their path; relative URLs are cut at the
    /// first `?` or `#`.
    pub fn path(&self) -> Cow<'_, str> {
        match Url::parse(&self.url) {
            Ok(parsed) => Cow::Owned(parsed.path().to_string()),
            Err(_) => {
                let end = self
                    .url
                    .find(|c| c == '?' || c == '#')
                    .unwrap_or(self.url.len());
                Cow::Borrowed(&self.url[..end])
            }
        }
    }
}

/// A response, either from the network, from a cache generation, or synthesized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build an `application/json` response from any serializable body
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(body)?;
        Ok(Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(encoded))
    }

    /// Success status (2xx); only these are ever written to a cache generation
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// 202 acknowledgement returned for a write queued while offline
    pub fn queued_ack() -> Self {
        Self::synthesized(
            StatusCode::ACCEPTED,
            &QueuedAck {
                status: "queued",
                message: QUEUED_MESSAGE,
                offline: true,
            },
        )
    }

    /// 503 fallback returned for an API read with no network and no cached copy
    pub fn offline_fallback() -> Self {
        Self::synthesized(
            StatusCode::SERVICE_UNAVAILABLE,
            &OfflineFallback {
                error: "offline",
                message: OFFLINE_MESSAGE,
                cached: false,
            },
        )
    }

    fn synthesized<T: Serialize>(status: StatusCode, body: &T) -> Self {
        // Static bodies of plain strings and bools always serialize
        Self::json(status, body).unwrap_or_else(|_| Self::new(status))
    }
}

#[derive(Serialize)]
struct QueuedAck {
    status: &'static str,
    message: &'static str,
    offline: bool,
}

#[derive(Serialize)]
struct OfflineFallback {
    error: &'static str,
    message: &'static str,
    cached: bool,
}
