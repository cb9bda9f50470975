//! Network seam
//!
//! Every fetch the worker performs (live reads, background refreshes,
//! precaching and replay) goes through `Network`. A transport-level failure
//! is an `Err`; any HTTP status, including 4xx/5xx, is an `Ok`.

use async_trait::async_trait;
use http::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::{Headers, Request, Response};
use crate::config::NetworkConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl NetworkError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Unreachable(err.to_string())
        }
    }
}

/// A fetch-like network call
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Production network backed by reqwest
///
/// Relative URLs (the form the application issues) are resolved against the
/// configured origin. The client timeout is the only timeout in the system.
pub struct ReqwestNetwork {
    client: reqwest::Client,
    origin: Url,
}

impl ReqwestNetwork {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let origin = Url::parse(origin)
            .map_err(|e| NetworkError::InvalidRequest(format!("origin '{}': {}", origin, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NetworkError::from_reqwest)?;

        Ok(Self { client, origin })
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self, NetworkError> {
        Self::new(
            &config.origin,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Resolve a request URL against the origin (absolute URLs pass through)
    pub fn resolve(&self, url: &str) -> Result<Url, NetworkError> {
        self.origin
            .join(url)
            .map_err(|e| NetworkError::InvalidRequest(format!("url '{}': {}", url, e)))
    }
}

#[async_trait]
impl Network for ReqwestNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = self.resolve(&request.url)?;
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.to_vec());
        }

        let upstream = builder.send().await.map_err(NetworkError::from_reqwest)?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        let headers: Headers = upstream
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = upstream.bytes().await.map_err(NetworkError::from_reqwest)?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            "Network fetch completed"
        );

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_url_against_origin() {
        let network = ReqwestNetwork::new("https://ehr.example.org", Duration::from_secs(5)).unwrap();
        let url = network.resolve("/api/v1/patients/").unwrap();
        assert_eq!(url.as_str(), "https://ehr.example.org/api/v1/patients/");
    }

    #[test]
    fn test_resolve_absolute_url_passes_through() {
        let network = ReqwestNetwork::new("https://ehr.example.org", Duration::from_secs(5)).unwrap();
        let url = network.resolve("https://cdn.example.org/app.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.org/app.js");
    }

    #[test]
    fn test_rejects_invalid_origin() {
        let result = ReqwestNetwork::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(NetworkError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        // Port 9 (discard) on localhost is closed in test environments
        let network = ReqwestNetwork::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = network.fetch(&Request::get("/")).await;
        assert!(matches!(
            result,
            Err(NetworkError::Unreachable(_)) | Err(NetworkError::Timeout)
        ));
    }
}
