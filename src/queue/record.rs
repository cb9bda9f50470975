//! Queued request record (the persisted shape)

use http::Method;
use serde::{Deserialize, Serialize};

use super::error::QueueError;
use crate::http::{Headers, Request};

/// A mutating call captured while offline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Unique, monotonically increasing key
    pub id: u64,
    pub url: String,
    pub method: String,
    pub headers: Headers,
    /// Body snapshot as text
    pub body: String,
    /// Enqueue wall time, milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Failed replay attempts so far
    #[serde(default)]
    pub attempts: u32,
    /// Wall time of the last failed replay, milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<u64>,
}

impl QueuedRequest {
    pub fn from_request(id: u64, request: &Request, timestamp: u64) -> Self {
        Self {
            id,
            url: request.url.clone(),
            method: request.method.as_str().to_string(),
            headers: request.headers.clone(),
            body: String::from_utf8_lossy(&request.body).into_owned(),
            timestamp,
            attempts: 0,
            last_attempt_at: None,
        }
    }

    /// Rebuild the request to re-issue it against the saved URL
    pub fn to_request(&self) -> Result<Request, QueueError> {
        let method =
            Method::from_bytes(self.method.as_bytes()).map_err(|e| QueueError::InvalidRecord {
                id: self.id,
                reason: format!("method '{}': {}", self.method, e),
            })?;

        let mut request = Request::new(method, self.url.clone()).with_body(self.body.clone());
        request.headers = self.headers.clone();
        Ok(request)
    }

    /// Enqueue time as a human-readable UTC timestamp
    pub fn enqueued_at(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.timestamp as i64)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Request {
        Request::new(Method::POST, "/api/v1/observations/")
            .with_header("Content-Type", "application/json")
            .with_header("Authorization", "Bearer abc")
            .with_body(r#"{"code":"8867-4","value":72}"#)
    }

    #[test]
    fn test_from_request_captures_everything() {
        let record = QueuedRequest::from_request(7, &post(), 1_700_000_000_000);
        assert_eq!(record.id, 7);
        assert_eq!(record.method, "POST");
        assert_eq!(record.url, "/api/v1/observations/");
        assert_eq!(record.headers.get("authorization").unwrap(), "Bearer abc");
        assert_eq!(record.body, r#"{"code":"8867-4","value":72}"#);
        assert_eq!(record.attempts, 0);
    }

    #[test]
    fn test_to_request_restores_method_headers_and_body() {
        let original = post();
        let record = QueuedRequest::from_request(1, &original, 0);
        let restored = record.to_request().unwrap();

        assert_eq!(restored.method, Method::POST);
        assert_eq!(restored.url, original.url);
        assert_eq!(restored.headers, original.headers);
        assert_eq!(restored.body, original.body);
    }

    #[test]
    fn test_to_request_rejects_invalid_method() {
        let mut record = QueuedRequest::from_request(3, &post(), 0);
        record.method = "NOT A METHOD".to_string();
        assert!(matches!(
            record.to_request(),
            Err(QueueError::InvalidRecord { id: 3, .. })
        ));
    }

    #[test]
    fn test_persisted_shape() {
        let record = QueuedRequest::from_request(1, &post(), 42);
        let value = serde_json::to_value(&record).unwrap();
        for field in ["id", "url", "method", "headers", "body", "timestamp"] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        assert!(value.get("last_attempt_at").is_none());
    }

    #[test]
    fn test_reads_records_without_retry_bookkeeping() {
        let json = r#"{"id":5,"url":"/x","method":"PUT","headers":{},"body":"","timestamp":1}"#;
        let record: QueuedRequest = serde_json::from_str(json).unwrap();
        assert_eq!(record.attempts, 0);
        assert_eq!(record.last_attempt_at, None);
    }

    #[test]
    fn test_enqueued_at_is_rfc3339() {
        let record = QueuedRequest::from_request(1, &post(), 0);
        assert!(record.enqueued_at().starts_with("1970-01-01T00:00:00"));
    }
}
