//! Backend collaborator contract
//!
//! Tool handlers never talk HTTP themselves. They describe one request to
//! the observability backend and hand it to a [`Backend`], which either
//! returns the decoded payload or a [`BackendError`].

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// HTTP verb for a backend request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call, relative to the backend root URL
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: HttpMethod,
    /// Path relative to the Grafana root, e.g. `api/search`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl BackendRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Errors from a backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The call exceeded the client's wall-clock timeout
    #[error("Request to {path} timed out after {seconds}s")]
    Timeout { path: String, seconds: u64 },

    /// The backend could not be reached at all
    #[error("Could not reach Grafana: {0}")]
    Unreachable(String),

    /// The backend said it sent JSON but the body did not decode
    #[error("Could not decode Grafana response: {0}")]
    Decode(String),

    /// The request could not be built or sent
    #[error("Grafana request failed: {0}")]
    Request(String),
}

impl BackendError {
    /// HTTP status, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The narrow contract every backend client satisfies
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one request and return the decoded payload
    ///
    /// Successful responses with an empty body decode as `Value::Null`.
    async fn call(&self, request: BackendRequest) -> Result<Value, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_collects_query() {
        let request = BackendRequest::get("api/search")
            .query("query", "cpu")
            .query("limit", 5)
            .query_opt("type", None::<&str>)
            .query_opt("starred", Some(true));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.query,
            vec![
                ("query".to_string(), "cpu".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("starred".to_string(), "true".to_string()),
            ]
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_status_error_prefers_backend_message() {
        let err = BackendError::Status {
            status: 404,
            message: "Dashboard not found".to_string(),
        };

        assert_eq!(err.to_string(), "Dashboard not found (HTTP 404)");
        assert_eq!(err.status(), Some(404));
    }
}
