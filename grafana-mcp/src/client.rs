//! HTTP backend client for Grafana

use std::time::Duration;

use async_trait::async_trait;
use grafana_mcp_core::{
    Backend, BackendConfig, BackendError, BackendRequest, Credentials, HttpMethod, TlsConfig,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;

use crate::error::{McpError, McpResult};
use crate::SERVER_VERSION;

/// Talks to one Grafana instance over HTTP
///
/// Owns a pooled `reqwest::Client`; clone the surrounding `Arc` rather than
/// the client itself.
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    timeout: Duration,
    debug: bool,
}

impl GrafanaClient {
    pub fn new(config: &BackendConfig) -> McpResult<Self> {
        let base_url = Url::parse(&format!("{}/", config.url.trim_end_matches('/')))
            .map_err(|e| McpError::Client(format!("invalid Grafana URL: {}", e)))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(format!("mcp-grafana/{}", SERVER_VERSION))
            .timeout(config.timeout);
        if let Some(tls) = &config.tls {
            builder = apply_tls(builder, tls)?;
        }
        let http = builder
            .build()
            .map_err(|e| McpError::Client(e.to_string()))?;

        tracing::info!(
            url = %config.redacted_url(),
            credentials = config.credentials.kind(),
            tls = config.tls.is_some(),
            "Using Grafana backend"
        );
        tracing::debug!(incident_api = %config.incident_url(), "Incident plugin API");

        Ok(Self {
            http,
            base_url,
            credentials: config.credentials.clone(),
            timeout: config.timeout,
            debug: config.debug,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::Request(format!("invalid path '{}': {}", path, e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Credentials::ServiceAccountToken(token) | Credentials::ApiKey(token) => {
                request.bearer_auth(token)
            }
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
            Credentials::OnBehalfOf {
                access_token,
                id_token,
            } => request
                .header("X-Access-Token", access_token)
                .header("X-Grafana-Id", id_token),
        }
    }
}

#[async_trait]
impl Backend for GrafanaClient {
    async fn call(&self, request: BackendRequest) -> Result<Value, BackendError> {
        let url = self.url_for(&request.path)?;
        if self.debug {
            tracing::debug!(method = %request.method, path = %request.path, query = ?request.query, "Grafana request");
        }

        let mut builder = self.http.request(to_method(request.method), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| self.classify(e, &request.path))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(e, &request.path))?;

        if self.debug {
            tracing::debug!(status = status.as_u16(), bytes = body.len(), "Grafana response");
        }

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        decode_body(&body, is_json)
    }
}

impl GrafanaClient {
    fn classify(&self, err: reqwest::Error, path: &str) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                path: path.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            BackendError::Unreachable(err.to_string())
        } else if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Request(err.to_string())
        }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn apply_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsConfig,
) -> McpResult<reqwest::ClientBuilder> {
    if let (Some(cert_file), Some(key_file)) = (&tls.cert_file, &tls.key_file) {
        let mut pem = std::fs::read(cert_file)
            .map_err(|e| McpError::Tls(format!("reading {}: {}", cert_file.display(), e)))?;
        pem.push(b'\n');
        pem.extend(
            std::fs::read(key_file)
                .map_err(|e| McpError::Tls(format!("reading {}: {}", key_file.display(), e)))?,
        );
        let identity =
            reqwest::Identity::from_pem(&pem).map_err(|e| McpError::Tls(e.to_string()))?;
        builder = builder.identity(identity);
    }

    if let Some(ca_file) = &tls.ca_file {
        let pem = std::fs::read(ca_file)
            .map_err(|e| McpError::Tls(format!("reading {}: {}", ca_file.display(), e)))?;
        let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| McpError::Tls(e.to_string()))?;
        builder = builder.add_root_certificate(cert);
    }

    if tls.skip_verify {
        tracing::warn!("TLS certificate verification is disabled for Grafana requests");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

/// Best human-readable message for a failed response
///
/// Grafana's own `message` (or `error`) field wins, then the raw body,
/// then the status reason.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        let supplied = ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty());
        if let Some(message) = supplied {
            return message.to_string();
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn decode_body(body: &[u8], is_json: bool) -> Result<Value, BackendError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    if is_json {
        return serde_json::from_slice(body).map_err(|e| BackendError::Decode(e.to_string()));
    }
    Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
}
