//! HTTP transport for the bare metal provisioning API.

use async_trait::async_trait;
use baremetal_core::{BaremetalError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Header carrying the negotiated API microversion (`X-OpenStack-Ironic-API-Version`).
pub const API_VERSION_HEADER: &str = "x-openstack-ironic-api-version";

const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// The HTTP boundary used by every manager.
///
/// `url` is a path plus query string relative to the service endpoint, for
/// example `/v1/portgroups/detail?limit=10`. Implementations fail with
/// [`BaremetalError::Http`] on any non-2xx status and map an empty body to
/// `None`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn json_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)>;
}

/// Normalize a server URL by removing trailing slashes.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Pull the human readable fault out of an error body.
///
/// The service wraps errors as `{"error_message": "<json>"}` where the inner
/// document carries a `faultstring`. Some proxies return the inner document
/// directly.
fn extract_error_message(text: &str) -> Option<String> {
    let body: Value = serde_json::from_str(text).ok()?;
    let fault = |v: &Value| v.get("faultstring").and_then(Value::as_str).map(String::from);

    match body.get("error_message") {
        Some(Value::String(inner)) => match serde_json::from_str::<Value>(inner) {
            Ok(inner) => fault(&inner).or_else(|| Some(inner.to_string())),
            Err(_) => Some(inner.clone()),
        },
        Some(inner) if inner.is_object() => fault(inner),
        _ => fault(&body),
    }
}

/// reqwest-backed [`Transport`].
///
/// Connection-level failures can be retried with a linearly growing delay
/// (`retry_delay * (attempt + 1)`). HTTP error statuses are never retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpClient {
    /// Create a client for `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of the service (e.g., "http://localhost:6385")
    /// * `api_version` - Value sent in the API version header
    /// * `token` - Optional auth token
    /// * `timeout_secs` - Request timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a header value is not valid or the
    /// HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        api_version: &str,
        token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(API_VERSION_HEADER, header_value(api_version, "API version")?);
        if let Some(token) = token {
            headers.insert(AUTH_TOKEN_HEADER, header_value(token, "auth token")?);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("baremetalctl/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| BaremetalError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: normalize_url(endpoint),
            max_retries: 0,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Retry connection failures up to `max_retries` times.
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Turn a response into headers plus an optional JSON body.
    async fn handle_response(
        response: Response,
        url: &str,
    ) -> Result<(HeaderMap, Option<Value>)> {
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| {
            BaremetalError::Connection(format!("Failed to read response body from {}: {}", url, e))
        })?;
        debug!(%status, url, "response");

        if !status.is_success() {
            let message = extract_error_message(&text).unwrap_or_else(|| match status {
                StatusCode::NOT_FOUND => format!("Resource {} not found", url),
                StatusCode::UNAUTHORIZED => format!("Unauthorized access to {}", url),
                StatusCode::FORBIDDEN => format!("Access forbidden to {}", url),
                StatusCode::SERVICE_UNAVAILABLE => format!("Service unavailable at {}", url),
                _ => format!("Request to {} failed: {}", url, text),
            });
            return Err(BaremetalError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok((headers, None));
        }
        let body = serde_json::from_str(&text).map_err(|e| {
            BaremetalError::Serialization(format!("Failed to parse JSON response from {}: {}", url, e))
        })?;
        Ok((headers, Some(body)))
    }

    /// Send a request, retrying only on connection-level failures.
    async fn execute_with_retry<F>(
        &self,
        url: &str,
        request_fn: F,
    ) -> Result<(HeaderMap, Option<Value>)>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match request_fn().send().await {
                Ok(response) => return Self::handle_response(response, url).await,
                Err(e) => {
                    let should_retry = e.is_connect() || e.is_timeout() || e.is_request();
                    if attempt < self.max_retries && should_retry {
                        debug!(url, attempt, "retrying after connection failure");
                        tokio::time::sleep(self.retry_delay * (attempt + 1)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(BaremetalError::Connection(format!(
                        "Failed to reach {} after {} attempts: {}",
                        url,
                        attempt + 1,
                        e
                    )));
                }
            }
        }
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| BaremetalError::Config(format!("Invalid {} header value", what)))
}

#[async_trait]
impl Transport for HttpClient {
    async fn json_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)> {
        let full_url = format!("{}{}", self.endpoint, url);
        debug!(%method, url, "request");

        self.execute_with_retry(url, || {
            let request = self.client.request(method.clone(), &full_url);
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        })
        .await
    }
}
