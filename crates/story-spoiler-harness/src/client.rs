// crates/story-spoiler-harness/src/client.rs
// ============================================================================
// Module: API Client
// Description: HTTP client wrapper with base URL and bearer credential.
// Purpose: Issue JSON requests and return status, headers, and body text.
// Dependencies: reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! [`ApiClient`] joins request paths onto a configured base URL, attaches the
//! bearer token supplied at construction, and returns every HTTP response
//! (including 4xx/5xx) as an [`ApiResponse`]. Only transport failures are
//! errors. Response bodies are read with a hard byte limit and redirects are
//! never followed. No retries are attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;
use std::time::Instant;

use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::events::RequestEvent;
use crate::events::SharedEventSink;
use crate::events::elapsed_millis;
use crate::events::now_millis;
use crate::secret::Secret;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum response body size accepted by the harness.
pub const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// HTTP methods supported by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns the canonical method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Converts to the reqwest method type.
    const fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client errors.
///
/// # Invariants
/// - HTTP error statuses are not errors; they are returned as responses.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client construction or URL error.
    #[error("client config error: {0}")]
    Config(String),
    /// Transport error (connect, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),
    /// Response size exceeds limits.
    #[error("response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
}

/// Response returned by [`ApiClient::execute`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
}

impl ApiResponse {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client bound to one base URL and optional bearer token.
#[derive(Clone)]
pub struct ApiClient {
    /// Base URL requests are joined onto.
    base_url: Url,
    /// Underlying connection pool.
    client: Client,
    /// Token sent as `Authorization: Bearer`.
    bearer_token: Option<Secret>,
    /// Event destination.
    events: SharedEventSink,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &self.bearer_token)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds an unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        events: SharedEventSink,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            bearer_token: None,
            events,
        })
    }

    /// Attaches a bearer token to every subsequent request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: Secret) -> Self {
        self.bearer_token = Some(token);
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a request path against the base URL.
    ///
    /// Leading slashes are ignored and each segment is percent-encoded, so
    /// `"api/Story/All"` and `"/api/Story/All"` address the same endpoint and
    /// any path prefix on the base URL is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the base URL cannot carry a path.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Config("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Sends a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an oversized body.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let started = Instant::now();
        let result = self.send(method, path, body).await;
        let latency_ms = elapsed_millis(started);
        let event = match &result {
            Ok(response) => RequestEvent {
                event: "request_completed",
                timestamp_ms: now_millis(),
                method,
                path: path.to_string(),
                status: Some(response.status.as_u16()),
                response_bytes: response.body.len(),
                latency_ms,
                error: None,
            },
            Err(err) => RequestEvent {
                event: "request_failed",
                timestamp_ms: now_millis(),
                method,
                path: path.to_string(),
                status: None,
                response_bytes: 0,
                latency_ms,
                error: Some(err.to_string()),
            },
        };
        self.events.record_request(&event);
        result
    }

    /// Performs the HTTP exchange.
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.endpoint(path)?;
        let mut request = self.client.request(method.to_reqwest(), url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response =
            request.send().await.map_err(|err| ClientError::Transport(err.to_string()))?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = read_body_with_limit(response, MAX_RESPONSE_BYTES).await?;
        Ok(ApiResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a response body while enforcing a hard byte limit.
async fn read_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ClientError> {
    let mut body = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| ClientError::Transport(err.to_string()))?
    {
        let next_total = body.len().saturating_add(chunk.len());
        if next_total > limit {
            return Err(ClientError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
