//! Default [`HttpClient`] backed by `reqwest`'s blocking client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{HttpClient, HttpRequest, HttpResponse, SendError};
use crate::error::{HarperError, Result};

/// Default timeout for a whole request/response round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking `reqwest` client.
///
/// Clones share one connection pool, so a single instance can serve many
/// sessions and threads.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: Arc<reqwest::blocking::Client>,
}

impl ReqwestClient {
    /// Build a client with the given round-trip timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| HarperError::config_error(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(timeout_secs = timeout.as_secs(), "created HTTP client");

        Ok(Self { inner: Arc::new(client) })
    }

    /// Wrap an already configured `reqwest` client.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { inner: Arc::new(client) }
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, SendError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())?;

        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            headers.append(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
        }

        let response = self
            .inner
            .request(method, &request.url)
            .headers(headers)
            .body(request.body)
            .send()?;

        Ok(HttpResponse::new(response.status().as_u16(), response))
    }
}
