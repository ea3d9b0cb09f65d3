//! Transport Executor
//!
//! Owns the HTTP round trip for every command: serialize, POST, validate the
//! status, read the body. All commands go to the same endpoint; the
//! `operation` field inside the body tells the server what to do.
//!
//! # Collaborators
//! - [`HttpClient`]: the injected capability that actually talks to the network.
//!   [`ReqwestClient`] is the default; tests substitute a scripted client.
//! - [`DebugSink`]: receives the pretty-printed request and response bodies
//!   when the session's debug flag is set. It never influences control flow.
//!
//! # Error Classification
//! | Failure | Error |
//! |---|---|
//! | command does not serialize | `Encoding` (nothing sent) |
//! | send fails, no response | `Transport` |
//! | non-2xx status | `Remote` with status and best-effort body |
//! | body read fails on a 2xx | `Transport` with the partial body |
//!
//! No retries happen here. Timeouts are a property of the injected client.

use std::fmt;
use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{HarperError, Result};
use crate::session::Session;

mod http;

pub use http::{ReqwestClient, DEFAULT_TIMEOUT};

/// Boxed error returned by an [`HttpClient`] when no response was obtained
pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound HTTP request handed to an [`HttpClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method, always `POST` for this API
    pub method: &'static str,

    /// Absolute endpoint URL
    pub url: String,

    /// Header name/value pairs in insertion order
    pub headers: Vec<(String, String)>,

    /// Serialized JSON command
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response obtained from an [`HttpClient`]
///
/// The body is a stream; dropping the response releases it.
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body stream
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Create a response from a status and any readable body
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self { status, body: Box::new(body) }
    }

    /// True for 2xx statuses
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse").field("status", &self.status).finish_non_exhaustive()
    }
}

/// HTTP client capability used by the executor
///
/// Implementations must be safe for concurrent use if the same client is
/// shared between sessions issuing calls from several threads.
pub trait HttpClient: Send + Sync {
    /// Send a request and return the response, or an error if none was obtained
    fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, SendError>;
}

/// Direction of a body surfaced to a [`DebugSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("REQUEST"),
            Self::Response => f.write_str("RESPONSE"),
        }
    }
}

/// Observability sink for debug echo of wire bodies
pub trait DebugSink: Send + Sync {
    /// Receive one pretty-printed body
    fn emit(&self, direction: Direction, body: &str);
}

/// Default sink: logs bodies through `tracing` on the `harper::wire` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn emit(&self, direction: Direction, body: &str) {
        tracing::info!(target: "harper::wire", "--- {direction} ---\n{body}");
    }
}

/// Pretty-print a JSON body, falling back to lossy text for non-JSON bytes
#[must_use]
pub fn pretty_json(bytes: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

/// Decode a response body, keeping the raw bytes on failure
pub(crate) fn decode<T: DeserializeOwned>(raw: Vec<u8>) -> Result<T> {
    match serde_json::from_slice(&raw) {
        Ok(value) => Ok(value),
        Err(err) => Err(HarperError::decoding(err, raw)),
    }
}

impl Session {
    /// Execute one command and return the raw response body
    ///
    /// Sends the command as-is; schema defaulting is the caller's business.
    /// The response stream is dropped, and so closed, on every path once it
    /// has been obtained.
    pub fn execute<C: Serialize + ?Sized>(&self, command: &C) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(command).map_err(HarperError::encoding)?;

        if self.debug() {
            self.debug_sink().emit(Direction::Request, &pretty_json(&payload));
        }

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        // Token issuance runs without credentials
        if let Some(token) = self.auth_token().filter(|t| !t.is_empty()) {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let request = HttpRequest {
            method: "POST",
            url: self.endpoint().to_string(),
            headers,
            body: payload,
        };

        debug!(url = %request.url, bytes = request.body.len(), "sending command");

        let mut response = self.http_client().send(request).map_err(|e| {
            warn!(error = %e, "request failed before a response was received");
            HarperError::transport(e.to_string())
        })?;

        let mut body = Vec::new();
        let read = response.body.read_to_end(&mut body);
        let status = response.status;
        let success = response.is_success();
        drop(response);

        if self.debug() {
            self.debug_sink().emit(Direction::Response, &pretty_json(&body));
        }

        if !success {
            warn!(status, "server rejected command");
            return Err(HarperError::remote(status, body));
        }

        if let Err(e) = read {
            warn!(error = %e, bytes_read = body.len(), "response body read failed");
            return Err(HarperError::transport_with_partial(
                format!("failed to read response body: {e}"),
                body,
            ));
        }

        debug!(status, bytes = body.len(), "command completed");
        Ok(body)
    }

    /// Execute one command and decode the response into `T`
    pub fn execute_as<T, C>(&self, command: &C) -> Result<T>
    where
        T: DeserializeOwned,
        C: Serialize + ?Sized,
    {
        decode(self.execute(command)?)
    }
}
