//! Session Context
//!
//! A [`Session`] bundles everything a call needs: endpoint, HTTP client,
//! bearer token, default schema and the debug-echo flag. It is immutable;
//! "rotating" a token produces a new session and leaves in-flight calls on
//! the old one untouched. Cloning is cheap, the client and sink are shared.
//!
//! # Endpoint Resolution
//! Each session carries its own endpoint. When the builder is not given one:
//! 1. The process-wide default set once with [`set_default_endpoint`]
//! 2. The `HARPER_URL` environment variable
//! 3. [`DEFAULT_ENDPOINT`]
//!
//! Sessions targeting different servers from concurrent threads must set
//! their endpoints explicitly. The process-wide value is a convenience for
//! single-server programs and cannot be changed once set.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use url::Url;

use crate::error::{HarperError, Result};
use crate::transport::{DebugSink, HttpClient, ReqwestClient, TracingSink, DEFAULT_TIMEOUT};

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9925";

/// Environment variable consulted for the endpoint
pub const ENDPOINT_ENV: &str = "HARPER_URL";

static PROCESS_ENDPOINT: OnceLock<String> = OnceLock::new();

/// Set the process-wide default endpoint
///
/// Can be called once per process; later calls fail with a configuration
/// error instead of silently redirecting sessions that are already running.
pub fn set_default_endpoint(url: impl Into<String>) -> Result<()> {
    let url = url.into();
    Url::parse(&url)
        .map_err(|e| HarperError::config_error(format!("Invalid endpoint '{url}': {e}")))?;

    PROCESS_ENDPOINT.set(url).map_err(|rejected| {
        HarperError::config_error(format!(
            "Default endpoint already set; cannot change it to '{rejected}'"
        ))
    })
}

/// Endpoint a builder falls back to when none is given
#[must_use]
pub fn default_endpoint() -> String {
    if let Some(url) = PROCESS_ENDPOINT.get() {
        return url.clone();
    }
    std::env::var(ENDPOINT_ENV)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

/// Caller-held configuration reused across calls
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn HttpClient>,
    sink: Arc<dyn DebugSink>,
    endpoint: Url,
    auth_token: Option<String>,
    schema: Option<String>,
    debug: bool,
}

impl Session {
    /// Create a new session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Endpoint every command is posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Bearer token, if any
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Default schema applied to mutation, read and bulk-load commands
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Whether wire bodies are echoed to the debug sink
    pub const fn debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn http_client(&self) -> &dyn HttpClient {
        self.client.as_ref()
    }

    pub(crate) fn debug_sink(&self) -> &dyn DebugSink {
        self.sink.as_ref()
    }

    /// Same session with a different bearer token
    #[must_use]
    pub fn with_auth_token(&self, token: impl Into<String>) -> Self {
        Self { auth_token: non_empty(token.into()), ..self.clone() }
    }

    /// Same session without a bearer token
    #[must_use]
    pub fn without_auth_token(&self) -> Self {
        Self { auth_token: None, ..self.clone() }
    }

    /// Same session with a different default schema
    #[must_use]
    pub fn with_schema(&self, schema: impl Into<String>) -> Self {
        Self { schema: non_empty(schema.into()), ..self.clone() }
    }

    /// Fill an unset command schema from the session default
    ///
    /// Runs before the command is sent, so the caller sees the filled value
    /// afterwards.
    pub(crate) fn resolve_schema(&self, schema: &mut Option<String>) {
        let unset = schema.as_deref().map_or(true, str::is_empty);
        if unset {
            *schema = self.schema.clone();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("schema", &self.schema)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`Session`]
pub struct SessionBuilder {
    endpoint: Option<String>,
    auth_token: Option<String>,
    schema: Option<String>,
    debug: bool,
    timeout: Duration,
    client: Option<Arc<dyn HttpClient>>,
    sink: Option<Arc<dyn DebugSink>>,
}

impl SessionBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            endpoint: None,
            auth_token: None,
            schema: None,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            client: None,
            sink: None,
        }
    }

    /// Set the endpoint URL
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Set the bearer token; an empty token means none
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = non_empty(token.into());
        self
    }

    /// Set the default schema; an empty schema means none
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = non_empty(schema.into());
        self
    }

    /// Echo request and response bodies to the debug sink
    ///
    /// Bodies are echoed verbatim, credentials included.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Set the round-trip timeout of the default HTTP client
    ///
    /// Ignored when a custom client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom HTTP client
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Use a custom debug sink
    pub fn debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the session
    pub fn build(self) -> Result<Session> {
        let raw = self.endpoint.unwrap_or_else(default_endpoint);
        let endpoint = Url::parse(&raw)
            .map_err(|e| HarperError::config_error(format!("Invalid endpoint '{raw}': {e}")))?;

        let client = match self.client {
            Some(client) => client,
            None => Arc::new(ReqwestClient::new(self.timeout)?),
        };

        Ok(Session {
            client,
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            endpoint,
            auth_token: self.auth_token,
            schema: self.schema,
            debug: self.debug,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpRequest, HttpResponse, SendError};

    struct NullClient;

    impl HttpClient for NullClient {
        fn send(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, SendError> {
            Ok(HttpResponse::new(200, std::io::empty()))
        }
    }

    fn builder() -> SessionBuilder {
        Session::builder().http_client(Arc::new(NullClient))
    }

    #[test]
    fn test_builder_with_endpoint() {
        let session = builder().endpoint("https://harper.example.com:9925").build().unwrap();
        assert_eq!(session.endpoint().as_str(), "https://harper.example.com:9925/");
        assert!(session.auth_token().is_none());
        assert!(session.schema().is_none());
        assert!(!session.debug());
    }

    #[test]
    fn test_builder_rejects_invalid_endpoint() {
        let err = builder().endpoint("not a url").build().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.message().contains("not a url"));
    }

    #[test]
    fn test_builder_builds_default_client() {
        let session = Session::builder().endpoint("http://localhost:9925").build();
        assert!(session.is_ok());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let session =
            builder().endpoint("http://localhost:9925").auth_token("").schema("").build().unwrap();
        assert!(session.auth_token().is_none());
        assert!(session.schema().is_none());
    }

    #[test]
    fn test_token_rotation_leaves_original_untouched() {
        let original = builder()
            .endpoint("http://localhost:9925")
            .auth_token("first")
            .schema("dev")
            .build()
            .unwrap();

        let rotated = original.with_auth_token("second");
        assert_eq!(original.auth_token(), Some("first"));
        assert_eq!(rotated.auth_token(), Some("second"));
        assert_eq!(rotated.schema(), Some("dev"));

        assert!(original.without_auth_token().auth_token().is_none());
        assert_eq!(original.with_schema("prod").schema(), Some("prod"));
    }

    #[test]
    fn test_resolve_schema_fills_unset() {
        let session =
            builder().endpoint("http://localhost:9925").schema("dev").build().unwrap();

        let mut unset = None;
        session.resolve_schema(&mut unset);
        assert_eq!(unset.as_deref(), Some("dev"));

        let mut empty = Some(String::new());
        session.resolve_schema(&mut empty);
        assert_eq!(empty.as_deref(), Some("dev"));

        let mut explicit = Some("prod".to_string());
        session.resolve_schema(&mut explicit);
        assert_eq!(explicit.as_deref(), Some("prod"));
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let session = builder()
            .endpoint("http://localhost:9925")
            .auth_token("super-secret")
            .build()
            .unwrap();
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
