//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout the Harper client.
//! Every error is returned to the immediate caller: nothing here retries,
//! swallows, or terminates the process.
//!
//! # Error Categories
//! - `Encoding`: Command could not be serialized (nothing was sent)
//! - `Transport`: Connection failure, timeout, or response body read failure
//! - `Remote`: Non-success HTTP status returned by the server
//! - `Decoding`: Response body did not match the expected result shape
//! - `PartialFailure`: Mutation succeeded on the wire but skipped some records
//! - `Config`: Session or profile configuration errors
//! - `InvalidInput`: Malformed input handed to a convenience operation or the CLI

use thiserror::Error;

use crate::response::MutationResult;

/// Main error type for Harper operations
#[derive(Error, Debug)]
pub enum HarperError {
    /// Command could not be serialized to JSON; no request was sent
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Network failure, or the response body could not be read to the end
    #[error("Transport failed: {message}")]
    Transport {
        message: String,
        /// Bytes read before the failure, when a response was obtained
        partial_body: Option<Vec<u8>>,
    },

    /// Server answered with a non-success HTTP status
    #[error("Remote error (HTTP {status}): {}", String::from_utf8_lossy(.body))]
    Remote { status: u16, body: Vec<u8> },

    /// Response body could not be decoded into the expected shape
    #[error("Decoding failed: {source}")]
    Decoding {
        #[source]
        source: serde_json::Error,
        /// The undecodable response body, kept for inspection
        raw: Vec<u8>,
    },

    /// Mutation transported and decoded, but the server skipped some records
    #[error("Partial failure: {} record(s) skipped", .result.skipped_hashes.len())]
    PartialFailure { result: Box<MutationResult> },

    /// Configuration error (invalid endpoint, profile not found, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HarperError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "ENCODING_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Remote { .. } => "REMOTE_ERROR",
            Self::Decoding { .. } => "DECODING_ERROR",
            Self::PartialFailure { .. } => "PARTIAL_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of a remote rejection, if this is one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response bytes attached to the error, if any
    ///
    /// Remote and decoding errors always carry the body; transport errors
    /// carry whatever was read before the failure.
    #[must_use]
    pub fn raw_body(&self) -> Option<&[u8]> {
        match self {
            Self::Remote { body, .. } => Some(body.as_slice()),
            Self::Decoding { raw, .. } => Some(raw.as_slice()),
            Self::Transport { partial_body, .. } => partial_body.as_deref(),
            _ => None,
        }
    }

    /// The decoded mutation result of a partial failure
    #[must_use]
    pub fn partial_result(&self) -> Option<&MutationResult> {
        match self {
            Self::PartialFailure { result } => Some(result.as_ref()),
            _ => None,
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl std::fmt::Display) -> Self {
        Self::Encoding(message.to_string())
    }

    /// Create a transport error with no response body
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), partial_body: None }
    }

    /// Create a transport error for a body read that failed midway
    pub fn transport_with_partial(message: impl Into<String>, partial_body: Vec<u8>) -> Self {
        Self::Transport { message: message.into(), partial_body: Some(partial_body) }
    }

    /// Create a remote error from a status and the best-effort body
    pub fn remote(status: u16, body: Vec<u8>) -> Self {
        Self::Remote { status, body }
    }

    /// Create a decoding error, keeping the raw bytes
    pub fn decoding(source: serde_json::Error, raw: Vec<u8>) -> Self {
        Self::Decoding { source, raw }
    }

    /// Create a partial failure from a decoded mutation result
    pub fn partial_failure(result: MutationResult) -> Self {
        Self::PartialFailure { result: Box::new(result) }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result type alias for Harper operations
pub type Result<T> = std::result::Result<T, HarperError>;
