//! JSON Output Envelope Types
//!
//! This module defines the structured JSON printed by the `harper` CLI.
//! Every invocation prints exactly one envelope to stdout.
//!
//! # Output Contract
//! - Success: `{"ok": true, "operation": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "operation": "...", "error": {"code": "...", "message": "..."}}`

use serde::{Deserialize, Serialize};

use crate::error::HarperError;

/// Success envelope for operation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// CLI operation that was executed (insert, get, sql, ...)
    pub operation: String,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(operation: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, operation: operation.into(), data, meta }
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// CLI operation that was attempted
    pub operation: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(operation: impl Into<String>, error: ErrorInfo) -> Self {
        Self { ok: false, operation: operation.into(), error }
    }

    /// Create error envelope from HarperError
    ///
    /// Remote errors carry their HTTP status and decoded body; partial
    /// failures carry the full mutation result so no identifiers are lost.
    pub fn from_error(operation: impl Into<String>, err: &HarperError) -> Self {
        let mut info = ErrorInfo::new(err.error_code(), err.message());
        info.status = err.status();
        info.detail = match err {
            HarperError::PartialFailure { result } => serde_json::to_value(result).ok(),
            HarperError::Remote { body, .. } => serde_json::from_slice(body).ok(),
            _ => None,
        };
        Self::new(operation, info)
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "REMOTE_ERROR", "PARTIAL_FAILURE")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status for remote errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Structured detail: the server's error body or the partial result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create a new error info
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), status: None, detail: None }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    /// Number of records returned (for reads, None for other operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_returned: Option<usize>,
}

impl Metadata {
    /// Create new metadata with just execution time
    pub fn new(execution_ms: u64) -> Self {
        Self { execution_ms, records_returned: None }
    }

    /// Create new metadata with execution time and record count
    pub fn with_records(execution_ms: u64, records_returned: usize) -> Self {
        Self { execution_ms, records_returned: Some(records_returned) }
    }
}
