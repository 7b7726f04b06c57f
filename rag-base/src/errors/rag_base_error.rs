//! Unified error type for the rag-base crate.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the search client and identifier decoding.
#[derive(Debug, Error)]
pub enum RagBaseError {
    // ── Configuration / environment ──────────────────────────────────────────
    /// Required environment variable is missing.
    #[error("missing env variable: {key}")]
    EnvMissing { key: String },

    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Search service transport ─────────────────────────────────────────────
    /// Transport error while calling the search service.
    #[error("search transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search call did not finish within the configured timeout.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    /// The search service answered with a non-success status.
    #[error("search service returned HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// The search response body did not have the expected shape.
    #[error("search response decode error: {0}")]
    Decode(String),

    // ── Identifier decoding ─────────────────────────────────────────────────
    /// A result identifier could not be turned into a document URL.
    #[error("cannot decode document identifier '{identifier}': {reason}")]
    Identifier { identifier: String, reason: String },
}

impl RagBaseError {
    /// `true` for failures that mean "search is temporarily unavailable":
    /// timeouts, connection failures, `429` and `503`.
    pub fn is_unavailable(&self) -> bool {
        match self {
            RagBaseError::Timeout(_) => true,
            RagBaseError::Http(e) => e.is_timeout() || e.is_connect(),
            RagBaseError::HttpStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::SERVICE_UNAVAILABLE
            }
            _ => false,
        }
    }
}
