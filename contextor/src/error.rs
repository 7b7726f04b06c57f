//! Typed error for the contextor crate.

use ai_llm_service::AiLlmError;
use rag_base::RagBaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Caller input is missing or malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// The search service failed; no answer is attempted.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] RagBaseError),

    /// The generation service failed.
    #[error("generation failed: {0}")]
    Generation(#[source] AiLlmError),

    /// Startup configuration problem (system prompt file, env knobs).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ContextorError {
    /// `true` when the failing upstream is temporarily unavailable.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ContextorError::Retrieval(e) => e.is_unavailable(),
            ContextorError::Generation(e) => e.is_unavailable(),
            _ => false,
        }
    }
}
