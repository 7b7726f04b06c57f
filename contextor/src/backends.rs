//! Seams between the orchestrator and the external services.
//!
//! The production implementations are the HTTP clients from `rag-base` and
//! `ai-llm-service`; tests plug in deterministic stubs.

use ai_llm_service::{AiLlmError, ChatCompletionService, ChatMessage};
use async_trait::async_trait;
use rag_base::{RagBaseError, SearchClient, SearchResult};

/// Retrieves ranked passages for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, RagBaseError>;
}

/// Produces a single completion for a system prompt and ordered turns.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, turns: &[ChatMessage]) -> Result<String, AiLlmError>;
}

#[async_trait]
impl Retriever for SearchClient {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, RagBaseError> {
        self.search(query).await
    }
}

#[async_trait]
impl Generator for ChatCompletionService {
    async fn generate(&self, system: &str, turns: &[ChatMessage]) -> Result<String, AiLlmError> {
        ChatCompletionService::generate(self, Some(system), turns).await
    }
}
