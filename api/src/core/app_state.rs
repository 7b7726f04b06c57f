use std::{sync::Arc, time::Duration};

use ai_llm_service::{ChatCompletionService, config_chat_from_env};
use contextor::{ContextorConfig, Orchestrator};
use rag_base::{SearchClient, SearchConfig};
use tracing::info;

use crate::error_handler::AppError;

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Built once at start-up; holds the search and chat clients.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Load shared state from environment variables.
    ///
    /// Fails fast when any required setting is missing or invalid, so the
    /// process never starts in a half-configured state.
    pub fn from_env() -> Result<Self, AppError> {
        let llm_cfg = config_chat_from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let search_cfg = SearchConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let ctx_cfg = ContextorConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;

        let storage = search_cfg.storage.clone();
        let search = SearchClient::new(search_cfg).map_err(|e| AppError::Config(e.to_string()))?;
        let chat = ChatCompletionService::new(llm_cfg).map_err(|e| AppError::Config(e.to_string()))?;

        info!(
            append_reference_links = ctx_cfg.append_reference_links,
            max_ctx_chars = ctx_cfg.max_ctx_chars,
            "orchestrator configured"
        );

        Ok(Self::new(Orchestrator::new(
            Arc::new(search),
            Arc::new(chat),
            storage,
            ctx_cfg,
        )))
    }
}

/// Listener and transport limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: String,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// `API_ADDRESS`, `MAX_BODY_BYTES`, `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, AppError> {
        let address = env_opt("API_ADDRESS").unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());
        let max_body_bytes = env_num("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        let timeout_secs = env_num("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            address,
            max_body_bytes,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_opt(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_num<T: std::str::FromStr + PartialOrd + Default>(k: &str, default: T) -> Result<T, AppError> {
    match env_opt(k) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .ok()
            .filter(|n| *n > T::default())
            .ok_or_else(|| AppError::Config(format!("{k} must be a positive integer, got '{raw}'"))),
    }
}
