//! Chat-completion config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Required:
//! - `AI_FOUND_ENDPOINT` = chat-completions endpoint
//! - `AI_FOUND_API_KEY`  = key for that endpoint
//!
//! Optional:
//! - `LLM_PROVIDER`     = `azure` (default) or `openai`
//! - `LLM_MODEL`        = model name sent in the request body
//! - `LLM_TEMPERATURE`  = f32 in `0.0..=2.0` (default `0.2`)
//! - `LLM_TOP_P`        = f32 in `0.0..=1.0` (default `1.0`)
//! - `LLM_MAX_TOKENS`   = u32
//! - `LLM_TIMEOUT_SECS` = u64 > 0 (default `60`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_f32, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TOP_P: f32 = 1.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Constructs the grounded-answer chat config.
///
/// # Errors
///
/// - [`crate::error_handler::ConfigError::MissingVar`] if a required variable is absent
/// - [`crate::error_handler::ConfigError::InvalidFormat`] if the endpoint is not http(s)
/// - [`crate::error_handler::ConfigError::InvalidNumber`] / `OutOfRange` for bad knobs
pub fn config_chat_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = must_env("AI_FOUND_ENDPOINT")?;
    validate_http_endpoint("AI_FOUND_ENDPOINT", &endpoint)?;
    let api_key = must_env("AI_FOUND_API_KEY")?;

    let provider = match opt_env("LLM_PROVIDER") {
        Some(p) => p.parse::<LlmProvider>()?,
        None => LlmProvider::AzureOpenAi,
    };

    let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("temperature", temperature, 0.0, 2.0, "expected 0.0..=2.0")?;
    let top_p = env_opt_f32("LLM_TOP_P")?.unwrap_or(DEFAULT_TOP_P);
    validate_range_f32("top_p", top_p, 0.0, 1.0, "expected 0.0..=1.0")?;

    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::OutOfRange {
            field: "timeout_secs",
            detail: "expected > 0",
        }
        .into());
    }

    Ok(LlmModelConfig {
        provider,
        model: opt_env("LLM_MODEL"),
        endpoint,
        api_key,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(temperature),
        top_p: Some(top_p),
        timeout_secs: Some(timeout_secs),
    })
}
