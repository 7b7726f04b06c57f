use crate::config::llm_provider::LlmProvider;

/// Configuration for a chat-completion invocation.
///
/// # Fields
///
/// - `provider`: Which backend to use (Azure OpenAI deployment or OpenAI API).
/// - `model`: Optional model identifier. Azure deployments imply the model via the
///   endpoint URL, so it is only sent when set.
/// - `endpoint`: Full deployment URL (Azure) or API base URL (OpenAI).
/// - `api_key`: Key presented to the service.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::AzureOpenAi,
///     model: None,
///     endpoint: "https://foundry.example/openai/deployments/gpt/chat/completions?api-version=2024-10-21".to_string(),
///     api_key: "secret".to_string(),
///     max_tokens: Some(800),
///     temperature: Some(0.2),
///     top_p: Some(1.0),
///     timeout_secs: Some(60),
/// };
/// assert!(cfg.model.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend (Azure OpenAI or OpenAI).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o"`).
    pub model: Option<String>,

    /// Inference endpoint.
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
