//! Chat-completion client used to generate grounded answers.
//!
//! - [`services::chat_completion_service::ChatCompletionService`] talks to an
//!   Azure OpenAI deployment (or the OpenAI API) with a single non-streaming call.
//! - [`config::default_config::config_chat_from_env`] builds its config from env.
//! - [`chat`] holds the conversation model shared with the rest of the backend.
//! - [`telemetry`] provides the workspace-wide tracing layer.

pub mod chat;
pub mod error_handler;
pub mod telemetry;

pub mod config {
    pub mod default_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod services {
    pub mod chat_completion_service;
}

pub use chat::{ChatMessage, ChatRole};
pub use config::default_config::config_chat_from_env;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use services::chat_completion_service::ChatCompletionService;
