use std::str::FromStr;

use crate::error_handler::{ConfigError, Provider};

/// Represents the chat-completion backend the service talks to.
///
/// Both speak the OpenAI chat-completions wire format; they differ in how the
/// endpoint is addressed and how the key is presented.
///
/// - [`LlmProvider::AzureOpenAi`]: the endpoint is the full deployment URL
///   (including `api-version`), the key goes into the `api-key` header.
/// - [`LlmProvider::OpenAi`]: the endpoint is a base URL, `/v1/chat/completions`
///   is appended, the key is sent as a Bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Azure AI Foundry / Azure OpenAI deployment.
    AzureOpenAi,
    /// OpenAI-compatible public API.
    OpenAi,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" | "azure_openai" | "foundry" => Ok(LlmProvider::AzureOpenAi),
            "openai" => Ok(LlmProvider::OpenAi),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl From<LlmProvider> for Provider {
    fn from(p: LlmProvider) -> Self {
        match p {
            LlmProvider::AzureOpenAi => Provider::AzureOpenAi,
            LlmProvider::OpenAi => Provider::OpenAi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!("Azure".parse::<LlmProvider>().unwrap(), LlmProvider::AzureOpenAi);
        assert_eq!("foundry".parse::<LlmProvider>().unwrap(), LlmProvider::AzureOpenAi);
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert!("ollama".parse::<LlmProvider>().is_err());
    }
}
