//! Chat-completion client for Azure OpenAI deployments and the OpenAI API.
//!
//! Minimal, non-streaming client around the chat-completions REST API.
//! The request URL is derived from `LlmModelConfig::endpoint`:
//! - Azure: the endpoint *is* the deployment URL (`.../chat/completions?api-version=...`)
//! - OpenAI: POST {endpoint}/v1/chat/completions
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    chat::ChatMessage,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// Thin client for a chat-completions endpoint.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers), so a
/// single instance can be shared across concurrent requests.
#[derive(Debug)]
pub struct ChatCompletionService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    timeout: Duration,
}

impl ChatCompletionService {
    /// Creates a new [`ChatCompletionService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is empty
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let provider = Provider::from(cfg.provider);

        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::new(provider, ProviderErrorKind::MissingApiKey).into());
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                provider,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        let (name, value) = match cfg.provider {
            LlmProvider::AzureOpenAi => (
                header::HeaderName::from_static("api-key"),
                cfg.api_key.clone(),
            ),
            LlmProvider::OpenAi => (header::AUTHORIZATION, format!("Bearer {}", cfg.api_key)),
        };
        let mut value = header::HeaderValue::from_str(&value).map_err(|e| {
            ProviderError::new(
                provider,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        value.set_sensitive(true);
        headers.insert(name, value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = match cfg.provider {
            LlmProvider::AzureOpenAi => endpoint.to_string(),
            LlmProvider::OpenAi => {
                format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
            }
        };

        info!(
            provider = ?cfg.provider,
            model = cfg.model.as_deref().unwrap_or("<deployment>"),
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "ChatCompletionService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            timeout,
        })
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// `messages` sent upstream: the optional system message first, then `turns`
    /// in order. Mapped options from config: `model`, `temperature`, `top_p`,
    /// `max_tokens`.
    ///
    /// # Errors
    /// - [`AiLlmError::Timeout`] when the configured timeout elapses
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no content is returned
    pub async fn generate(
        &self,
        system: Option<&str>,
        turns: &[ChatMessage],
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let provider = Provider::from(self.cfg.provider);
        let body = ChatCompletionRequest::from_cfg(&self.cfg, system, turns);

        debug!(
            endpoint = %self.cfg.endpoint,
            messages = body.messages.len(),
            has_system = system.is_some(),
            "POST {}", self.url_chat
        );

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, started))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                endpoint = %self.cfg.endpoint,
                latency_ms = started.elapsed().as_millis(),
                "chat completions returned non-success status"
            );

            return Err(ProviderError::new(
                provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) if e.is_timeout() => return Err(AiLlmError::Timeout(self.timeout)),
            Err(e) => {
                error!(
                    error = %e,
                    endpoint = %self.cfg.endpoint,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completions response"
                );
                return Err(ProviderError::new(
                    provider,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::new(provider, ProviderErrorKind::EmptyChoices))?;

        info!(
            endpoint = %self.cfg.endpoint,
            answer_len = content.len(),
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }

    fn transport_error(&self, e: reqwest::Error, started: Instant) -> AiLlmError {
        error!(
            error = %e,
            endpoint = %self.cfg.endpoint,
            timeout = e.is_timeout(),
            connect = e.is_connect(),
            latency_ms = started.elapsed().as_millis(),
            "chat completions request failed"
        );
        if e.is_timeout() {
            AiLlmError::Timeout(self.timeout)
        } else {
            AiLlmError::HttpTransport(e)
        }
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Minimal request body for chat completions (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(
        cfg: &'a LlmModelConfig,
        system: Option<&'a str>,
        turns: &'a [ChatMessage],
    ) -> Self {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(sys) = system {
            messages.push(WireMessage {
                role: "system",
                content: sys,
            });
        }
        messages.extend(turns.iter().map(|t| WireMessage {
            role: t.role.as_str(),
            content: &t.content,
        }));

        Self {
            model: cfg.model.as_deref(),
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Chat message as sent upstream; `role` may be "system".
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn azure_cfg(endpoint: String, timeout_secs: u64) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::AzureOpenAi,
            model: None,
            endpoint,
            api_key: "test-key".into(),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: Some(1.0),
            timeout_secs: Some(timeout_secs),
        }
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = ChatCompletionService::new(azure_cfg("localhost:1".into(), 5)).unwrap_err();
        assert!(matches!(err, AiLlmError::Provider(_)));
    }

    #[test]
    fn rejects_empty_key() {
        let mut cfg = azure_cfg("http://localhost:1/chat".into(), 5);
        cfg.api_key = "  ".into();
        assert!(ChatCompletionService::new(cfg).is_err());
    }

    #[tokio::test]
    async fn sends_system_history_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(json!({
                "temperature": 0.2,
                "messages": [
                    {"role": "system", "content": "be precise"},
                    {"role": "user", "content": "first"},
                    {"role": "assistant", "content": "reply"},
                    {"role": "user", "content": "second"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "grounded [1]"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let svc = ChatCompletionService::new(azure_cfg(format!("{}/chat", server.uri()), 5)).unwrap();
        let turns = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ];
        let out = svc.generate(Some("be precise"), &turns).await.unwrap();
        assert_eq!(out, "grounded [1]");
    }

    #[tokio::test]
    async fn openai_provider_uses_bearer_and_v1_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "hi"}}]
            })))
            .mount(&server)
            .await;

        let mut cfg = azure_cfg(server.uri(), 5);
        cfg.provider = LlmProvider::OpenAi;
        cfg.model = Some("gpt-4o-mini".into());
        let svc = ChatCompletionService::new(cfg).unwrap();
        let out = svc.generate(None, &[ChatMessage::user("x")]).await.unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn rate_limit_is_reported_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let svc = ChatCompletionService::new(azure_cfg(format!("{}/chat", server.uri()), 5)).unwrap();
        let err = svc.generate(None, &[ChatMessage::user("x")]).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn server_error_is_not_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let svc = ChatCompletionService::new(azure_cfg(format!("{}/chat", server.uri()), 5)).unwrap();
        let err = svc.generate(None, &[ChatMessage::user("x")]).await.unwrap_err();
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let svc = ChatCompletionService::new(azure_cfg(format!("{}/chat", server.uri()), 5)).unwrap();
        let err = svc.generate(None, &[ChatMessage::user("x")]).await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::EmptyChoices,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let svc = ChatCompletionService::new(azure_cfg(format!("{}/chat", server.uri()), 1)).unwrap();
        let err = svc.generate(None, &[ChatMessage::user("x")]).await.unwrap_err();
        assert!(matches!(err, AiLlmError::Timeout(_)));
        assert!(err.is_unavailable());
    }
}
