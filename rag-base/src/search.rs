//! Search client: one POST against the index `docs/search` endpoint.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::errors::rag_base_error::RagBaseError;
use crate::structs::rag_base_config::SearchConfig;
use crate::structs::search_result::SearchResult;

/// Thin client for the managed search service.
///
/// Holds a preconfigured `reqwest::Client` (timeout + `api-key` header); build
/// once at start-up and share.
#[derive(Debug)]
pub struct SearchClient {
    client: reqwest::Client,
    cfg: SearchConfig,
    url_search: String,
    timeout: Duration,
}

impl SearchClient {
    /// Creates a client from a validated [`SearchConfig`].
    ///
    /// # Errors
    /// - [`RagBaseError::InvalidConfig`] if the key cannot be used as a header
    /// - [`RagBaseError::Http`] if the HTTP client cannot be built
    pub fn new(cfg: SearchConfig) -> Result<Self, RagBaseError> {
        let timeout = Duration::from_secs(cfg.timeout_secs);

        let mut key = header::HeaderValue::from_str(&cfg.api_key)
            .map_err(|e| RagBaseError::InvalidConfig(format!("invalid SEARCH_KEY: {e}")))?;
        key.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::HeaderName::from_static("api-key"), key);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_search = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            cfg.endpoint.trim_end_matches('/'),
            urlencoding::encode(&cfg.index_name),
            urlencoding::encode(&cfg.api_version)
        );

        info!(
            target: "rag_base::search",
            endpoint = %cfg.endpoint,
            index = %cfg.index_name,
            top_k = cfg.top_k,
            semantic = cfg.semantic_configuration.is_some(),
            timeout_secs = cfg.timeout_secs,
            "SearchClient initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_search,
            timeout,
        })
    }

    /// Runs `query` against the index and returns up to `top_k` passages in
    /// service ranking order.
    ///
    /// Documents without an identifier field are skipped. When `min_score` is
    /// configured, lower-scored passages (or passages with no score) are dropped.
    ///
    /// # Errors
    /// - [`RagBaseError::Timeout`] when the configured timeout elapses
    /// - [`RagBaseError::Http`] for transport failures
    /// - [`RagBaseError::HttpStatus`] for non-2xx responses
    /// - [`RagBaseError::Decode`] when the body is not `{ "value": [...] }`
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RagBaseError> {
        let started = Instant::now();
        let body = SearchRequest {
            search: query,
            top: self.cfg.top_k,
            query_type: self.cfg.semantic_configuration.as_ref().map(|_| "semantic"),
            semantic_configuration: self.cfg.semantic_configuration.as_deref(),
        };

        debug!(
            target: "rag_base::search",
            index = %self.cfg.index_name,
            query_len = query.len(),
            top = self.cfg.top_k,
            "POST {}", self.url_search
        );

        let resp = self
            .client
            .post(&self.url_search)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, started))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                target: "rag_base::search",
                %status,
                url = %self.url_search,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "search returned non-success status"
            );
            return Err(RagBaseError::HttpStatus {
                status,
                url: self.url_search.clone(),
                snippet,
            });
        }

        let out: SearchResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) if e.is_timeout() => return Err(RagBaseError::Timeout(self.timeout)),
            Err(e) => {
                error!(
                    target: "rag_base::search",
                    error = %e,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode search response"
                );
                return Err(RagBaseError::Decode(format!(
                    "serde error: {e}; expected `value[]`"
                )));
            }
        };

        let total = out.value.len();
        let mut results: Vec<SearchResult> = out
            .value
            .iter()
            .filter_map(|doc| {
                let hit = SearchResult::from_document(doc, &self.cfg.fields);
                if hit.is_none() {
                    warn!(
                        target: "rag_base::search",
                        id_field = %self.cfg.fields.id,
                        "search document without identifier skipped"
                    );
                }
                hit
            })
            .collect();

        if let Some(min_s) = self.cfg.min_score {
            results.retain(|r| r.score.is_some_and(|s| s >= min_s));
        }
        results.truncate(self.cfg.top_k);

        info!(
            target: "rag_base::search",
            returned = total,
            kept = results.len(),
            latency_ms = started.elapsed().as_millis(),
            "search completed"
        );

        Ok(results)
    }

    fn transport_error(&self, e: reqwest::Error, started: Instant) -> RagBaseError {
        error!(
            target: "rag_base::search",
            error = %e,
            timeout = e.is_timeout(),
            connect = e.is_connect(),
            latency_ms = started.elapsed().as_millis(),
            "search request failed"
        );
        if e.is_timeout() {
            RagBaseError::Timeout(self.timeout)
        } else {
            RagBaseError::Http(e)
        }
    }
}

/// Request body for `docs/search`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    semantic_configuration: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<Map<String, Value>>,
}

fn make_snippet(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(300).collect()
}
