use std::{error::Error, sync::Arc, time::Duration};

pub mod error_handler;

pub mod core {
    pub mod app_state;
}

mod routes {
    pub mod ask {
        pub mod ask_ai_route;
        pub mod ask_request;
    }
    pub mod health {
        pub mod health_route;
    }
}

use axum::{
    Router,
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::signal;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::core::app_state::{AppState, ServerConfig};
use crate::error_handler::{AppError, handle_layer_error};
use crate::routes::{ask::ask_ai_route::ask_ai, health::health_route::health};

pub use crate::routes::ask::ask_request::{AskRequest, AskResponse, Reference};

/// Builds the HTTP router with its transport layers.
///
/// The body limit is enforced by the extractor and the timeout is turned into
/// an [`AppError`], so both reject with the usual `{"error": ...}` body.
pub fn build_router(state: Arc<AppState>, max_body_bytes: usize, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/ask-ai", post(ask_ai))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start() -> Result<(), Box<dyn Error>> {
    let server = ServerConfig::from_env()?;
    let state = Arc::new(AppState::from_env()?);

    let app = build_router(state, server.max_body_bytes, server.request_timeout);

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&server.address)
        .await
        .map_err(AppError::Bind)?;
    info!(
        address = %server.address,
        max_body_bytes = server.max_body_bytes,
        request_timeout_secs = server.request_timeout.as_secs(),
        "ask-ai API listening"
    );

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("ask-ai API stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ai_llm_service::{AiLlmError, ChatMessage};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use contextor::{ContextorConfig, Generator, Orchestrator, Retriever};
    use http_body_util::BodyExt;
    use rag_base::{RagBaseError, SearchResult, StorageAccount};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    enum SearchBehavior {
        Hits(Vec<SearchResult>),
        Timeout,
    }

    struct StubSearch {
        behavior: SearchBehavior,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Retriever for StubSearch {
        async fn retrieve(&self, _query: &str) -> Result<Vec<SearchResult>, RagBaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                SearchBehavior::Hits(h) => Ok(h.clone()),
                SearchBehavior::Timeout => Err(RagBaseError::Timeout(Duration::from_secs(30))),
            }
        }
    }

    struct StubChat {
        reply: String,
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Generator for StubChat {
        async fn generate(&self, _system: &str, _turns: &[ChatMessage]) -> Result<String, AiLlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.reply.clone())
        }
    }

    struct Harness {
        app: Router,
        search: Arc<StubSearch>,
        chat: Arc<StubChat>,
    }

    fn chapter3() -> SearchResult {
        SearchResult {
            title: "Chapter 3".into(),
            identifier: "https%3A%2F%2Fexample%2Fmanual.pdf_pages_12".into(),
            content: "Novelty, inventive step and industrial applicability.".into(),
            score: Some(2.5),
        }
    }

    fn harness(behavior: SearchBehavior, reply: &str, delay: Duration, timeout: Duration) -> Harness {
        let search = Arc::new(StubSearch {
            behavior,
            calls: AtomicUsize::new(0),
        });
        let chat = Arc::new(StubChat {
            reply: reply.into(),
            delay,
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(
            search.clone(),
            chat.clone(),
            StorageAccount {
                blob_endpoint: "https://acct.blob.core.windows.net".into(),
                sas: None,
            },
            ContextorConfig::default(),
        );
        let app = build_router(Arc::new(AppState::new(orchestrator)), 1024, timeout);
        Harness { app, search, chat }
    }

    fn default_harness(reply: &str) -> Harness {
        harness(
            SearchBehavior::Hits(vec![chapter3()]),
            reply,
            Duration::ZERO,
            Duration::from_secs(10),
        )
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ask-ai")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn read_json(resp: axum::response::Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let h = default_harness("unused");
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = h.app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await, json!({"status": "ok"}));
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn answers_with_page_level_reference() {
        let h = default_harness("...novelty, inventive step, and industrial application [1].");
        let resp = h
            .app
            .oneshot(post_json(json!({
                "message": "What are the requirements for patentability?",
                "history": []
            })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let v = read_json(resp).await;
        assert!(v["answer"].as_str().unwrap().contains("[1]"));
        assert_eq!(
            v["references"],
            json!([{"index": 1, "title": "Chapter 3", "url": "https://example/manual.pdf#page=12"}])
        );
        assert_eq!(v["history"].as_array().unwrap().len(), 2);
        assert_eq!(v["history"][0]["role"], "user");
        assert_eq!(v["history"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn unknown_marker_stays_literal() {
        let h = default_harness("See [2].");
        let resp = h.app.oneshot(post_json(json!({"message": "q?"}))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = read_json(resp).await;
        assert_eq!(v["answer"], "See [2].");
        assert_eq!(v["references"], json!([]));
    }

    #[tokio::test]
    async fn missing_message_is_400_without_upstream_calls() {
        for body in [json!({}), json!({"message": ""}), json!({"message": "   ", "history": []})] {
            let h = default_harness("unused");
            let resp = h.app.oneshot(post_json(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                read_json(resp).await,
                json!({"error": "Missing 'message' in request body"})
            );
            assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
            assert_eq!(h.chat.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let h = default_harness("unused");
        let req = Request::builder()
            .method("POST")
            .uri("/api/ask-ai")
            .header("content-type", "application/json")
            .body(Body::from("{\"message\": "))
            .unwrap();
        let resp = h.app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn wrong_typed_message_is_400() {
        let h = default_harness("unused");
        let resp = h.app.oneshot(post_json(json!({"message": 7}))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_timeout_is_503_and_skips_generation() {
        let h = harness(
            SearchBehavior::Timeout,
            "unused",
            Duration::ZERO,
            Duration::from_secs(10),
        );
        let resp = h.app.oneshot(post_json(json!({"message": "q?"}))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(read_json(resp).await["error"].is_string());
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_json() {
        let big = serde_json::to_vec(&json!({"message": "x".repeat(4096)})).unwrap();

        // Declared length, as sent by real clients, and an undeclared one.
        for declare_length in [true, false] {
            let h = default_harness("unused");
            let mut builder = Request::builder()
                .method("POST")
                .uri("/api/ask-ai")
                .header("content-type", "application/json");
            if declare_length {
                builder = builder.header("content-length", big.len());
            }
            let req = builder.body(Body::from(big.clone())).unwrap();

            let resp = h.app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
            assert_eq!(
                read_json(resp).await,
                json!({"error": "request body too large"})
            );
            assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn slow_generation_hits_request_timeout() {
        let h = harness(
            SearchBehavior::Hits(vec![chapter3()]),
            "late [1]",
            Duration::from_secs(5),
            Duration::from_millis(100),
        );
        let resp = h.app.oneshot(post_json(json!({"message": "q?"}))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(read_json(resp).await, json!({"error": "request timed out"}));
    }
}
