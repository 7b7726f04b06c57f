use axum::{
    BoxError, Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("{0}")]
    BadRequest(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("request timed out")]
    RequestTimeout,

    // --- Upstream ---
    /// Upstream timed out, throttled or refused the connection.
    #[error("{0}")]
    Unavailable(String),

    /// Upstream answered with an unexpected failure.
    #[error("{0}")]
    BadGateway(String),

    /// Detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,

            // upstream
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,

            // 5xx
            AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller.
    fn public_message(&self) -> String {
        match self {
            AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Extractor failures: malformed JSON, wrong content type, wrong field types.
impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

/// Errors raised by the middleware stack (`HandleErrorLayer`).
pub async fn handle_layer_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::RequestTimeout
    } else {
        AppError::Internal(err.to_string())
    }
}

impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        let unavailable = err.is_unavailable();
        match err {
            ContextorError::InvalidRequest(msg) => AppError::BadRequest(msg),
            ContextorError::Retrieval(e) if unavailable => {
                error!(error = %e, "search service unavailable");
                AppError::Unavailable("The search service is temporarily unavailable".into())
            }
            ContextorError::Retrieval(e) => {
                error!(error = %e, "search service failed");
                AppError::BadGateway("The search service returned an error".into())
            }
            ContextorError::Generation(e) if unavailable => {
                error!(error = %e, "generation service unavailable");
                AppError::Unavailable("The generation service is temporarily unavailable".into())
            }
            ContextorError::Generation(e) => {
                error!(error = %e, "generation service failed");
                AppError::BadGateway("The generation service returned an error".into())
            }
            ContextorError::Config(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ai_llm_service::AiLlmError;
    use http_body_util::BodyExt;
    use rag_base::RagBaseError;

    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_request_is_400_with_message() {
        let err: AppError = ContextorError::InvalidRequest("Missing 'message' in request body".into()).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"error": "Missing 'message' in request body"})
        );
    }

    #[test]
    fn upstream_timeouts_are_503_and_rejections_502() {
        let timeout: AppError =
            ContextorError::Retrieval(RagBaseError::Timeout(Duration::from_secs(30))).into();
        assert_eq!(timeout.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let llm_timeout: AppError =
            ContextorError::Generation(AiLlmError::Timeout(Duration::from_secs(60))).into();
        assert_eq!(llm_timeout.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let decode: AppError = ContextorError::Retrieval(RagBaseError::Decode("bad".into())).into();
        assert_eq!(decode.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn elapsed_timeout_becomes_json_408() {
        let err = handle_layer_error(Box::new(tower::timeout::error::Elapsed::new())).await;
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body_json(resp).await, serde_json::json!({"error": "request timed out"}));
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let err: AppError = ContextorError::Config("cannot read system prompt /etc/secret.md".into()).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let v = body_json(resp).await;
        assert_eq!(v["error"], "Internal server error");
    }
}
