//! POST /api/ask-ai — answers a question from the manual with citations.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::ask::ask_request::{AskRequest, AskResponse},
};

/// Handler: POST /api/ask-ai
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/api/ask-ai \
///   -H 'content-type: application/json' \
///   -d '{"message":"What are the requirements for patentability?","history":[]}'
/// ```
pub async fn ask_ai(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AskResponse>> {
    let Json(body) = payload?;

    let qa = state.orchestrator.ask(body.into_input()).await?;

    info!(
        references = qa.references.len(),
        answer_len = qa.answer.len(),
        "ask-ai answered"
    );
    Ok(Json(AskResponse::from(qa)))
}
