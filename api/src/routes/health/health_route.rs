use axum::Json;
use serde_json::{Value, json};

/// Handler: GET /health. Liveness only, no upstream calls.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
