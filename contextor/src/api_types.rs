//! Public API types re-used by the HTTP layer.

use ai_llm_service::ChatMessage;
use serde_json::Value;

use crate::citations::Citation;

/// One question with the caller's raw history.
///
/// History entries are kept as raw JSON so malformed turns can be dropped
/// instead of failing the whole request.
#[derive(Clone, Debug, Default)]
pub struct AskInput {
    pub message: String,
    pub history: Vec<Value>,
}

/// Final answer, updated history and the references cited by the answer.
///
/// # Example
/// ```
/// use contextor::{Citation, QaAnswer};
/// let qa = QaAnswer {
///     answer: "Novelty is required [1].".into(),
///     history: vec![],
///     references: vec![Citation { index: 1, title: "Chapter 3".into(), url: "https://example/manual.pdf#page=12".into() }],
/// };
/// assert_eq!(qa.references[0].index, 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QaAnswer {
    pub answer: String,
    pub history: Vec<ChatMessage>,
    pub references: Vec<Citation>,
}
