use ai_llm_service::ChatMessage;
use contextor::{AskInput, Citation, QaAnswer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Request payload for /api/ask-ai.
///
/// Both fields are optional at the JSON level; an absent or blank `message` is
/// rejected by the orchestrator with a 400.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    /// The user's question.
    #[serde(default)]
    pub message: Option<String>,
    /// Prior turns, oldest first. Malformed entries are dropped.
    #[serde(default)]
    pub history: Option<Value>,
}

impl AskRequest {
    pub fn into_input(self) -> AskInput {
        let history = match self.history {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                warn!("'history' is not an array, ignoring it");
                Vec::new()
            }
        };
        AskInput {
            message: self.message.unwrap_or_default(),
            history,
        }
    }
}

/// Response payload for /api/ask-ai.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Answer with renumbered `[n]` markers.
    pub answer: String,
    /// Input history plus this exchange.
    pub history: Vec<ChatMessage>,
    pub references: Vec<Reference>,
}

/// One cited manual location.
#[derive(Debug, Serialize)]
pub struct Reference {
    pub index: u32,
    pub title: String,
    /// Document link, with `#page=N` when the page is known.
    pub url: String,
}

impl From<Citation> for Reference {
    fn from(c: Citation) -> Self {
        Self {
            index: c.index,
            title: c.title,
            url: c.url,
        }
    }
}

impl From<QaAnswer> for AskResponse {
    fn from(qa: QaAnswer) -> Self {
        Self {
            answer: qa.answer,
            history: qa.history,
            references: qa.references.into_iter().map(Reference::from).collect(),
        }
    }
}
