use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::structs::rag_base_config::SearchFields;

/// Title used when a document carries none.
pub const UNTITLED: &str = "Untitled document";

/// One passage returned by the search service.
///
/// Read-only: produced by [`crate::search::SearchClient::search`] and consumed to
/// build grounding context and citation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document title as indexed.
    pub title: String,

    /// Opaque location identifier (`chunk_id` or `parent_id`), see [`crate::locator`].
    pub identifier: String,

    /// Passage text.
    pub content: String,

    /// Ranking score (reranker score when semantic ranking is active).
    pub score: Option<f32>,
}

impl SearchResult {
    /// Maps one raw search document using the configured field names.
    ///
    /// Returns `None` when no identifier field is present: such a passage could
    /// never be cited.
    pub fn from_document(doc: &Map<String, Value>, fields: &SearchFields) -> Option<Self> {
        let identifier = first_string(doc, &[fields.id.as_str(), fields.id_fallback.as_str()])?;
        let title = first_string(doc, &[fields.title.as_str()]).unwrap_or_else(|| UNTITLED.to_string());
        let content =
            first_string(doc, &[fields.content.as_str(), fields.content_fallback.as_str()]).unwrap_or_default();
        let score = doc
            .get("@search.rerankerScore")
            .or_else(|| doc.get("@search.score"))
            .and_then(Value::as_f64)
            .map(|s| s as f32);

        Some(Self {
            title,
            identifier,
            content,
            score,
        })
    }
}

fn first_string(doc: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| doc.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
