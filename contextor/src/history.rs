//! Lenient parsing of caller-supplied conversation history.

use ai_llm_service::{ChatMessage, ChatRole};
use serde_json::Value;
use tracing::warn;

/// Keeps only well-formed `{role: "user"|"assistant", content: string}` turns.
///
/// Extra fields (client-side ids, timestamps) are discarded; malformed entries
/// are dropped and logged. Order is preserved.
pub fn sanitize_history(raw: &[Value]) -> Vec<ChatMessage> {
    raw.iter()
        .enumerate()
        .filter_map(|(pos, entry)| {
            let parsed = entry.as_object().and_then(|obj| {
                let role = match obj.get("role")?.as_str()? {
                    "user" => ChatRole::User,
                    "assistant" => ChatRole::Assistant,
                    _ => return None,
                };
                let content = obj.get("content")?.as_str()?;
                Some(ChatMessage {
                    role,
                    content: content.to_string(),
                })
            });
            if parsed.is_none() {
                warn!(position = pos, "dropping malformed history entry");
            }
            parsed
        })
        .collect()
}
