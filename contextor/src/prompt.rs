//! Prompt builder: system instructions + numbered grounding passages.

use rag_base::SearchResult;

/// Default system instructions for manual-grounded answers.
///
/// Used when no `SYSTEM_PROMPT_PATH` is configured.
pub const DEFAULT_SYSTEM: &str = r#"
You are an assistant for patent attorneys and inventors. Answer questions using the
WIPO Patent Drafting Manual passages supplied in the user message.
Cite every statement that relies on a passage with its bracketed source number, e.g. [1] or [2].
Only use the numbers shown next to the passages; never invent a source number.
If the passages do not contain the answer, say so plainly.
"#;

/// Build the final user turn: numbered passages, then the question.
///
/// Passages keep their retrieval position as source number (`[1]` is the first
/// passage) so markers in the answer map straight back to the search results.
/// The context is compacted to at most `max_chars`; passages that no longer fit
/// are cut or left out, which never shifts the numbering of earlier ones.
///
/// Returns the prompt and how many leading passages made it into the prompt
/// (a cut passage counts as included).
pub fn build_user_prompt(
    question: &str,
    passages: &[SearchResult],
    max_chars: usize,
) -> (String, usize) {
    let mut out = String::new();
    let mut included = 0;

    if !passages.is_empty() {
        out.push_str("Sources:\n");
        let mut budget = max_chars;

        for (i, p) in passages.iter().enumerate() {
            let header = format!("[{}] {}\n", i + 1, p.title.trim());
            let text = p.content.trim();

            if header.len() >= budget {
                break;
            }
            out.push_str(&header);
            budget -= header.len();
            included += 1;

            let take = budget.saturating_sub(2);
            if text.len() > take {
                out.push_str(safe_truncate(text, take));
                out.push_str("\n…\n");
                break;
            } else {
                out.push_str(text);
                out.push_str("\n\n");
                budget = budget.saturating_sub(text.len() + 2);
            }
        }
    }

    out.push_str("Question:\n");
    out.push_str(question.trim());
    out.push('\n');
    (out, included)
}

fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}
