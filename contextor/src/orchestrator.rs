//! The ask pipeline: validate → retrieve → ground → generate → cite.

use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::ChatMessage;
use rag_base::{SearchResult, StorageAccount, decode_identifier};
use tracing::{debug, info, warn};

use crate::api_types::{AskInput, QaAnswer};
use crate::backends::{Generator, Retriever};
use crate::cfg::{ContextorConfig, is_greeting};
use crate::citations::{self, Citation, SourceRef};
use crate::error::ContextorError;
use crate::history::sanitize_history;
use crate::prompt::build_user_prompt;

/// Process-wide orchestrator. Holds shared, read-only client handles.
pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    storage: StorageAccount,
    cfg: ContextorConfig,
}

impl Orchestrator {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        storage: StorageAccount,
        cfg: ContextorConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            storage,
            cfg,
        }
    }

    /// Answers one question.
    ///
    /// At most two outbound calls are made, strictly in sequence: search, then
    /// generation. Greetings and empty retrievals are answered locally.
    ///
    /// # Errors
    /// - [`ContextorError::InvalidRequest`] for an empty `message` (no calls made)
    /// - [`ContextorError::Retrieval`] when search fails (generation is skipped)
    /// - [`ContextorError::Generation`] when the completion fails
    pub async fn ask(&self, input: AskInput) -> Result<QaAnswer, ContextorError> {
        let started = Instant::now();
        let question = input.message.trim();
        if question.is_empty() {
            return Err(ContextorError::InvalidRequest(
                "Missing 'message' in request body".into(),
            ));
        }

        let history = sanitize_history(&input.history);
        debug!(
            history_in = input.history.len(),
            history_kept = history.len(),
            question_len = question.len(),
            "ask: start"
        );

        if is_greeting(question) {
            info!("ask: greeting answered locally");
            return Ok(finish(
                history,
                input.message,
                self.cfg.greeting_answer.clone(),
                Vec::new(),
            ));
        }

        // 1) Retrieve
        let passages = self
            .retriever
            .retrieve(question)
            .await
            .map_err(ContextorError::Retrieval)?;

        // 2) Decode source locations; passages without a usable link are dropped
        let (passages, mut sources): (Vec<SearchResult>, Vec<SourceRef>) = passages
            .into_iter()
            .filter_map(|p| match decode_identifier(&p.identifier, &self.storage) {
                Ok(loc) => {
                    let src = SourceRef {
                        title: p.title.clone(),
                        href: loc.href(),
                    };
                    Some((p, src))
                }
                Err(e) => {
                    warn!(error = %e, title = %p.title, "ask: dropping passage with undecodable identifier");
                    None
                }
            })
            .unzip();

        if passages.is_empty() {
            warn!("ask: retrieval returned no usable passages");
            return Ok(finish(
                history,
                input.message,
                self.cfg.no_results_answer.clone(),
                Vec::new(),
            ));
        }

        // 3) Ground + generate
        let (prompt, included) = build_user_prompt(question, &passages, self.cfg.max_ctx_chars);
        if included < sources.len() {
            debug!(
                included,
                retrieved = sources.len(),
                "ask: context budget left passages out of the prompt"
            );
            // Markers for passages the model never saw must not become references.
            sources.truncate(included);
        }

        let mut turns = history.clone();
        turns.push(ChatMessage::user(prompt));
        let raw = self
            .generator
            .generate(&self.cfg.system_prompt, &turns)
            .await
            .map_err(ContextorError::Generation)?;

        // 4) Cite
        let segments = citations::tokenize(&raw);
        let (rendered, references) = citations::renumber(&segments, &sources);
        let mut answer = citations::render(&rendered);
        let literal = rendered
            .iter()
            .filter(|s| matches!(s, citations::Rendered::Literal(_)))
            .count();
        if literal > 0 {
            warn!(
                unmapped = literal,
                passages = sources.len(),
                "ask: citation markers without a source left as text"
            );
        }
        if self.cfg.append_reference_links {
            answer = citations::append_reference_links(&answer, &references);
        }

        info!(
            passages = passages.len(),
            references = references.len(),
            latency_ms = started.elapsed().as_millis(),
            "ask: done"
        );

        Ok(finish(history, input.message, answer, references))
    }
}

fn finish(
    mut history: Vec<ChatMessage>,
    message: String,
    answer: String,
    references: Vec<Citation>,
) -> QaAnswer {
    history.push(ChatMessage::user(message));
    history.push(ChatMessage::assistant(answer.clone()));
    QaAnswer {
        answer,
        history,
        references,
    }
}
