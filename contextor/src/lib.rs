//! Question-answering orchestrator over the patent drafting manual.
//!
//! Public API: [`Orchestrator::ask`]. It validates the question, sanitizes the
//! caller's history, retrieves ranked passages from the search index, grounds
//! the model on them, and rewrites the `[n]` citation markers of the answer
//! into contiguous references that link to the exact manual page.

mod api_types;
mod backends;
mod cfg;
mod citations;
mod error;
mod history;
mod orchestrator;
mod prompt;

pub use api_types::{AskInput, QaAnswer};
pub use backends::{Generator, Retriever};
pub use cfg::{ContextorConfig, is_greeting, load_system_prompt};
pub use citations::{Citation, SourceRef, append_reference_links};
pub use error::ContextorError;
pub use history::sanitize_history;
pub use orchestrator::Orchestrator;
pub use prompt::{DEFAULT_SYSTEM, build_user_prompt};
