//! Runtime configuration loaded from environment variables.

use std::path::Path;

use tracing::info;

use crate::error::ContextorError;
use crate::prompt::DEFAULT_SYSTEM;

pub const DEFAULT_GREETING_ANSWER: &str = "Hello! How can I assist you with the WIPO Patent Drafting Manual or patent-related questions today?";
pub const DEFAULT_NO_RESULTS_ANSWER: &str = "No relevant information was found in the manual. Please rephrase your question or contact support for further assistance.";
pub const DEFAULT_MAX_CTX_CHARS: usize = 12_000;

/// Messages answered locally without retrieval.
pub const GREETINGS: &[&str] = &["hello", "hi", "hey", "greetings"];

/// Orchestrator knobs. Built once at start-up and never mutated.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    /// System prompt sent first on every generation call.
    pub system_prompt: String,
    /// Reply to a bare greeting.
    pub greeting_answer: String,
    /// Reply when retrieval finds nothing.
    pub no_results_answer: String,
    /// Append a `[n]: url` footer to answers.
    pub append_reference_links: bool,
    /// Char budget for the grounding passages.
    pub max_ctx_chars: usize,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM.trim().to_string(),
            greeting_answer: DEFAULT_GREETING_ANSWER.to_string(),
            no_results_answer: DEFAULT_NO_RESULTS_ANSWER.to_string(),
            append_reference_links: false,
            max_ctx_chars: DEFAULT_MAX_CTX_CHARS,
        }
    }
}

impl ContextorConfig {
    /// Build from environment variables with defaults.
    ///
    /// - `SYSTEM_PROMPT_PATH`: file with the system prompt (must be readable if set)
    /// - `GREETING_ANSWER`, `NO_RESULTS_ANSWER`
    /// - `APPEND_REFERENCE_LINKS` (`true`/`false`, default `false`)
    /// - `MAX_CTX_CHARS` (default 12000)
    pub fn from_env() -> Result<Self, ContextorError> {
        let dflt = Self::default();

        let system_prompt = match env_opt("SYSTEM_PROMPT_PATH") {
            Some(path) => load_system_prompt(Path::new(&path))?,
            None => dflt.system_prompt,
        };

        let append_reference_links = match env_opt("APPEND_REFERENCE_LINKS") {
            Some(v) => v.to_ascii_lowercase().parse::<bool>().map_err(|_| {
                ContextorError::Config(format!("APPEND_REFERENCE_LINKS must be true/false, got '{v}'"))
            })?,
            None => false,
        };

        let max_ctx_chars = match env_opt("MAX_CTX_CHARS") {
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ContextorError::Config(format!("MAX_CTX_CHARS must be > 0, got '{v}'")))?,
            None => dflt.max_ctx_chars,
        };

        Ok(Self {
            system_prompt,
            greeting_answer: env_opt("GREETING_ANSWER").unwrap_or(dflt.greeting_answer),
            no_results_answer: env_opt("NO_RESULTS_ANSWER").unwrap_or(dflt.no_results_answer),
            append_reference_links,
            max_ctx_chars,
        })
    }
}

/// Reads the system prompt file; an empty file is rejected.
pub fn load_system_prompt(path: &Path) -> Result<String, ContextorError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ContextorError::Config(format!("cannot read system prompt {}: {e}", path.display()))
    })?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ContextorError::Config(format!(
            "system prompt {} is empty",
            path.display()
        )));
    }
    info!(path = %path.display(), chars = text.len(), "system prompt loaded");
    Ok(text.to_string())
}

/// `true` for a bare greeting such as "Hi" or " hello ".
pub fn is_greeting(message: &str) -> bool {
    let m = message.trim().to_lowercase();
    GREETINGS.contains(&m.as_str())
}

fn env_opt(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    #[test]
    fn greeting_detection() {
        assert!(is_greeting("Hello"));
        assert!(is_greeting("  hey "));
        assert!(!is_greeting("hello, what is novelty?"));
        assert!(!is_greeting("hi!"));
    }

    #[test]
    fn prompt_file_is_loaded_and_trimmed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "\n  Answer from the manual only.  \n").unwrap();
        assert_eq!(
            load_system_prompt(f.path()).unwrap(),
            "Answer from the manual only."
        );
    }

    #[test]
    fn missing_or_empty_prompt_file_is_an_error() {
        assert!(load_system_prompt(Path::new("/definitely/not/here.md")).is_err());
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(load_system_prompt(f.path()).is_err());
    }

    #[test]
    #[serial]
    fn env_overrides() {
        unsafe {
            std::env::remove_var("SYSTEM_PROMPT_PATH");
            std::env::set_var("APPEND_REFERENCE_LINKS", "TRUE");
            std::env::set_var("GREETING_ANSWER", "Hi there");
            std::env::remove_var("MAX_CTX_CHARS");
        }
        let cfg = ContextorConfig::from_env().unwrap();
        assert!(cfg.append_reference_links);
        assert_eq!(cfg.greeting_answer, "Hi there");
        assert_eq!(cfg.max_ctx_chars, DEFAULT_MAX_CTX_CHARS);
        assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM.trim());

        unsafe { std::env::set_var("APPEND_REFERENCE_LINKS", "sometimes") };
        assert!(ContextorConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("APPEND_REFERENCE_LINKS");
            std::env::remove_var("GREETING_ANSWER");
        }
    }
}
