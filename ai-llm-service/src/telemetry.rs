use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefixes of the workspace crates whose events this layer renders.
pub const TARGET_PREFIXES: &[&str] = &[
    "ask_ai_backend",
    "ai_llm_service",
    "rag_base",
    "contextor",
    "api",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Build a formatting layer that renders ONLY events emitted by the backend crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - ANSI colors only when stdout is a terminal
///
/// Third-party events (hyper, reqwest, tower-http) are left to the global fmt layer.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_ours = filter::filter_fn(|meta| is_backend_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_ours)
}

/// Plain fmt layer for everything that is *not* a backend crate.
pub fn foreign_layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_ansi(io::stdout().is_terminal())
        .with_filter(filter::filter_fn(|meta| !is_backend_target(meta.target())))
}

fn is_backend_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| {
        target == *p
            || target
                .strip_prefix(p)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Level directive for one crate, e.g. `ai_llm_service=debug`.
pub fn level_directive(target: &str, level: Level) -> Option<Directive> {
    let s = format!("{target}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).ok()
}

/// Create an EnvFilter from `RUST_LOG`. When it is unset, start from `default`
/// and raise the backend crates to `level`.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => TARGET_PREFIXES
            .iter()
            .filter_map(|t| level_directive(t, level))
            .fold(EnvFilter::new(default), |f, d| f.add_directive(d)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_targets_are_matched_by_crate_prefix() {
        assert!(is_backend_target("contextor"));
        assert!(is_backend_target("rag_base::search"));
        assert!(is_backend_target("api::routes::ask"));
        assert!(!is_backend_target("apixyz"));
        assert!(!is_backend_target("hyper::proto"));
    }

    #[test]
    fn directive_is_built_per_crate() {
        let d = level_directive("rag_base", Level::DEBUG).unwrap();
        assert_eq!(d.to_string(), "rag_base=debug");
    }
}
