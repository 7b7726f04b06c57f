//! Configuration layer: reads search settings from environment variables
//! and exposes a strongly typed, validated config.

use serde::{Deserialize, Serialize};

use crate::errors::rag_base_error::RagBaseError;
use crate::structs::storage::StorageAccount;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Names of the index fields the client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFields {
    pub title: String,
    /// Primary identifier field (per-chunk).
    pub id: String,
    /// Used when `id` is missing on a document.
    pub id_fallback: String,
    pub content: String,
    /// Used when `content` is missing on a document.
    pub content_fallback: String,
}

impl Default for SearchFields {
    fn default() -> Self {
        Self {
            title: "title".into(),
            id: "chunk_id".into(),
            id_fallback: "parent_id".into(),
            content: "chunk".into(),
            content_fallback: "content".into(),
        }
    }
}

/// Search service connectivity and retrieval knobs.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Service endpoint, e.g. `https://my-search.search.windows.net`.
    pub endpoint: String,
    /// Index to query.
    pub index_name: String,
    /// Query key presented as the `api-key` header.
    pub api_key: String,
    /// REST `api-version`.
    pub api_version: String,
    /// Semantic configuration name; enables semantic ranking when set.
    pub semantic_configuration: Option<String>,
    /// Passages requested per query.
    pub top_k: usize,
    /// Results scoring below this are dropped.
    pub min_score: Option<f32>,
    /// Request timeout.
    pub timeout_secs: u64,
    /// Field mapping.
    pub fields: SearchFields,
    /// Storage account used to resolve blob paths in identifiers.
    pub storage: StorageAccount,
}

impl SearchConfig {
    /// Build configuration from environment variables.
    ///
    /// Required:
    /// - `SEARCH_ENDPOINT`
    /// - `SEARCH_INDEX_NAME`
    /// - `SEARCH_KEY`
    /// - `STORAGE_CONNECTION_STRING`
    ///
    /// Optional:
    /// - `SEARCH_API_VERSION` (default: "2023-11-01")
    /// - `SEARCH_SEMANTIC_CONFIGURATION`
    /// - `SEARCH_TOP_K` (default: 5)
    /// - `SEARCH_MIN_SCORE`
    /// - `SEARCH_TIMEOUT_SECS` (default: 30)
    /// - `SEARCH_TITLE_FIELD` / `SEARCH_ID_FIELD` / `SEARCH_CONTENT_FIELD`
    pub fn from_env() -> Result<Self, RagBaseError> {
        let endpoint = required_env("SEARCH_ENDPOINT")?;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(RagBaseError::InvalidConfig(
                "SEARCH_ENDPOINT must start with http:// or https://".into(),
            ));
        }
        let index_name = required_env("SEARCH_INDEX_NAME")?;
        let api_key = required_env("SEARCH_KEY")?;
        let storage =
            StorageAccount::from_connection_string(&required_env("STORAGE_CONNECTION_STRING")?)?;

        let defaults = SearchFields::default();
        let fields = SearchFields {
            title: optional_env("SEARCH_TITLE_FIELD").unwrap_or(defaults.title),
            id: optional_env("SEARCH_ID_FIELD").unwrap_or(defaults.id),
            id_fallback: defaults.id_fallback,
            content: optional_env("SEARCH_CONTENT_FIELD").unwrap_or(defaults.content),
            content_fallback: defaults.content_fallback,
        };

        let cfg = Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index_name,
            api_key,
            api_version: optional_env("SEARCH_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            semantic_configuration: optional_env("SEARCH_SEMANTIC_CONFIGURATION"),
            top_k: parse_env("SEARCH_TOP_K")?.unwrap_or(DEFAULT_TOP_K),
            min_score: parse_env("SEARCH_MIN_SCORE")?,
            timeout_secs: parse_env("SEARCH_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            fields,
            storage,
        };

        if cfg.top_k == 0 {
            return Err(RagBaseError::InvalidConfig("SEARCH_TOP_K must be > 0".into()));
        }
        if cfg.timeout_secs == 0 {
            return Err(RagBaseError::InvalidConfig(
                "SEARCH_TIMEOUT_SECS must be > 0".into(),
            ));
        }

        Ok(cfg)
    }
}

fn required_env(key: &str) -> Result<String, RagBaseError> {
    optional_env(key).ok_or_else(|| RagBaseError::EnvMissing { key: key.into() })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional value from env; a present but malformed value is an error.
fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, RagBaseError> {
    match optional_env(key) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagBaseError::EnvParse {
                key: key.into(),
                value: v,
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VARS: &[&str] = &[
        "SEARCH_ENDPOINT",
        "SEARCH_INDEX_NAME",
        "SEARCH_KEY",
        "STORAGE_CONNECTION_STRING",
        "SEARCH_API_VERSION",
        "SEARCH_SEMANTIC_CONFIGURATION",
        "SEARCH_TOP_K",
        "SEARCH_MIN_SCORE",
        "SEARCH_TIMEOUT_SECS",
        "SEARCH_TITLE_FIELD",
        "SEARCH_ID_FIELD",
        "SEARCH_CONTENT_FIELD",
    ];

    fn reset() {
        for v in VARS {
            unsafe { std::env::remove_var(v) };
        }
        unsafe {
            std::env::set_var("SEARCH_ENDPOINT", "https://s.search.windows.net/");
            std::env::set_var("SEARCH_INDEX_NAME", "manual");
            std::env::set_var("SEARCH_KEY", "k");
            std::env::set_var("STORAGE_CONNECTION_STRING", "AccountName=acct");
        }
    }

    #[test]
    #[serial]
    fn defaults() {
        reset();
        let cfg = SearchConfig::from_env().unwrap();
        assert_eq!(cfg.endpoint, "https://s.search.windows.net");
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.api_version, DEFAULT_API_VERSION);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.fields, SearchFields::default());
        assert_eq!(cfg.storage.blob_endpoint, "https://acct.blob.core.windows.net");
        assert!(cfg.min_score.is_none());
    }

    #[test]
    #[serial]
    fn missing_storage_connection_string_fails() {
        reset();
        unsafe { std::env::remove_var("STORAGE_CONNECTION_STRING") };
        let err = SearchConfig::from_env().unwrap_err();
        assert!(matches!(err, RagBaseError::EnvMissing { key } if key == "STORAGE_CONNECTION_STRING"));
    }

    #[test]
    #[serial]
    fn malformed_number_fails_fast() {
        reset();
        unsafe { std::env::set_var("SEARCH_TOP_K", "five") };
        assert!(matches!(
            SearchConfig::from_env().unwrap_err(),
            RagBaseError::EnvParse { .. }
        ));
        unsafe { std::env::set_var("SEARCH_TOP_K", "0") };
        assert!(matches!(
            SearchConfig::from_env().unwrap_err(),
            RagBaseError::InvalidConfig(_)
        ));
    }

    #[test]
    #[serial]
    fn field_overrides() {
        reset();
        unsafe {
            std::env::set_var("SEARCH_ID_FIELD", "metadata_storage_path");
            std::env::set_var("SEARCH_CONTENT_FIELD", "text");
        }
        let cfg = SearchConfig::from_env().unwrap();
        assert_eq!(cfg.fields.id, "metadata_storage_path");
        assert_eq!(cfg.fields.id_fallback, "parent_id");
        assert_eq!(cfg.fields.content, "text");
    }
}
