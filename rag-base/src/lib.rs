//! Retrieval side of the ask-ai backend.
//!
//! Public API:
//! - [`SearchClient::search`]: query the managed search index for top-K passages.
//! - [`decode_identifier`]: turn a passage identifier into a [`DocumentLocation`].
//! - [`SearchConfig::from_env`]: validated configuration, fail-fast on missing keys.

pub mod errors {
    pub mod rag_base_error;
}
pub mod locator;
pub mod search;
pub mod structs {
    pub mod rag_base_config;
    pub mod search_result;
    pub mod storage;
}

pub use errors::rag_base_error::RagBaseError;
pub use locator::{DocumentLocation, decode_identifier};
pub use search::SearchClient;
pub use structs::rag_base_config::{SearchConfig, SearchFields};
pub use structs::search_result::SearchResult;
pub use structs::storage::StorageAccount;
