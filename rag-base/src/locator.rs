//! Decoding of search-result identifiers into document links.
//!
//! Identifier grammar:
//!
//! ```text
//! identifier := percent-encoded-location [ "_pages_" decimal-digits ]
//! ```
//!
//! - A trailing `_pages_<n>` yields page `n`; `n == 0` or any other suffix
//!   means "no page fragment". Such identifiers are never an error.
//! - The location is percent-decoded. An absolute `http(s)` URL is used as is;
//!   anything else is a blob path resolved against the storage account.

use serde::Serialize;

use crate::errors::rag_base_error::RagBaseError;
use crate::structs::storage::StorageAccount;

/// Separator between the encoded location and the page number.
pub const PAGE_SEPARATOR: &str = "_pages_";

/// Decoded form of a search-result identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLocation {
    /// Navigable document URL (without page fragment).
    pub url: String,
    /// 1-based page inside the document, when the identifier carries one.
    pub page: Option<u32>,
}

impl DocumentLocation {
    /// Renders the link handed to clients: `url` or `url#page=N`.
    pub fn href(&self) -> String {
        match self.page {
            Some(page) => {
                let base = self.url.split_once('#').map_or(self.url.as_str(), |(b, _)| b);
                format!("{base}#page={page}")
            }
            None => self.url.clone(),
        }
    }
}

/// Splits `identifier` into `(encoded_location, page)`.
pub fn split_page_marker(identifier: &str) -> (&str, Option<u32>) {
    if let Some(idx) = identifier.rfind(PAGE_SEPARATOR) {
        let digits = &identifier[idx + PAGE_SEPARATOR.len()..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            // Overlong digit runs do not fit u32 and are treated as "no page".
            let page = digits.parse::<u32>().ok().filter(|p| *p > 0);
            return (&identifier[..idx], page);
        }
    }
    (identifier, None)
}

/// Decodes a result identifier into a [`DocumentLocation`].
///
/// # Errors
/// [`RagBaseError::Identifier`] when the identifier is empty or its location
/// part does not percent-decode to UTF-8.
pub fn decode_identifier(
    identifier: &str,
    storage: &StorageAccount,
) -> Result<DocumentLocation, RagBaseError> {
    let (encoded, page) = split_page_marker(identifier.trim());
    if encoded.is_empty() {
        return Err(RagBaseError::Identifier {
            identifier: identifier.to_string(),
            reason: "empty location".into(),
        });
    }

    let decoded = urlencoding::decode(encoded).map_err(|e| RagBaseError::Identifier {
        identifier: identifier.to_string(),
        reason: format!("invalid percent-encoding: {e}"),
    })?;

    let url = if is_absolute_http(&decoded) {
        decoded.into_owned()
    } else {
        storage.blob_url(&decoded)
    };

    Ok(DocumentLocation { url, page })
}

fn is_absolute_http(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
