//! Storage-account connection string parsing.
//!
//! The connection string is only used to turn blob paths found in search
//! identifiers into navigable URLs; blob content is never read.

use crate::errors::rag_base_error::RagBaseError;

/// Blob endpoint (and optional SAS) extracted from a storage connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccount {
    /// Blob service base URL without trailing slash, e.g.
    /// `https://acct.blob.core.windows.net`.
    pub blob_endpoint: String,
    /// Shared access signature without leading `?`, appended to blob URLs.
    pub sas: Option<String>,
}

impl StorageAccount {
    /// Parses a `Key=Value;Key=Value` connection string.
    ///
    /// Uses `BlobEndpoint` when present; otherwise builds the endpoint from
    /// `DefaultEndpointsProtocol` (default `https`), `AccountName` and
    /// `EndpointSuffix` (default `core.windows.net`).
    ///
    /// # Errors
    /// [`RagBaseError::InvalidConfig`] when neither `BlobEndpoint` nor
    /// `AccountName` is present.
    pub fn from_connection_string(conn: &str) -> Result<Self, RagBaseError> {
        let mut protocol = None;
        let mut account = None;
        let mut suffix = None;
        let mut blob_endpoint = None;
        let mut sas = None;

        for part in conn.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Values (SAS, account keys) may themselves contain '='.
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = Some(value.to_string()),
                "accountname" => account = Some(value.to_string()),
                "endpointsuffix" => suffix = Some(value.to_string()),
                "blobendpoint" => blob_endpoint = Some(value.to_string()),
                "sharedaccesssignature" => {
                    sas = Some(value.trim_start_matches('?').to_string()).filter(|s| !s.is_empty())
                }
                _ => {}
            }
        }

        let blob_endpoint = match (blob_endpoint, account) {
            (Some(ep), _) => ep.trim_end_matches('/').to_string(),
            (None, Some(acct)) => format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or("https"),
                acct,
                suffix.as_deref().unwrap_or("core.windows.net")
            ),
            (None, None) => {
                return Err(RagBaseError::InvalidConfig(
                    "STORAGE_CONNECTION_STRING needs BlobEndpoint or AccountName".into(),
                ));
            }
        };

        Ok(Self { blob_endpoint, sas })
    }

    /// Builds the URL of a decoded blob path such as `container/dir/file.pdf`.
    ///
    /// Each path segment is percent-encoded again; `/` separators are kept.
    pub fn blob_url(&self, path: &str) -> String {
        let encoded = path
            .trim_start_matches('/')
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        let mut url = format!("{}/{}", self.blob_endpoint, encoded);
        if let Some(sas) = &self.sas {
            url.push('?');
            url.push_str(sas);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_from_account_parts() {
        let acct = StorageAccount::from_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=stmanual;AccountKey=abc==;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(acct.blob_endpoint, "https://stmanual.blob.core.windows.net");
        assert_eq!(acct.sas, None);
        assert_eq!(
            acct.blob_url("docs/manual.pdf"),
            "https://stmanual.blob.core.windows.net/docs/manual.pdf"
        );
    }

    #[test]
    fn explicit_blob_endpoint_and_sas_win() {
        let acct = StorageAccount::from_connection_string(
            "BlobEndpoint=https://cdn.example/;SharedAccessSignature=sv=2024&sig=a%3D",
        )
        .unwrap();
        assert_eq!(acct.blob_endpoint, "https://cdn.example");
        assert_eq!(
            acct.blob_url("/c/m.pdf"),
            "https://cdn.example/c/m.pdf?sv=2024&sig=a%3D"
        );
    }

    #[test]
    fn path_segments_are_encoded() {
        let acct = StorageAccount {
            blob_endpoint: "https://acct.blob.core.windows.net".into(),
            sas: None,
        };
        assert_eq!(
            acct.blob_url("manuals/wipo drafting #2.pdf"),
            "https://acct.blob.core.windows.net/manuals/wipo%20drafting%20%232.pdf"
        );
    }

    #[test]
    fn rejects_string_without_account() {
        assert!(StorageAccount::from_connection_string("AccountKey=abc").is_err());
    }
}
