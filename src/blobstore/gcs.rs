//! HTTP client for media downloads from a Cloud Storage bucket.

use std::io::Write;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;

use crate::blobstore::{BlobStore, FetchError, ScopedBlob};
use crate::config::Config;

/// Client bound to one bucket of the object store.
pub struct GcsBlobStore {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) bucket: String,
    pub(crate) auth_token: Option<String>,
}

impl GcsBlobStore {
    /// Construct a client for the configured bucket.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent("pdfingest/0.1").build()?;
        tracing::debug!(
            bucket = %config.gcs_bucket_name,
            endpoint = %config.gcs_endpoint,
            "Initialized object store client"
        );
        Ok(Self {
            client,
            base_url: config.gcs_endpoint.trim_end_matches('/').to_string(),
            bucket: config.gcs_bucket_name.clone(),
            auth_token: config.gcs_auth_token.clone(),
        })
    }

    fn media_url(&self, blob_name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.base_url,
            self.bucket,
            encode_object_name(blob_name)
        )
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn fetch(&self, blob_name: &str) -> Result<ScopedBlob, FetchError> {
        let mut request = self.client.get(self.media_url(blob_name));
        if let Some(token) = &self.auth_token
            && !token.is_empty()
        {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(blob_name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UnexpectedStatus { status, body });
        }

        let mut file = NamedTempFile::new()?;
        let mut stream = response.bytes_stream();
        let mut bytes_written = 0usize;
        while let Some(piece) = stream.next().await {
            let piece = piece?;
            file.write_all(&piece)?;
            bytes_written += piece.len();
        }
        file.flush()?;

        tracing::debug!(
            blob = blob_name,
            bytes = bytes_written,
            path = %file.path().display(),
            "Downloaded blob"
        );
        Ok(ScopedBlob::new(file))
    }
}

/// Percent-encode an object name for the single path segment the JSON API
/// expects, including any `/` separators inside the name.
fn encode_object_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            other => {
                encoded.push_str(&format!("%{other:02X}"));
            }
        }
    }
    encoded
}
