//! Scoped retrieval of uploaded blobs from object storage.

pub mod gcs;

pub use gcs::GcsBlobStore;

use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised while materializing a remote blob locally.
///
/// Fetch failures are never retried: the job that requested the blob fails
/// immediately and no partial document processing is attempted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The named blob does not exist in the bucket.
    #[error("blob '{0}' not found")]
    NotFound(String),
    /// Transport failed before the blob was fully received.
    #[error("transfer failed: {0}")]
    Transfer(#[from] reqwest::Error),
    /// Object store responded with an unexpected status code.
    #[error("unexpected object store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the object store.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Local scratch file could not be created or written.
    #[error("scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a fetched blob held in a scoped temporary file.
///
/// The file is removed when the handle drops, whether the job that
/// requested it succeeded, failed, or returned early.
#[derive(Debug)]
pub struct ScopedBlob {
    file: NamedTempFile,
}

impl ScopedBlob {
    /// Wrap an already-written temporary file.
    pub fn new(file: NamedTempFile) -> Self {
        Self { file }
    }

    /// Path to the local copy of the blob.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Read-only access to the configured object-store bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download the named blob into a scoped temporary file.
    async fn fetch(&self, blob_name: &str) -> Result<ScopedBlob, FetchError>;
}
