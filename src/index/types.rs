//! Shared types for the vector index integration.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index signaled that the write rate or quota was exceeded.
    #[error("index rate limited: {0}")]
    RateLimited(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Index responded with an unexpected status code.
    #[error("unexpected index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

impl IndexError {
    /// Whether the failure warrants the sub-batch retry path.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Metadata stored alongside each vector for retrieval display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Chunk text as extracted from the document.
    pub text: String,
    /// Identifier of the source document.
    pub source_id: String,
    /// Zero-based page the chunk was extracted from.
    pub page: usize,
}

/// One (id, vector, metadata) record destined for the index.
///
/// Serializes directly as the index wire format (`id`/`values`/`metadata`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRecord {
    /// Deterministic identity, unique within a document.
    #[serde(rename = "id")]
    pub record_id: String,
    /// Embedding vector aligned to the chunk.
    #[serde(rename = "values")]
    pub vector: Vec<f32>,
    /// Retrieval metadata.
    pub metadata: RecordMetadata,
}

impl IndexRecord {
    /// Derive the record identity for one chunk of a document.
    ///
    /// The identity is a pure function of the document id and chunk
    /// position, so reprocessing the same document overwrites its previous
    /// records instead of duplicating them.
    pub fn record_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}-{chunk_index}")
    }
}
