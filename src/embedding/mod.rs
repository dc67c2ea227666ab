//! Embedding client abstraction and batch embedding policy.

pub mod batcher;
pub mod gemini;

pub use batcher::{BatchPolicy, EmbedReport, embed_all};
pub use gemini::GeminiEmbeddingClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider signaled that the request rate or quota was exceeded.
    #[error("embedding provider rate limited: {0}")]
    RateLimited(String),
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("failed to generate embeddings: {0}")]
    Provider(String),
    /// HTTP layer failed before receiving a response.
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Whether the failure warrants the rate-limit retry path.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce one vector per supplied text with a single provider call.
    ///
    /// Implementations must return vectors in input order and reject
    /// responses whose vector count differs from the request size.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
