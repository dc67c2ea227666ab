//! Batched embedding with graduated retry and zero-vector degradation.
//!
//! Downstream association between chunk and vector is positional, so the
//! output sequence must keep the exact length and order of the input even
//! when provider calls fail. A position whose embedding cannot be computed
//! degrades to an all-zero vector of the configured dimension; cosine
//! similarity treats the zero vector as non-matching for any query, so
//! degraded chunks stay indexed without polluting retrieval.

use std::ops::Range;
use std::time::Duration;

use crate::config::Config;
use crate::embedding::{EmbeddingClient, EmbeddingError};

/// Sizing and pacing knobs for batch embedding.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Number of texts submitted per provider call.
    pub batch_size: usize,
    /// Dimension used for zero-vector placeholders.
    pub dimension: usize,
    /// Pause between successful batches.
    pub inter_batch_delay: Duration,
    /// Pause after the provider signals a rate limit.
    pub rate_limit_delay: Duration,
    /// Pause between the two halves of a split retry.
    pub split_retry_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 16,
            dimension: 768,
            inter_batch_delay: Duration::from_millis(500),
            rate_limit_delay: Duration::from_secs(5),
            split_retry_delay: Duration::from_secs(1),
        }
    }
}

impl BatchPolicy {
    /// Derive batch sizing from configuration, keeping the stock pacing delays.
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.embed_batch_size,
            dimension: config.embedding_dimension,
            ..Self::default()
        }
    }
}

/// Outcome of embedding one document's chunk texts.
#[derive(Debug, Clone)]
pub struct EmbedReport {
    /// One vector per input text, order preserved.
    pub vectors: Vec<Vec<f32>>,
    /// Input ranges whose vectors were degraded to zero placeholders.
    pub degraded: Vec<Range<usize>>,
}

impl EmbedReport {
    /// Number of input positions carrying a placeholder instead of a real embedding.
    pub fn degraded_count(&self) -> usize {
        self.degraded.iter().map(|range| range.len()).sum()
    }
}

/// Embed every text in bounded batches, degrading failed positions to zero vectors.
///
/// The result has the same length and order as `texts`. Failures are
/// isolated per batch: a rate-limited batch is retried once in halves after
/// a longer pause, any other failure degrades the batch immediately, and no
/// failure aborts the overall call.
pub async fn embed_all(
    client: &dyn EmbeddingClient,
    texts: &[String],
    policy: &BatchPolicy,
) -> EmbedReport {
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    let mut degraded: Vec<Range<usize>> = Vec::new();

    let batch_count = texts.len().div_ceil(policy.batch_size);
    for (batch_index, batch) in texts.chunks(policy.batch_size).enumerate() {
        let base = batch_index * policy.batch_size;
        match client.embed_batch(batch).await {
            Ok(batch_vectors) => {
                vectors.extend(batch_vectors);
                if batch_index + 1 < batch_count {
                    tokio::time::sleep(policy.inter_batch_delay).await;
                }
            }
            Err(error) if error.is_rate_limited() => {
                tracing::warn!(
                    batch = batch_index,
                    error = %error,
                    "Rate limit hit; retrying with halved batch"
                );
                tokio::time::sleep(policy.rate_limit_delay).await;
                retry_halved(client, batch, base, policy, &mut vectors, &mut degraded).await;
            }
            Err(error) => {
                tracing::error!(
                    batch = batch_index,
                    error = %error,
                    "Embedding batch failed; degrading to zero vectors"
                );
                degrade(batch.len(), base, policy.dimension, &mut vectors, &mut degraded);
            }
        }
    }

    debug_assert_eq!(vectors.len(), texts.len());
    EmbedReport { vectors, degraded }
}

/// Retry a rate-limited batch as two halves.
///
/// When the first half fails again the whole batch degrades; when only the
/// second half fails, the successfully embedded first half is kept and the
/// remaining positions degrade.
async fn retry_halved(
    client: &dyn EmbeddingClient,
    batch: &[String],
    base: usize,
    policy: &BatchPolicy,
    vectors: &mut Vec<Vec<f32>>,
    degraded: &mut Vec<Range<usize>>,
) {
    let split = (batch.len() / 2).max(1);
    let (first, second) = batch.split_at(split);

    match client.embed_batch(first).await {
        Ok(first_vectors) => {
            vectors.extend(first_vectors);
            if second.is_empty() {
                return;
            }
            tokio::time::sleep(policy.split_retry_delay).await;
            match client.embed_batch(second).await {
                Ok(second_vectors) => vectors.extend(second_vectors),
                Err(error) => {
                    tracing::error!(
                        error = %error,
                        "Split retry failed for remaining half; degrading"
                    );
                    degrade(second.len(), base + split, policy.dimension, vectors, degraded);
                }
            }
        }
        Err(error) => {
            tracing::error!(error = %error, "Split retry failed; degrading whole batch");
            degrade(batch.len(), base, policy.dimension, vectors, degraded);
        }
    }
}

fn degrade(
    len: usize,
    start: usize,
    dimension: usize,
    vectors: &mut Vec<Vec<f32>>,
    degraded: &mut Vec<Range<usize>>,
) {
    vectors.extend(std::iter::repeat_with(|| vec![0.0; dimension]).take(len));
    degraded.push(start..start + len);
}
