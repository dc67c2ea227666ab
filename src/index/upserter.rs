//! Batched index writes with rate-limit splitting and best-effort drops.
//!
//! The index provider enforces a stricter write rate than the embedding
//! provider, so batches are smaller and a rate-limited batch is retried as
//! sub-batches. A sub-batch that still fails is dropped for this run; the
//! job is not failed for it. Record identity makes a later reprocessing of
//! the document fill the gap.

use std::time::Duration;

use crate::config::Config;
use crate::index::{IndexRecord, VectorIndex};

/// Sizing and pacing knobs for index writes.
#[derive(Debug, Clone)]
pub struct UpsertPolicy {
    /// Number of records submitted per index call.
    pub batch_size: usize,
    /// Lower bound on the sub-batch size used after a rate limit.
    pub min_sub_batch: usize,
    /// Pause between successful batches.
    pub inter_batch_delay: Duration,
    /// Pause after the index signals a rate limit.
    pub rate_limit_delay: Duration,
    /// Pause after each successful sub-batch.
    pub sub_batch_delay: Duration,
}

impl Default for UpsertPolicy {
    fn default() -> Self {
        Self {
            batch_size: 50,
            min_sub_batch: 10,
            inter_batch_delay: Duration::from_millis(500),
            rate_limit_delay: Duration::from_secs(5),
            sub_batch_delay: Duration::from_secs(1),
        }
    }
}

impl UpsertPolicy {
    /// Derive batch sizing from configuration, keeping the stock pacing delays.
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.upsert_batch_size,
            ..Self::default()
        }
    }
}

/// Totals for one document's index writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Records acknowledged by the index.
    pub written: usize,
    /// Records dropped after exhausting the write policy.
    pub dropped: usize,
}

/// Write records in bounded batches; failed batches degrade rather than abort.
pub async fn upsert_all(
    index: &dyn VectorIndex,
    records: &[IndexRecord],
    policy: &UpsertPolicy,
) -> UpsertReport {
    let mut report = UpsertReport::default();

    let batch_count = records.len().div_ceil(policy.batch_size);
    for (batch_index, batch) in records.chunks(policy.batch_size).enumerate() {
        match index.upsert(batch).await {
            Ok(()) => {
                report.written += batch.len();
                tracing::debug!(
                    batch = batch_index + 1,
                    of = batch_count,
                    records = batch.len(),
                    "Upserted batch"
                );
                if batch_index + 1 < batch_count {
                    tokio::time::sleep(policy.inter_batch_delay).await;
                }
            }
            Err(error) if error.is_rate_limited() => {
                tracing::warn!(
                    batch = batch_index,
                    error = %error,
                    "Index rate limit hit; retrying in sub-batches"
                );
                tokio::time::sleep(policy.rate_limit_delay).await;
                let sub_size = (policy.batch_size / 2).max(policy.min_sub_batch);
                for sub_batch in batch.chunks(sub_size) {
                    match index.upsert(sub_batch).await {
                        Ok(()) => {
                            report.written += sub_batch.len();
                            tokio::time::sleep(policy.sub_batch_delay).await;
                        }
                        Err(error) => {
                            tracing::error!(
                                error = %error,
                                records = sub_batch.len(),
                                "Sub-batch write failed; dropping records"
                            );
                            report.dropped += sub_batch.len();
                        }
                    }
                }
            }
            Err(error) => {
                tracing::error!(
                    batch = batch_index,
                    error = %error,
                    records = batch.len(),
                    "Index write failed; dropping batch"
                );
                report.dropped += batch.len();
            }
        }
    }

    report
}
