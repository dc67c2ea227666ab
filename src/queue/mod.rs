//! Job source and status sink integration.

pub mod kafka;
pub mod types;

pub use kafka::{KafkaJobSource, KafkaStatusSink};
pub use types::{DispatchError, JobDescriptor, JobStatus, StatusEvent, parse_job};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the message broker integration.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Broker rejected or failed the operation.
    #[error("Kafka operation failed: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
    /// Status event could not be serialized for publishing.
    #[error("Failed to encode status event: {0}")]
    Encode(#[from] serde_json::Error),
    /// Failure reported by a non-broker implementation, primarily test fakes.
    #[error("Queue operation failed: {0}")]
    Other(String),
}

/// Source of pending job messages.
///
/// `poll` blocks for a bounded interval and may return an empty batch;
/// `commit` records read progress for everything returned so far. Committing
/// only after a whole batch is processed gives at-least-once semantics:
/// a crash mid-batch reprocesses already-completed jobs, which downstream
/// record identity makes safe.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Wait for the next batch of raw message payloads.
    async fn poll(&self) -> Result<Vec<Vec<u8>>, QueueError>;

    /// Commit read progress for all previously polled messages.
    async fn commit(&self) -> Result<(), QueueError>;
}

/// Destination for per-document status events.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Publish the terminal status event for one job.
    async fn publish(&self, event: &StatusEvent) -> Result<(), QueueError>;
}
