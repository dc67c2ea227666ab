//! Wire types shared by the job source and status sink.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding an upload notification.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Payload was not valid JSON for the expected schema.
    #[error("malformed job message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Payload decoded but a required field was blank.
    #[error("job message missing required field: {0}")]
    MissingField(&'static str),
}

/// Upload notification as it appears on the uploads topic.
#[derive(Debug, Deserialize)]
struct JobMessage {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    id: String,
}

/// Unit of work: one uploaded document to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Stable identifier assigned by the uploader; record ids derive from it.
    pub id: String,
    /// Object name of the uploaded PDF within the bucket.
    pub blob_name: String,
}

/// Decode one upload notification into a job descriptor.
pub fn parse_job(payload: &[u8]) -> Result<JobDescriptor, DispatchError> {
    let message: JobMessage = serde_json::from_slice(payload)?;
    if message.id.trim().is_empty() {
        return Err(DispatchError::MissingField("id"));
    }
    if message.filename.trim().is_empty() {
        return Err(DispatchError::MissingField("filename"));
    }
    Ok(JobDescriptor {
        id: message.id,
        blob_name: message.filename,
    })
}

/// Terminal outcome of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Pipeline ran to the end; chunk count may be zero.
    Completed,
    /// Pipeline aborted; `error` carries the reason.
    Failed,
}

/// Terminal record of a job's outcome, published exactly once per received job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Identifier of the processed document.
    pub id: String,
    /// Terminal outcome.
    pub status: JobStatus,
    /// Number of chunks produced, present on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_processed: Option<usize>,
    /// Records dropped by the best-effort index write policy, when any were.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_dropped: Option<usize>,
    /// Human-readable failure reason, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusEvent {
    /// Event for a document that completed the pipeline.
    pub fn completed(id: &str, chunks_processed: usize, records_dropped: usize) -> Self {
        Self {
            id: id.to_string(),
            status: JobStatus::Completed,
            chunks_processed: Some(chunks_processed),
            records_dropped: (records_dropped > 0).then_some(records_dropped),
            error: None,
        }
    }

    /// Event for a document that failed before completing the pipeline.
    pub fn failed(id: &str, error: String) -> Self {
        Self {
            id: id.to_string(),
            status: JobStatus::Failed,
            chunks_processed: None,
            records_dropped: None,
            error: Some(error),
        }
    }
}
