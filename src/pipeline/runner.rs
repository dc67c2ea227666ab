//! Consume/dispatch/report loop with per-job failure isolation.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    metrics::IngestMetrics,
    pipeline::{service::DocumentPipeline, types::PipelineError},
    queue::{JobDescriptor, JobSource, QueueError, StatusEvent, StatusSink, parse_job},
};

/// At-least-once poll → process → commit loop over the uploads topic.
///
/// Jobs are processed serially; failure of one job is reported on the
/// status topic and never affects the next. Offsets are committed only
/// after a whole polled batch is processed, so a crash mid-batch replays
/// completed jobs — deterministic record identity makes the replayed index
/// writes overwrites, and status consumers must tolerate duplicates.
pub struct JobLoop {
    pipeline: DocumentPipeline,
    source: Box<dyn JobSource>,
    sink: Box<dyn StatusSink>,
    metrics: Arc<IngestMetrics>,
}

impl JobLoop {
    /// Wire the loop to its collaborators.
    pub fn new(
        pipeline: DocumentPipeline,
        source: Box<dyn JobSource>,
        sink: Box<dyn StatusSink>,
    ) -> Self {
        Self {
            pipeline,
            source,
            sink,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Counters accumulated across processed jobs.
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Poll and process until the process is stopped.
    pub async fn run(&self) {
        tracing::info!("Waiting for upload notifications");
        loop {
            if let Err(error) = self.poll_once().await {
                tracing::error!(error = %error, "Polling job source failed");
                // Pause so a broken broker connection does not spin hot.
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    /// Poll one batch, process every message serially, then commit progress.
    pub async fn poll_once(&self) -> Result<(), QueueError> {
        let messages = self.source.poll().await?;
        if messages.is_empty() {
            return Ok(());
        }

        for payload in &messages {
            match parse_job(payload) {
                Ok(job) => self.handle_job(job).await,
                Err(error) => {
                    tracing::error!(error = %error, "Skipping malformed job message");
                }
            }
        }

        self.source.commit().await?;
        tracing::debug!(metrics = ?self.metrics.snapshot(), "Batch committed");
        Ok(())
    }

    /// Run one job through the pipeline and publish its terminal status.
    async fn handle_job(&self, job: JobDescriptor) {
        tracing::info!(document = %job.id, blob = %job.blob_name, "Received upload notification");

        let event = match self.pipeline.process(&job).await {
            Ok(outcome) => {
                self.metrics.record_completed(
                    outcome.chunks_processed as u64,
                    outcome.records_dropped as u64,
                );
                tracing::info!(
                    document = %job.id,
                    chunks = outcome.chunks_processed,
                    degraded = outcome.embeddings_degraded,
                    written = outcome.records_written,
                    dropped = outcome.records_dropped,
                    "Document processed"
                );
                StatusEvent::completed(&job.id, outcome.chunks_processed, outcome.records_dropped)
            }
            Err(error) => {
                self.metrics.record_failed();
                tracing::error!(document = %job.id, error = %error, "Document processing failed");
                StatusEvent::failed(&job.id, describe_failure(&job, &error))
            }
        };

        if let Err(error) = self.sink.publish(&event).await {
            tracing::error!(document = %job.id, error = %error, "Failed to publish status event");
        }
    }
}

fn describe_failure(job: &JobDescriptor, error: &PipelineError) -> String {
    match error {
        PipelineError::Fetch(source) => format!("Failed to download PDF: {source}"),
        PipelineError::Extraction(source) => {
            format!("Failed to process {}: {source}", job.blob_name)
        }
    }
}
