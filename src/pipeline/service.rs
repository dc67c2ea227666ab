//! Per-job pipeline coordinating fetch, extraction, chunking, embedding,
//! and index writes.

use crate::{
    blobstore::BlobStore,
    config::Config,
    embedding::{BatchPolicy, EmbeddingClient, embed_all},
    index::{IndexRecord, RecordMetadata, UpsertPolicy, VectorIndex, upsert_all},
    pipeline::{
        chunking::chunk_pages,
        extract::TextExtractor,
        types::{Chunk, JobOutcome, PipelineError},
    },
    queue::JobDescriptor,
};

/// Runs the fetch → chunk → embed → upsert stages for one document at a time.
///
/// All collaborators are injected at construction, so the pipeline holds no
/// global state and tests can substitute fakes at every seam. Construct the
/// pipeline once near process start and hand it to the job loop.
pub struct DocumentPipeline {
    blob_store: Box<dyn BlobStore>,
    extractor: Box<dyn TextExtractor>,
    embedding_client: Box<dyn EmbeddingClient>,
    vector_index: Box<dyn VectorIndex>,
    batch_policy: BatchPolicy,
    upsert_policy: UpsertPolicy,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentPipeline {
    /// Assemble the pipeline from injected collaborators and configuration.
    pub fn new(
        blob_store: Box<dyn BlobStore>,
        extractor: Box<dyn TextExtractor>,
        embedding_client: Box<dyn EmbeddingClient>,
        vector_index: Box<dyn VectorIndex>,
        config: &Config,
    ) -> Self {
        Self {
            blob_store,
            extractor,
            embedding_client,
            vector_index,
            batch_policy: BatchPolicy::from_config(config),
            upsert_policy: UpsertPolicy::from_config(config),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Process one job to completion.
    ///
    /// The scoped local file is removed when this returns, success or
    /// failure. A document with no extractable text completes with a zero
    /// chunk count rather than failing.
    pub async fn process(&self, job: &JobDescriptor) -> Result<JobOutcome, PipelineError> {
        let blob = self.blob_store.fetch(&job.blob_name).await?;
        tracing::info!(document = %job.id, blob = %job.blob_name, "Processing document");

        let pages = self.extractor.extract(blob.path())?;
        let chunks = chunk_pages(&pages, self.chunk_size, self.chunk_overlap);
        if chunks.is_empty() {
            tracing::warn!(document = %job.id, "No text extracted from document");
            return Ok(JobOutcome::default());
        }
        tracing::info!(document = %job.id, chunks = chunks.len(), "Split document into chunks");

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let report = embed_all(self.embedding_client.as_ref(), &texts, &self.batch_policy).await;
        if !report.degraded.is_empty() {
            tracing::warn!(
                document = %job.id,
                degraded = report.degraded_count(),
                "Some chunks carry zero-vector placeholders"
            );
        }

        let embeddings_degraded = report.degraded_count();
        let records = build_records(&job.id, chunks, report.vectors);
        let upserts = upsert_all(self.vector_index.as_ref(), &records, &self.upsert_policy).await;

        Ok(JobOutcome {
            chunks_processed: records.len(),
            embeddings_degraded,
            records_written: upserts.written,
            records_dropped: upserts.dropped,
        })
    }
}

/// Pair chunks with their vectors and stamp deterministic record ids.
fn build_records(document_id: &str, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Vec<IndexRecord> {
    debug_assert_eq!(chunks.len(), vectors.len());
    chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexRecord {
            record_id: IndexRecord::record_id(document_id, chunk.index),
            vector,
            metadata: RecordMetadata {
                text: chunk.text,
                source_id: document_id.to_string(),
                page: chunk.page,
            },
        })
        .collect()
}
