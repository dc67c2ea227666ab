//! Core data types and error definitions for the ingestion pipeline.

use thiserror::Error;

use crate::blobstore::FetchError;

/// A bounded slice of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// Zero-based page the text was extracted from.
    pub page: usize,
    /// Position of the chunk within its document, 0-based and stable.
    ///
    /// Record identity derives from this index, so it must not change when
    /// the same document is reprocessed.
    pub index: usize,
}

/// Errors produced while extracting text from a fetched document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Document could not be parsed as a PDF.
    #[error("failed to extract text from PDF: {0}")]
    Parse(String),
}

/// Errors that terminate one job's pipeline run.
///
/// Embedding and index failures never appear here: they are absorbed at
/// batch granularity and degrade the result instead of failing the job.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Blob could not be materialized locally.
    #[error("Failed to download PDF: {0}")]
    Fetch(#[from] FetchError),
    /// Text extraction failed for the fetched document.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Summary of one successfully processed document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobOutcome {
    /// Number of chunks produced for the document.
    pub chunks_processed: usize,
    /// Chunk positions degraded to zero-vector placeholders.
    pub embeddings_degraded: usize,
    /// Records acknowledged by the index.
    pub records_written: usize,
    /// Records dropped by the best-effort write policy.
    pub records_dropped: usize,
}
