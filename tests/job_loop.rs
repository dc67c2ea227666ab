//! End-to-end exercise of the job loop with substitutes at every seam.

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdfingest::blobstore::{BlobStore, FetchError, ScopedBlob};
use pdfingest::config::Config;
use pdfingest::embedding::{EmbeddingClient, EmbeddingError};
use pdfingest::index::{IndexError, IndexRecord, VectorIndex};
use pdfingest::pipeline::{DocumentPipeline, ExtractionError, JobLoop, TextExtractor};
use pdfingest::queue::{JobSource, JobStatus, QueueError, StatusEvent, StatusSink};
use tempfile::NamedTempFile;

fn test_config() -> Config {
    Config {
        kafka_bootstrap_servers: "localhost:9092".into(),
        uploads_topic: "pdf-uploads".into(),
        status_topic: "pdf-processing-status".into(),
        consumer_group: "pdf-processor".into(),
        poll_timeout_ms: 100,
        gcs_bucket_name: "uploads".into(),
        gcs_endpoint: "http://127.0.0.1:1".into(),
        gcs_auth_token: None,
        gemini_api_key: "test".into(),
        gemini_endpoint: "http://127.0.0.1:1".into(),
        embedding_model: "embedding-001".into(),
        embedding_dimension: 4,
        embed_batch_size: 16,
        pinecone_api_key: "test".into(),
        pinecone_endpoint: "http://127.0.0.1:1".into(),
        pinecone_index_name: "pdf-embeddings".into(),
        upsert_batch_size: 50,
        chunk_size: 512,
        chunk_overlap: 50,
    }
}

struct FakeBlobStore {
    known_blobs: Vec<String>,
    fetches: Arc<AtomicUsize>,
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn fetch(&self, blob_name: &str) -> Result<ScopedBlob, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.known_blobs.iter().any(|known| known == blob_name) {
            return Err(FetchError::NotFound(blob_name.to_string()));
        }
        let mut file = NamedTempFile::new()?;
        file.write_all(b"%PDF-1.4 stub")?;
        Ok(ScopedBlob::new(file))
    }
}

struct FakeExtractor {
    pages: Result<Vec<String>, String>,
    calls: Arc<AtomicUsize>,
}

impl TextExtractor for FakeExtractor {
    fn extract(&self, _path: &Path) -> Result<Vec<String>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.pages {
            Ok(pages) => Ok(pages.clone()),
            Err(message) => Err(ExtractionError::Parse(message.clone())),
        }
    }
}

struct FakeEmbedder {
    dimension: usize,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| vec![0.5; self.dimension]).collect())
    }
}

struct RecordingIndex {
    records: Arc<Mutex<Vec<IndexRecord>>>,
    fail_writes: bool,
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), IndexError> {
        if self.fail_writes {
            return Err(IndexError::UnexpectedStatus {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "index offline".into(),
            });
        }
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }
}

struct ScriptedSource {
    batches: Mutex<VecDeque<Vec<Vec<u8>>>>,
    commits: Arc<AtomicUsize>,
}

#[async_trait]
impl JobSource for ScriptedSource {
    async fn poll(&self) -> Result<Vec<Vec<u8>>, QueueError> {
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn commit(&self) -> Result<(), QueueError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct RecordingSink {
    events: Arc<Mutex<Vec<StatusEvent>>>,
}

#[async_trait]
impl StatusSink for RecordingSink {
    async fn publish(&self, event: &StatusEvent) -> Result<(), QueueError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct Harness {
    job_loop: JobLoop,
    records: Arc<Mutex<Vec<IndexRecord>>>,
    events: Arc<Mutex<Vec<StatusEvent>>>,
    commits: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
    extract_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
}

fn harness(
    known_blobs: &[&str],
    pages: Result<Vec<String>, String>,
    batches: Vec<Vec<Vec<u8>>>,
    fail_writes: bool,
) -> Harness {
    let records = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let commits = Arc::new(AtomicUsize::new(0));
    let fetches = Arc::new(AtomicUsize::new(0));
    let extract_calls = Arc::new(AtomicUsize::new(0));
    let embed_calls = Arc::new(AtomicUsize::new(0));

    let config = test_config();
    let pipeline = DocumentPipeline::new(
        Box::new(FakeBlobStore {
            known_blobs: known_blobs.iter().map(|name| name.to_string()).collect(),
            fetches: Arc::clone(&fetches),
        }),
        Box::new(FakeExtractor {
            pages,
            calls: Arc::clone(&extract_calls),
        }),
        Box::new(FakeEmbedder {
            dimension: config.embedding_dimension,
            calls: Arc::clone(&embed_calls),
        }),
        Box::new(RecordingIndex {
            records: Arc::clone(&records),
            fail_writes,
        }),
        &config,
    );

    let job_loop = JobLoop::new(
        pipeline,
        Box::new(ScriptedSource {
            batches: Mutex::new(batches.into()),
            commits: Arc::clone(&commits),
        }),
        Box::new(RecordingSink {
            events: Arc::clone(&events),
        }),
    );

    Harness {
        job_loop,
        records,
        events,
        commits,
        fetches,
        extract_calls,
        embed_calls,
    }
}

fn upload_message(id: &str, filename: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "id": id, "filename": filename })).unwrap()
}

#[tokio::test]
async fn processes_document_end_to_end() {
    let harness = harness(
        &["doc1.pdf"],
        Ok(vec!["a".into(), "b".into(), "c".into()]),
        vec![vec![upload_message("doc1", "doc1.pdf")]],
        false,
    );

    harness.job_loop.poll_once().await.expect("poll succeeds");

    let records = harness.records.lock().unwrap();
    let ids: Vec<&str> = records.iter().map(|record| record.record_id.as_str()).collect();
    assert_eq!(ids, vec!["doc1-0", "doc1-1", "doc1-2"]);
    assert!(records.iter().all(|record| record.metadata.source_id == "doc1"));
    assert_eq!(records[2].metadata.page, 2);

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "doc1");
    assert_eq!(events[0].status, JobStatus::Completed);
    assert_eq!(events[0].chunks_processed, Some(3));
    assert_eq!(events[0].records_dropped, None);
    assert_eq!(events[0].error, None);

    assert_eq!(harness.commits.load(Ordering::SeqCst), 1);

    let snapshot = harness.job_loop.metrics().snapshot();
    assert_eq!(snapshot.documents_completed, 1);
    assert_eq!(snapshot.chunks_indexed, 3);
}

#[tokio::test]
async fn fetch_failure_reports_failed_without_running_later_stages() {
    let harness = harness(
        &[],
        Ok(vec!["unused".into()]),
        vec![vec![upload_message("doc1", "missing.pdf")]],
        false,
    );

    harness.job_loop.poll_once().await.expect("poll succeeds");

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, JobStatus::Failed);
    let error = events[0].error.as_deref().expect("failure reason");
    assert!(error.starts_with("Failed to download PDF:"), "got: {error}");
    assert!(error.contains("missing.pdf"));

    assert_eq!(harness.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(harness.extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.embed_calls.load(Ordering::SeqCst), 0);
    assert!(harness.records.lock().unwrap().is_empty());
    assert_eq!(harness.commits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_message_does_not_halt_the_batch() {
    let harness = harness(
        &["doc2.pdf"],
        Ok(vec!["text".into()]),
        vec![vec![
            b"definitely not json".to_vec(),
            upload_message("doc2", "doc2.pdf"),
        ]],
        false,
    );

    harness.job_loop.poll_once().await.expect("poll succeeds");

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1, "only the valid message yields an event");
    assert_eq!(events[0].id, "doc2");
    assert_eq!(events[0].status, JobStatus::Completed);
    assert_eq!(harness.commits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_document_completes_with_zero_chunks() {
    let harness = harness(
        &["empty.pdf"],
        Ok(Vec::new()),
        vec![vec![upload_message("doc3", "empty.pdf")]],
        false,
    );

    harness.job_loop.poll_once().await.expect("poll succeeds");

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, JobStatus::Completed);
    assert_eq!(events[0].chunks_processed, Some(0));
    assert_eq!(harness.embed_calls.load(Ordering::SeqCst), 0);
    assert!(harness.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dropped_index_writes_still_complete_the_job() {
    let harness = harness(
        &["doc4.pdf"],
        Ok(vec!["a".into(), "b".into(), "c".into()]),
        vec![vec![upload_message("doc4", "doc4.pdf")]],
        true,
    );

    harness.job_loop.poll_once().await.expect("poll succeeds");

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, JobStatus::Completed);
    assert_eq!(events[0].chunks_processed, Some(3));
    assert_eq!(events[0].records_dropped, Some(3));
    assert!(harness.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn extraction_failure_reports_the_failing_document() {
    let harness = harness(
        &["corrupt.pdf"],
        Err("unexpected token in xref table".into()),
        vec![vec![upload_message("doc5", "corrupt.pdf")]],
        false,
    );

    harness.job_loop.poll_once().await.expect("poll succeeds");

    let events = harness.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, JobStatus::Failed);
    let error = events[0].error.as_deref().expect("failure reason");
    assert!(error.contains("corrupt.pdf"));
    assert!(error.contains("unexpected token"));
    assert_eq!(harness.embed_calls.load(Ordering::SeqCst), 0);
}
