use anyhow::Context;
use pdfingest::{
    blobstore::GcsBlobStore,
    config::Config,
    embedding::GeminiEmbeddingClient,
    index::PineconeIndex,
    logging,
    pipeline::{DocumentPipeline, JobLoop, PdfTextExtractor},
    queue::{KafkaJobSource, KafkaStatusSink},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    logging::init_tracing();
    tracing::info!("PDF processor starting up");

    let blob_store = GcsBlobStore::new(&config).context("Failed to initialize blob store")?;
    let embedding_client =
        GeminiEmbeddingClient::new(&config).context("Failed to initialize embedding client")?;
    let vector_index = PineconeIndex::connect(&config)
        .await
        .context("Failed to initialize vector index")?;
    let source = KafkaJobSource::new(&config).context("Failed to initialize Kafka consumer")?;
    let sink = KafkaStatusSink::new(&config).context("Failed to initialize Kafka producer")?;

    let pipeline = DocumentPipeline::new(
        Box::new(blob_store),
        Box::new(PdfTextExtractor),
        Box::new(embedding_client),
        Box::new(vector_index),
        &config,
    );

    JobLoop::new(pipeline, Box::new(source), Box::new(sink))
        .run()
        .await;
    Ok(())
}
