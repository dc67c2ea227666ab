//! Kafka-backed job source and status sink.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    ClientConfig, Message,
    consumer::{CommitMode, Consumer, StreamConsumer},
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};

use crate::config::Config;
use crate::queue::{JobSource, QueueError, StatusSink, types::StatusEvent};

/// How long to wait for additional messages once the first has arrived.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(50);

/// Upper bound on messages returned by one poll.
const MAX_BATCH: usize = 32;

/// Consumer subscribed to the uploads topic.
///
/// Auto-commit is disabled; the job loop commits explicitly after a whole
/// batch is processed. Horizontal scaling comes from running more instances
/// in the same consumer group.
pub struct KafkaJobSource {
    consumer: StreamConsumer,
    poll_timeout: Duration,
}

impl KafkaJobSource {
    /// Subscribe to the uploads topic using the configured consumer group.
    pub fn new(config: &Config) -> Result<Self, QueueError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_bootstrap_servers)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()?;
        consumer.subscribe(&[config.uploads_topic.as_str()])?;
        tracing::debug!(
            servers = %config.kafka_bootstrap_servers,
            topic = %config.uploads_topic,
            group = %config.consumer_group,
            "Initialized Kafka consumer"
        );
        Ok(Self {
            consumer,
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
        })
    }
}

#[async_trait]
impl JobSource for KafkaJobSource {
    async fn poll(&self) -> Result<Vec<Vec<u8>>, QueueError> {
        let mut payloads = Vec::new();

        let first = match tokio::time::timeout(self.poll_timeout, self.consumer.recv()).await {
            Ok(received) => received?,
            Err(_) => return Ok(payloads),
        };
        payloads.push(first.payload().unwrap_or_default().to_vec());

        // Drain whatever else is already buffered, up to the batch cap.
        while payloads.len() < MAX_BATCH {
            match tokio::time::timeout(DRAIN_TIMEOUT, self.consumer.recv()).await {
                Ok(Ok(message)) => payloads.push(message.payload().unwrap_or_default().to_vec()),
                Ok(Err(error)) => return Err(error.into()),
                Err(_) => break,
            }
        }

        Ok(payloads)
    }

    async fn commit(&self) -> Result<(), QueueError> {
        self.consumer.commit_consumer_state(CommitMode::Sync)?;
        Ok(())
    }
}

/// Producer publishing status events to the status topic.
pub struct KafkaStatusSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaStatusSink {
    /// Build a producer for the status topic.
    pub fn new(config: &Config) -> Result<Self, QueueError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_bootstrap_servers)
            .set("message.timeout.ms", "5000")
            .create()?;
        tracing::debug!(
            servers = %config.kafka_bootstrap_servers,
            topic = %config.status_topic,
            "Initialized Kafka producer"
        );
        Ok(Self {
            producer,
            topic: config.status_topic.clone(),
        })
    }
}

#[async_trait]
impl StatusSink for KafkaStatusSink {
    async fn publish(&self, event: &StatusEvent) -> Result<(), QueueError> {
        let payload = serde_json::to_vec(event)?;
        self.producer
            .send(
                FutureRecord::to(&self.topic)
                    .key(&event.id)
                    .payload(&payload),
                Timeout::After(Duration::from_secs(5)),
            )
            .await
            .map_err(|(error, _)| QueueError::Kafka(error))?;
        tracing::debug!(document = %event.id, status = ?event.status, "Status event published");
        Ok(())
    }
}
