//! HTTP client for the Pinecone control and data planes.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::index::{IndexError, IndexRecord, VectorIndex};

/// Client bound to one index, created lazily when absent.
pub struct PineconeIndex {
    pub(crate) client: Client,
    pub(crate) data_url: String,
    pub(crate) api_key: String,
}

#[derive(Deserialize)]
struct IndexModel {
    host: String,
}

impl PineconeIndex {
    /// Resolve the index host, creating the index when it does not exist.
    pub async fn connect(config: &Config) -> Result<Self, IndexError> {
        let client = Client::builder().user_agent("pdfingest/0.1").build()?;
        let control_url = config.pinecone_endpoint.trim_end_matches('/').to_string();
        let host = resolve_host(
            &client,
            &control_url,
            &config.pinecone_api_key,
            &config.pinecone_index_name,
            config.embedding_dimension,
        )
        .await?;
        let data_url = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        tracing::debug!(
            index = %config.pinecone_index_name,
            url = %data_url,
            "Connected to vector index"
        );
        Ok(Self {
            client,
            data_url,
            api_key: config.pinecone_api_key.clone(),
        })
    }
}

async fn resolve_host(
    client: &Client,
    control_url: &str,
    api_key: &str,
    index_name: &str,
    dimension: usize,
) -> Result<String, IndexError> {
    let described = client
        .get(format!("{control_url}/indexes/{index_name}"))
        .header("Api-Key", api_key)
        .send()
        .await?;
    match described.status() {
        status if status.is_success() => {
            let model: IndexModel = described.json().await?;
            return Ok(model.host);
        }
        StatusCode::NOT_FOUND => {}
        status => {
            let body = described.text().await.unwrap_or_default();
            return Err(IndexError::UnexpectedStatus { status, body });
        }
    }

    tracing::info!(index = index_name, dimension, "Creating vector index");
    let body = json!({
        "name": index_name,
        "dimension": dimension,
        "metric": "cosine",
        "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
    });
    let created = client
        .post(format!("{control_url}/indexes"))
        .header("Api-Key", api_key)
        .json(&body)
        .send()
        .await?;
    if !created.status().is_success() {
        let status = created.status();
        let body = created.text().await.unwrap_or_default();
        return Err(IndexError::UnexpectedStatus { status, body });
    }
    let model: IndexModel = created.json().await?;
    Ok(model.host)
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), IndexError> {
        if records.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.data_url))
            .header("Api-Key", &self.api_key)
            .json(&json!({ "vectors": records }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(records = records.len(), "Records upserted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let lowered = body.to_lowercase();
        if status == StatusCode::TOO_MANY_REQUESTS
            || lowered.contains("quota")
            || lowered.contains("limit")
        {
            Err(IndexError::RateLimited(format!("{status}: {body}")))
        } else {
            Err(IndexError::UnexpectedStatus { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RecordMetadata;
    use httpmock::{Method::GET, Method::POST, MockServer};

    fn test_index(data_url: String) -> PineconeIndex {
        PineconeIndex {
            client: Client::builder()
                .user_agent("pdfingest-test")
                .build()
                .expect("client"),
            data_url,
            api_key: "test-key".into(),
        }
    }

    fn sample_records(count: usize) -> Vec<IndexRecord> {
        (0..count)
            .map(|index| IndexRecord {
                record_id: IndexRecord::record_id("doc1", index),
                vector: vec![0.1, 0.2],
                metadata: RecordMetadata {
                    text: format!("chunk {index}"),
                    source_id: "doc1".into(),
                    page: 0,
                },
            })
            .collect()
    }

    #[tokio::test]
    async fn connect_reuses_existing_index() {
        let server = MockServer::start_async().await;
        let describe = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/indexes/pdf-embeddings")
                    .header("Api-Key", "test-key");
                then.status(200)
                    .json_body(json!({ "name": "pdf-embeddings", "host": "https://data.example" }));
            })
            .await;

        let client = Client::builder().user_agent("t").build().unwrap();
        let host = resolve_host(&client, &server.base_url(), "test-key", "pdf-embeddings", 768)
            .await
            .expect("host resolves");

        describe.assert();
        assert_eq!(host, "https://data.example");
    }

    #[tokio::test]
    async fn connect_creates_missing_index_with_cosine_metric() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes/pdf-embeddings");
                then.status(404).body("index not found");
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/indexes")
                    .header("Api-Key", "test-key")
                    .body_contains("\"metric\":\"cosine\"")
                    .body_contains("\"dimension\":768");
                then.status(201)
                    .json_body(json!({ "name": "pdf-embeddings", "host": "data.example" }));
            })
            .await;

        let client = Client::builder().user_agent("t").build().unwrap();
        let host = resolve_host(&client, &server.base_url(), "test-key", "pdf-embeddings", 768)
            .await
            .expect("index created");

        create.assert();
        assert_eq!(host, "data.example");
    }

    #[tokio::test]
    async fn upsert_posts_records_to_data_plane() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vectors/upsert")
                    .header("Api-Key", "test-key")
                    .body_contains("doc1-0");
                then.status(200).json_body(json!({ "upsertedCount": 2 }));
            })
            .await;

        let index = test_index(server.base_url());
        index
            .upsert(&sample_records(2))
            .await
            .expect("upsert succeeds");
        mock.assert();
    }

    #[tokio::test]
    async fn upsert_classifies_quota_errors_as_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(429).body("write quota exceeded");
            })
            .await;

        let index = test_index(server.base_url());
        let error = index.upsert(&sample_records(1)).await.unwrap_err();
        assert!(error.is_rate_limited());
    }
}
