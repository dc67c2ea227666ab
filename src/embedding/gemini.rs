//! Gemini batch embedding client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::embedding::{EmbeddingClient, EmbeddingError};

/// HTTP client for the Gemini batch embedding endpoint.
pub struct GeminiEmbeddingClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbeddingClient {
    /// Construct a client from configuration.
    pub fn new(config: &Config) -> Result<Self, EmbeddingError> {
        let client = Client::builder().user_agent("pdfingest/0.1").build()?;
        tracing::debug!(
            model = %config.embedding_model,
            endpoint = %config.gemini_endpoint,
            "Initialized embedding client"
        );
        Ok(Self {
            client,
            base_url: config.gemini_endpoint.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.embedding_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:batchEmbedContents", self.base_url, self.model)
    }
}

#[async_trait]
impl EmbeddingClient for GeminiEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model_path = format!("models/{}", self.model);
        let requests: Vec<_> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": model_path,
                    "content": { "parts": [ { "text": text } ] },
                    "taskType": "RETRIEVAL_DOCUMENT",
                })
            })
            .collect();

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let payload: BatchEmbedResponse = response.json().await?;
        if payload.embeddings.len() != texts.len() {
            return Err(EmbeddingError::Provider(format!(
                "provider returned {} vectors for {} inputs",
                payload.embeddings.len(),
                texts.len()
            )));
        }
        Ok(payload
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }
}

fn classify_failure(status: StatusCode, body: String) -> EmbeddingError {
    let lowered = body.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("rate limit")
        || lowered.contains("resource_exhausted")
    {
        EmbeddingError::RateLimited(format!("{status}: {body}"))
    } else {
        EmbeddingError::Provider(format!("{status}: {body}"))
    }
}
