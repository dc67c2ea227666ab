use std::env;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the ingestion pipeline.
///
/// Loaded once at startup and handed to each collaborator constructor; no
/// global state is kept, so tests can build a `Config` literal directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Broker addresses for the job source and status sink.
    pub kafka_bootstrap_servers: String,
    /// Topic carrying upload notifications.
    pub uploads_topic: String,
    /// Topic receiving per-document status events.
    pub status_topic: String,
    /// Consumer group shared by competing pipeline instances.
    pub consumer_group: String,
    /// Bounded wait for new messages, in milliseconds.
    pub poll_timeout_ms: u64,
    /// Bucket holding uploaded PDFs.
    pub gcs_bucket_name: String,
    /// Object store endpoint; overridable for emulators.
    pub gcs_endpoint: String,
    /// Optional bearer token for object store reads.
    pub gcs_auth_token: Option<String>,
    /// Embedding provider credential.
    pub gemini_api_key: String,
    /// Embedding provider endpoint; overridable for tests.
    pub gemini_endpoint: String,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Number of texts submitted per embedding call.
    pub embed_batch_size: usize,
    /// Vector index credential.
    pub pinecone_api_key: String,
    /// Vector index control-plane endpoint; overridable for tests.
    pub pinecone_endpoint: String,
    /// Name of the index holding document vectors.
    pub pinecone_index_name: String,
    /// Number of records submitted per index write.
    pub upsert_batch_size: usize,
    /// Upper bound on chunk length, in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Config {
    /// Load a `.env` file when present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            kafka_bootstrap_servers: load_env("KAFKA_BOOTSTRAP_SERVERS")?,
            uploads_topic: load_env_or("PDF_UPLOADS_TOPIC", "pdf-uploads"),
            status_topic: load_env_or("PDF_STATUS_TOPIC", "pdf-processing-status"),
            consumer_group: load_env_or("KAFKA_CONSUMER_GROUP", "pdf-processor"),
            poll_timeout_ms: load_env_parsed("POLL_TIMEOUT_MS", 1000)?,
            gcs_bucket_name: load_env("GCS_BUCKET_NAME")?,
            gcs_endpoint: load_env_or("GCS_ENDPOINT", "https://storage.googleapis.com"),
            gcs_auth_token: load_env_optional("GCS_AUTH_TOKEN"),
            gemini_api_key: load_env("GEMINI_API_KEY")?,
            gemini_endpoint: load_env_or(
                "GEMINI_ENDPOINT",
                "https://generativelanguage.googleapis.com",
            ),
            embedding_model: load_env_or("EMBEDDING_MODEL", "embedding-001"),
            embedding_dimension: load_env_parsed("EMBEDDING_DIMENSION", 768)?,
            embed_batch_size: load_env_parsed("EMBED_BATCH_SIZE", 16)?,
            pinecone_api_key: load_env("PINECONE_API_KEY")?,
            pinecone_endpoint: load_env_or("PINECONE_ENDPOINT", "https://api.pinecone.io"),
            pinecone_index_name: load_env_or("PINECONE_INDEX_NAME", "pdf-embeddings"),
            upsert_batch_size: load_env_parsed("UPSERT_BATCH_SIZE", 50)?,
            chunk_size: load_env_parsed("CHUNK_SIZE", 512)?,
            chunk_overlap: load_env_parsed("CHUNK_OVERLAP", 50)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(ConfigError::InvalidValue("EMBED_BATCH_SIZE".into()));
        }
        if self.upsert_batch_size == 0 {
            return Err(ConfigError::InvalidValue("UPSERT_BATCH_SIZE".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidValue("CHUNK_OVERLAP".into()));
        }
        Ok(())
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}
