//! Vector index client and batched upsert policy.

pub mod pinecone;
pub mod types;
pub mod upserter;

pub use pinecone::PineconeIndex;
pub use types::{IndexError, IndexRecord, RecordMetadata};
pub use upserter::{UpsertPolicy, UpsertReport, upsert_all};

use async_trait::async_trait;

/// Write access to the vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Write one batch of records in a single index call.
    ///
    /// Records with an already-stored id overwrite the existing entry, so
    /// reprocessing a document replaces rather than duplicates its vectors.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), IndexError>;
}
