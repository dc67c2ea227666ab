#![deny(missing_docs)]

//! Core library for the PDF ingestion pipeline.

/// Scoped retrieval of uploaded blobs from object storage.
pub mod blobstore;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and batch embedding policy.
pub mod embedding;
/// Vector index client and batched upsert policy.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document pipeline and the consume/dispatch/report loop.
pub mod pipeline;
/// Job source and status sink integration.
pub mod queue;
