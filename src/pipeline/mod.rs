//! Document pipeline: extraction, chunking, per-job orchestration, and the
//! consume/dispatch/report loop.

pub mod chunking;
pub mod extract;
mod runner;
mod service;
pub mod types;

pub use extract::{PdfTextExtractor, TextExtractor};
pub use runner::JobLoop;
pub use service::DocumentPipeline;
pub use types::{Chunk, ExtractionError, JobOutcome, PipelineError};
