//! PDF text extraction behind a substitutable seam.

use std::path::Path;

use crate::pipeline::types::ExtractionError;

/// Produces per-page text for a fetched document.
///
/// Kept as a trait so the job loop can be exercised without real PDF bytes.
pub trait TextExtractor: Send + Sync {
    /// Extract page-ordered text from the document at `path`.
    fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;
}

/// Extractor backed by the `pdf-extract` crate.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        pdf_extract::extract_text_by_pages(path)
            .map_err(|error| ExtractionError::Parse(error.to_string()))
    }
}
