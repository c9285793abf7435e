//! Resume extraction: turns an uploaded PDF into plain text.
//!
//! `AppState` holds an `Arc<dyn ResumeExtractor>`. The default backend is
//! `PdfTextExtractor`; tests swap in deterministic stand-ins.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("malformed PDF: {0}")]
    Malformed(String),

    #[error("PDF decoder aborted: {0}")]
    DecoderPanicked(String),
}

/// Bytes in, text out. A buffer that does not decode as a PDF is an
/// `ExtractionError`; an empty result is not, callers check for blank text.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract_pdf(&self, bytes: Bytes) -> Result<String, ExtractionError>;
}

/// `pdf-extract` backed extractor. Decoding is CPU-bound and runs on the
/// blocking pool; a panic inside the decoder surfaces as an error.
pub struct PdfTextExtractor;

#[async_trait]
impl ResumeExtractor for PdfTextExtractor {
    async fn extract_pdf(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        let size = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractionError::DecoderPanicked(e.to_string()))?
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        debug!(
            "Extracted {} chars from {} byte PDF",
            text.chars().count(),
            size
        );
        Ok(text)
    }
}
