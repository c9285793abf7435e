use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{Config, RendererKind, SessionBackend};
use crate::extract::{PdfTextExtractor, ResumeExtractor};
use crate::llm_client::LlmClient;
use crate::render::{BuiltinPdfRenderer, PdfRenderer, WkHtmlToPdfRenderer};
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Pluggable session storage. Selected via SESSION_BACKEND.
    pub sessions: Arc<dyn SessionStore>,
    pub extractor: Arc<dyn ResumeExtractor>,
    /// Pluggable HTML-to-PDF backend. Selected via PDF_RENDERER.
    pub renderer: Arc<dyn PdfRenderer>,
    pub config: Config,
}

impl AppState {
    /// Builds every backend named by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_base_url)
            .context("Failed to build HTTP client for the completion service")?;

        let sessions: Arc<dyn SessionStore> = match config.session_backend {
            SessionBackend::File => Arc::new(FileSessionStore::new(config.session_dir.clone())),
            SessionBackend::Memory => Arc::new(MemorySessionStore::new(Duration::from_secs(
                config.session_ttl_secs,
            ))),
        };

        let renderer: Arc<dyn PdfRenderer> = match config.pdf_renderer {
            RendererKind::Builtin => Arc::new(BuiltinPdfRenderer),
            RendererKind::WkHtmlToPdf => {
                Arc::new(WkHtmlToPdfRenderer::new(config.wkhtmltopdf_path.clone()))
            }
        };

        Ok(AppState {
            llm,
            sessions,
            extractor: Arc::new(PdfTextExtractor),
            renderer,
            config,
        })
    }
}
