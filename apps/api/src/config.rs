use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Where session records live between a generate call and its accept call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    File,
    Memory,
}

/// Which HTML-to-PDF backend the accept workflow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Builtin,
    WkHtmlToPdf,
}

/// Application configuration loaded from environment variables.
/// Only malformed values abort startup; every variable has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Empty when unset. Generate calls then fail authentication.
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
    pub production: bool,
    pub session_backend: SessionBackend,
    pub session_dir: PathBuf,
    pub session_ttl_secs: u64,
    pub pdf_renderer: RendererKind,
    pub wkhtmltopdf_path: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            production: std::env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            session_backend: parse_session_backend(
                &std::env::var("SESSION_BACKEND").unwrap_or_else(|_| "file".to_string()),
            )?,
            session_dir: std::env::var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            pdf_renderer: parse_renderer(
                &std::env::var("PDF_RENDERER").unwrap_or_else(|_| "builtin".to_string()),
            )?,
            wkhtmltopdf_path: std::env::var("WKHTMLTOPDF_PATH")
                .unwrap_or_else(|_| "wkhtmltopdf".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// Defaults with no environment lookups.
    #[cfg(test)]
    pub fn local() -> Self {
        Config {
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            production: false,
            session_backend: SessionBackend::File,
            session_dir: std::env::temp_dir(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            pdf_renderer: RendererKind::Builtin,
            wkhtmltopdf_path: "wkhtmltopdf".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn parse_session_backend(raw: &str) -> Result<SessionBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "file" => Ok(SessionBackend::File),
        "memory" => Ok(SessionBackend::Memory),
        other => bail!("SESSION_BACKEND must be 'file' or 'memory', got '{other}'"),
    }
}

fn parse_renderer(raw: &str) -> Result<RendererKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "builtin" => Ok(RendererKind::Builtin),
        "wkhtmltopdf" => Ok(RendererKind::WkHtmlToPdf),
        other => bail!("PDF_RENDERER must be 'builtin' or 'wkhtmltopdf', got '{other}'"),
    }
}
