use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm_client::LlmError;
use crate::render::RenderError;

pub const JOB_DESCRIPTION_REQUIRED: &str = "Job description is required";
pub const RESUME_REQUIRED: &str = "Resume text or PDF file is required";

const UPSTREAM_PREFIX: &str = "Failed to generate tailored resume. ";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every response body has the shape `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input missing: {0}")]
    InputMissing(&'static str),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("No session")]
    NoSession,

    #[error("No tailored resume stored for session")]
    NoTailoredResume,

    #[error("PDF render error: {0}")]
    PdfRender(#[from] RenderError),

    #[error("Malformed form: {0}")]
    MalformedForm(String),

    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InputMissing(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::Extraction(e) => {
                tracing::warn!("Resume extraction failed: {e}");
                (
                    StatusCode::BAD_REQUEST,
                    "Failed to parse PDF file".to_string(),
                )
            }
            AppError::Upstream(e) => {
                tracing::error!("Tailoring call failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, upstream_message(e))
            }
            AppError::NoSession => (
                StatusCode::BAD_REQUEST,
                "No session found. Please generate a resume first.".to_string(),
            ),
            AppError::NoTailoredResume => (
                StatusCode::BAD_REQUEST,
                "No tailored resume found. Please generate one first.".to_string(),
            ),
            AppError::PdfRender(e) => {
                tracing::error!("PDF render failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate PDF".to_string(),
                )
            }
            AppError::MalformedForm(detail) => {
                tracing::warn!("Rejected form body: {detail}");
                (StatusCode::BAD_REQUEST, "Invalid form data".to_string())
            }
            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "File size too large. Maximum size is {}.",
                    human_size(*limit)
                ),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Composes the user-facing message for a failed tailoring call.
/// Upstream-provided text wins over the fixed per-kind hint.
fn upstream_message(error: &LlmError) -> String {
    if let Some(upstream) = error.upstream_message() {
        return format!("{UPSTREAM_PREFIX}{upstream}");
    }
    let hint = match error {
        LlmError::AuthenticationFailed { .. } => {
            "Authentication failed. Please check your API key."
        }
        LlmError::RateLimited { .. } => "Rate limit exceeded. Please try again later.",
        _ => "Please try again later.",
    };
    format!("{UPSTREAM_PREFIX}{hint}")
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
