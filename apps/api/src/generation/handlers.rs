//! Axum route handlers for the generate/accept API.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::debug;

use crate::errors::AppError;
use crate::generation::accept::{accept_tailored_resume, DOWNLOAD_FILENAME};
use crate::generation::generator::{generate_tailored_resume, GenerateInput, GenerateResponse};
use crate::session::SessionContext;
use crate::state::AppState;

const FIELD_RESUME_TEXT: &str = "resume";
const FIELD_RESUME_FILE: &str = "resumeFile";
const FIELD_JOB: &str = "job";

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
///
/// Multipart fields: `resume` (text), `resumeFile` (PDF), `job` (text).
/// Returns `{original, tailored}` with `<br>` line breaks.
pub async fn handle_generate(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::MalformedForm(e.body_text()))?;
    let input = read_generate_form(multipart, state.config.max_upload_bytes).await?;

    let session_id = session.as_ref().map(|Extension(ctx)| &ctx.id);
    let response = generate_tailored_resume(
        &state.llm,
        state.extractor.as_ref(),
        state.sessions.as_ref(),
        session_id,
        input,
    )
    .await?;

    Ok(Json(response))
}

/// POST /api/accept
///
/// Renders the session's tailored resume as a PDF attachment and clears the record.
pub async fn handle_accept(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
) -> Result<Response, AppError> {
    let session = session.map(|Extension(ctx)| ctx);
    let pdf = accept_tailored_resume(
        state.sessions.as_ref(),
        state.renderer.as_ref(),
        session.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={DOWNLOAD_FILENAME}"),
            ),
        ],
        pdf,
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Form parsing
// ────────────────────────────────────────────────────────────────────────────

/// Reads the generate form. Unknown parts are skipped. An empty `resumeFile`
/// part (what browsers send when no file is picked) counts as no file.
async fn read_generate_form(
    mut multipart: Multipart,
    limit: usize,
) -> Result<GenerateInput, AppError> {
    let mut input = GenerateInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FIELD_RESUME_TEXT) => {
                input.resume_text = Some(field.text().await.map_err(|e| form_error(e, limit))?);
            }
            Some(FIELD_RESUME_FILE) => {
                let bytes = field.bytes().await.map_err(|e| form_error(e, limit))?;
                if !bytes.is_empty() {
                    input.resume_file = Some(bytes);
                }
            }
            Some(FIELD_JOB) => {
                input.job_description =
                    Some(field.text().await.map_err(|e| form_error(e, limit))?);
            }
            other => debug!("Ignoring unexpected form field {other:?}"),
        }
    }

    debug!(
        "Form parsed: file={}, pasted_len={}, job_len={}",
        input.resume_file.is_some(),
        input.resume_text.as_ref().map_or(0, String::len),
        input.job_description.as_ref().map_or(0, String::len)
    );
    Ok(input)
}

fn form_error(error: MultipartError, limit: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::MalformedForm(error.body_text())
    }
}
