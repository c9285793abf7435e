//! Generate workflow: extract → tailor → persist → format.
//!
//! Flow: check job description → resolve resume text (uploaded PDF wins over
//!       pasted text) → one completion call → best-effort session save →
//!       return both texts with `<br>` line breaks.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{AppError, JOB_DESCRIPTION_REQUIRED, RESUME_REQUIRED};
use crate::extract::ResumeExtractor;
use crate::generation::display::format_for_display;
use crate::generation::prompts::build_tailor_prompt;
use crate::llm_client::LlmClient;
use crate::session::{SessionId, SessionRecord, SessionStore};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Parsed generate form. Every field is optional at this point; the
/// workflow decides what is missing.
#[derive(Debug, Clone, Default)]
pub struct GenerateInput {
    /// Raw bytes of the uploaded PDF. `None` when no file (or an empty part) was sent.
    pub resume_file: Option<Bytes>,
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
}

/// Response body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub original: String,
    pub tailored: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the generate workflow.
///
/// Steps:
/// 1. reject an empty job description
/// 2. resolve resume text: extract the PDF if one was uploaded, else pasted text
/// 3. reject an empty resume
/// 4. single completion call
/// 5. save the (original, tailored) pair under `session`, logging failures
/// 6. return both texts formatted for display
pub async fn generate_tailored_resume(
    llm: &LlmClient,
    extractor: &dyn ResumeExtractor,
    sessions: &dyn SessionStore,
    session: Option<&SessionId>,
    input: GenerateInput,
) -> Result<GenerateResponse, AppError> {
    // Step 1: Job description
    let job_description = input
        .job_description
        .filter(|job| !job.trim().is_empty())
        .ok_or(AppError::InputMissing(JOB_DESCRIPTION_REQUIRED))?;

    // Step 2: Resume text. The file takes precedence over pasted text
    let resume_text = match input.resume_file {
        Some(bytes) => {
            debug!("PDF file detected ({} bytes), extracting", bytes.len());
            let text = extractor.extract_pdf(bytes).await?;
            debug!("PDF parsed, extracted text length: {}", text.len());
            text
        }
        None => input.resume_text.unwrap_or_default(),
    };

    // Step 3: Resume presence
    if resume_text.trim().is_empty() {
        return Err(AppError::InputMissing(RESUME_REQUIRED));
    }

    // Step 4: Tailor
    let prompt = build_tailor_prompt(&resume_text, &job_description);
    debug!("Sending tailoring prompt, length: {}", prompt.len());
    let tailored = llm.complete(&prompt).await?;
    info!("Tailored resume received, length: {}", tailored.len());

    // Step 5: Persist (best-effort)
    if let Some(id) = session {
        let record = SessionRecord {
            original_resume: resume_text.clone(),
            tailored_resume: tailored.clone(),
        };
        match sessions.save(id, record).await {
            Ok(()) => debug!("Session record saved for {id} ({})", sessions.backend()),
            Err(e) => warn!("Failed to save session record for {id}: {e}"),
        }
    }

    // Step 6: Format
    Ok(GenerateResponse {
        original: format_for_display(&resume_text),
        tailored: format_for_display(&tailored),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
