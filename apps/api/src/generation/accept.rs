//! Accept workflow: turns the session's tailored resume into a PDF download.
//!
//! At most once per generate: the record is removed after a successful render,
//! so a second accept on the same session finds nothing.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::render::{PdfRenderer, ResumeDocument};
use crate::session::{SessionContext, SessionStore};

pub const DOWNLOAD_FILENAME: &str = "tailored-resume.pdf";

/// Steps:
/// 1. require a session the client presented (a freshly issued id has no record)
/// 2. load the record; absent or unreadable → `NoTailoredResume`
/// 3. render the tailored text (Letter, 1" margins)
/// 4. remove the record, logging failures
/// 5. return the PDF bytes
pub async fn accept_tailored_resume(
    sessions: &dyn SessionStore,
    renderer: &dyn PdfRenderer,
    session: Option<&SessionContext>,
) -> Result<Vec<u8>, AppError> {
    let id = match session {
        Some(ctx) if !ctx.issued => &ctx.id,
        _ => return Err(AppError::NoSession),
    };

    let record = match sessions.load(id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(AppError::NoTailoredResume),
        Err(e) => {
            warn!("Unreadable session record for {id}: {e}");
            return Err(AppError::NoTailoredResume);
        }
    };

    let document = ResumeDocument::new(record.tailored_resume);
    let pdf = renderer.render(&document).await?;
    info!(
        "Rendered {} byte PDF for session {id} via {}",
        pdf.len(),
        renderer.backend()
    );

    if let Err(e) = sessions.remove(id).await {
        warn!("Error cleaning up session record for {id}: {e}");
    }

    Ok(pdf)
}
