use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{PdfRenderer, RenderError, ResumeDocument};

/// Renders the HTML document through an external `wkhtmltopdf` binary,
/// HTML on stdin and PDF on stdout.
pub struct WkHtmlToPdfRenderer {
    binary: String,
}

impl WkHtmlToPdfRenderer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

const ARGS: &[&str] = &[
    "--quiet",
    "--encoding",
    "utf-8",
    "--page-size",
    "Letter",
    "--margin-top",
    "1in",
    "--margin-right",
    "1in",
    "--margin-bottom",
    "1in",
    "--margin-left",
    "1in",
    "-",
    "-",
];

#[async_trait]
impl PdfRenderer for WkHtmlToPdfRenderer {
    async fn render(&self, document: &ResumeDocument) -> Result<Vec<u8>, RenderError> {
        let html = document.to_html();

        let mut child = Command::new(&self.binary)
            .args(ARGS)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::Backend("renderer stdin unavailable".to_string()))?;

        // Feed stdin while draining stdout so a large document cannot deadlock
        // on a full pipe.
        let feed = async move {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(RenderError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed?;
        if output.stdout.is_empty() {
            return Err(RenderError::Backend(
                "renderer produced no output".to_string(),
            ));
        }

        debug!("{} rendered {} byte PDF", self.binary, output.stdout.len());
        Ok(output.stdout)
    }

    fn backend(&self) -> &'static str {
        "wkhtmltopdf"
    }
}
