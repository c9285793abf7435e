// PDF rendering for accepted resumes.
// Two backends behind one trait: the in-process printpdf typesetter (default)
// and an external wkhtmltopdf process fed the HTML document.

pub mod builtin;
pub mod wkhtmltopdf;

use async_trait::async_trait;
use thiserror::Error;

pub use builtin::BuiltinPdfRenderer;
pub use wkhtmltopdf::WkHtmlToPdfRenderer;

/// US Letter, in inches.
pub const LETTER_WIDTH_IN: f32 = 8.5;
pub const LETTER_HEIGHT_IN: f32 = 11.0;
/// Same margin on every side.
pub const MARGIN_IN: f32 = 1.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer failed: {0}")]
    Backend(String),

    #[error("renderer io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("renderer exited with status {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("render task failed: {0}")]
    Task(String),
}

/// The resume as it goes to the renderer: plain text shown verbatim in a
/// whitespace-preserving block.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub text: String,
}

impl ResumeDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Minimal styled HTML page wrapping the text in a pre-wrap block.
    pub fn to_html(&self) -> String {
        format!(
            r#"<html>
  <head>
    <meta charset="utf-8">
    <style>
      body {{ font-family: Arial, sans-serif; line-height: 1.6; padding: 2rem; }}
      h1, h2, h3 {{ color: #2d3748; }}
      ul {{ margin: 1rem 0; }}
      li {{ margin: 0.5rem 0; }}
    </style>
  </head>
  <body>
    <pre style="white-space: pre-wrap;">{}</pre>
  </body>
</html>
"#,
            escape_html(&self.text)
        )
    }
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, document: &ResumeDocument) -> Result<Vec<u8>, RenderError>;

    fn backend(&self) -> &'static str;
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
