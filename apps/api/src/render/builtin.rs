//! In-process PDF typesetter built on `printpdf`.
//!
//! Reproduces the HTML document's pre-wrap block: Courier 10pt on US Letter
//! with 1" margins. Source line breaks are kept, long lines wrap at the last
//! space that fits, words longer than a line are hard-broken, and text flows
//! onto new pages as needed.
//!
//! `PdfDocument` is not `Send`, so the whole document is built inside
//! `spawn_blocking` and only the finished bytes cross the await point.

use async_trait::async_trait;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use tracing::debug;

use super::{
    PdfRenderer, RenderError, ResumeDocument, LETTER_HEIGHT_IN, LETTER_WIDTH_IN, MARGIN_IN,
};

const FONT_SIZE_PT: f32 = 10.0;
const LEADING_PT: f32 = 12.0;
/// Courier advance width is 600/1000 em for every glyph.
const COURIER_ADVANCE_EM: f32 = 0.6;
const PT_PER_IN: f32 = 72.0;
const MM_PER_IN: f32 = 25.4;
const TAB_WIDTH: usize = 4;
const DOCUMENT_TITLE: &str = "Tailored Resume";

pub struct BuiltinPdfRenderer;

#[async_trait]
impl PdfRenderer for BuiltinPdfRenderer {
    async fn render(&self, document: &ResumeDocument) -> Result<Vec<u8>, RenderError> {
        let text = document.text.clone();
        let bytes = tokio::task::spawn_blocking(move || render_sync(&text))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;
        debug!("Rendered {} byte PDF", bytes.len());
        Ok(bytes)
    }

    fn backend(&self) -> &'static str {
        "builtin"
    }
}

/// Characters that fit on one line between the margins.
fn columns_per_line() -> usize {
    let text_width_pt = (LETTER_WIDTH_IN - 2.0 * MARGIN_IN) * PT_PER_IN;
    (text_width_pt / (FONT_SIZE_PT * COURIER_ADVANCE_EM)).floor() as usize
}

/// Lines that fit between the top and bottom margins.
fn lines_per_page() -> usize {
    let text_height_pt = (LETTER_HEIGHT_IN - 2.0 * MARGIN_IN) * PT_PER_IN;
    (text_height_pt / LEADING_PT).floor() as usize
}

fn render_sync(text: &str) -> Result<Vec<u8>, RenderError> {
    let lines = layout_lines(text, columns_per_line());
    let per_page = lines_per_page();

    let page_width = Mm(LETTER_WIDTH_IN * MM_PER_IN);
    let page_height = Mm(LETTER_HEIGHT_IN * MM_PER_IN);
    let margin_mm = MARGIN_IN * MM_PER_IN;

    let (doc, first_page, first_layer) =
        PdfDocument::new(DOCUMENT_TITLE, page_width, page_height, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| RenderError::Backend(e.to_string()))?;

    let leading_mm = LEADING_PT / PT_PER_IN * MM_PER_IN;
    let first_baseline_mm = page_height.0 - margin_mm - FONT_SIZE_PT / PT_PER_IN * MM_PER_IN;

    let mut pages = lines.chunks(per_page.max(1));
    let first_chunk = pages.next().unwrap_or(&[]);

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut chunk = first_chunk;
    let mut page_number = 1;
    loop {
        for (i, line) in chunk.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = first_baseline_mm - i as f32 * leading_mm;
            layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(margin_mm), Mm(y), &font);
        }

        match pages.next() {
            Some(next) => {
                page_number += 1;
                let (page, page_layer) =
                    doc.add_page(page_width, page_height, format!("Layer {page_number}"));
                layer = doc.get_page(page).get_layer(page_layer);
                chunk = next;
            }
            None => break,
        }
    }

    doc.save_to_bytes()
        .map_err(|e| RenderError::Backend(e.to_string()))
}

/// Splits `text` into display lines no wider than `cols` characters.
fn layout_lines(text: &str, cols: usize) -> Vec<String> {
    let cols = cols.max(1);
    let mut out = Vec::new();

    for raw in text.split('\n') {
        let line = to_win_ansi(raw.trim_end_matches('\r'));
        let chars: Vec<char> = line.chars().collect();
        let mut start = 0;

        while chars.len() - start > cols {
            let window = &chars[start..=start + cols];
            match window.iter().rposition(|c| *c == ' ') {
                Some(pos) if pos > 0 => {
                    out.push(chars[start..start + pos].iter().collect());
                    start += pos + 1;
                }
                _ => {
                    out.push(chars[start..start + cols].iter().collect());
                    start += cols;
                }
            }
        }
        out.push(chars[start..].iter().collect());
    }

    out
}

/// Courier is written with WinAnsiEncoding. Dashes, quotes, bullets and
/// wide spaces are normalized to plain look-alikes; any other character the
/// encoding covers passes through, the rest becomes `?`.
fn to_win_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\t' => out.push_str(&" ".repeat(TAB_WIDTH)),
            ' '..='~' => out.push(c),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{25CF}' | '\u{25AA}' | '\u{00B7}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2002}'..='\u{200A}' => out.push(' '),
            c if c.is_control() => {}
            c if is_win_ansi(c) => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Latin-1 plus the printable characters Windows-1252 places in 0x80..=0x9F.
fn is_win_ansi(c: char) -> bool {
    matches!(
        c,
        '\u{00A1}'..='\u{00FF}'
            | '\u{20AC}'
            | '\u{0192}'
            | '\u{2020}'
            | '\u{2021}'
            | '\u{02C6}'
            | '\u{2030}'
            | '\u{0160}'
            | '\u{2039}'
            | '\u{0152}'
            | '\u{017D}'
            | '\u{02DC}'
            | '\u{2122}'
            | '\u{0161}'
            | '\u{203A}'
            | '\u{0153}'
            | '\u{017E}'
            | '\u{0178}'
    )
}
