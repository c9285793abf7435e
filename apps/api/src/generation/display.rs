/// Converts line breaks to `<br>` for direct display. No other escaping is
/// applied; callers embed the result as-is.
pub fn format_for_display(text: &str) -> String {
    text.replace("\r\n", "<br>").replace('\n', "<br>")
}
