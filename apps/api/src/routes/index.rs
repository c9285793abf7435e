use axum::response::Html;

/// GET /
/// The single-page form. Embedded at compile time.
pub async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
