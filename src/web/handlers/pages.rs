//! Landing page and health check.

use axum::response::Html;

/// Landing page with the upload form.
const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// GET / - Serve the landing page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - Health check.
pub async fn health_check() -> &'static str {
    "OK"
}
