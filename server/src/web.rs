use axum::response::Html;

/// Serve the status page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Liveness probe
pub async fn health() -> &'static str {
    "ok"
}
