//! Placeholder landing page.
//!
//! The real frontend ships separately; this page keeps `GET /` useful when
//! the server runs on its own.

use axum::response::Html;
use axum::routing::get;
use axum::Router;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>logtap</title></head>
<body>
<h1>logtap</h1>
<p>Pipe logs to stdin and inspect them here.</p>
<ul>
<li><code>GET /api/logs</code> &mdash; query retained history</li>
<li><code>GET /api/status</code> &mdash; buffer and upstream status</li>
<li><code>GET /ws/logs</code> &mdash; live WebSocket feed</li>
</ul>
</body>
</html>"#;

/// Creates the landing page routes.
pub fn ui_routes() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}
