//! UI routes
//!
//! A single page with the two query fields, the trigger button and an
//! output region. The page only renders [`crate::shell::ShellState`];
//! static CSS/JS are embedded at compile time.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const LYRICLOUD_CSS: &str = include_str!("../../static/lyricloud.css");
const LYRICLOUD_JS: &str = include_str!("../../static/lyricloud.js");

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/lyricloud.css", get(serve_css))
        .route("/static/lyricloud.js", get(serve_js))
}

/// GET /
pub async fn root_page() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_profile = env!("BUILD_PROFILE");
    let build_timestamp = env!("BUILD_TIMESTAMP");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Lyrics Word Cloud</title>
    <link rel="stylesheet" href="/static/lyricloud.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>
                    Lyrics Word Cloud
                    <span class="connection-status status-connecting" id="connection-status">Connecting...</span>
                </h1>
                <p class="subtitle">Turn a song's lyrics into a word cloud</p>
            </div>
            <div class="header-right">
                <div class="build-info-line">lyricloud-wc v{version}</div>
                <div class="build-info-line">{git_hash} ({build_profile})</div>
                <div class="build-info-line">{build_timestamp}</div>
            </div>
        </div>
    </header>
    <div class="content">
        <div class="query-form">
            <div class="field">
                <label for="song-title">Name of Song</label>
                <input type="text" id="song-title" autocomplete="off">
            </div>
            <div class="field">
                <label for="artist-name">Name of Artist</label>
                <input type="text" id="artist-name" autocomplete="off">
            </div>
            <button class="button" id="generate">Generate Word Cloud</button>
        </div>
        <div id="message"></div>
        <div id="output"></div>
    </div>
    <script src="/static/lyricloud.js"></script>
</body>
</html>
"#
    ))
}

/// GET /static/lyricloud.css
async fn serve_css() -> Response {
    static_asset("text/css", LYRICLOUD_CSS)
}

/// GET /static/lyricloud.js
async fn serve_js() -> Response {
    static_asset("application/javascript", LYRICLOUD_JS)
}

fn static_asset(content_type: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", content_type),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        body,
    )
        .into_response()
}
