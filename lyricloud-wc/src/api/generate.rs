//! Word-cloud generation endpoints
//!
//! - `POST /api/generate` runs one trigger and returns the resulting state
//! - `GET /api/state` returns the current state and the retained inputs
//! - `GET /api/artifact.png` serves the last successful word cloud

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::renderer::encode_png;
use crate::shell::{ShellSnapshot, ShellState, TriggerOutcome};
use crate::AppState;

/// POST /api/generate request body
///
/// Missing fields count as blank.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtifactParams {
    /// Serve the bare canvas instead of the display frame
    #[serde(default)]
    pub raw: bool,
}

/// Build generation routes
pub fn generate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/state", get(current_state))
        .route("/api/artifact.png", get(artifact_png))
}

/// POST /api/generate
///
/// Returns 200 with the terminal state, or 409 while another run is in flight.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<ShellState>> {
    match state.shell.trigger(&request.title, &request.artist).await {
        TriggerOutcome::Completed(shell_state) => Ok(Json(shell_state)),
        TriggerOutcome::Busy => Err(ApiError::Conflict(
            "A word cloud is already being generated".to_string(),
        )),
    }
}

/// GET /api/state
pub async fn current_state(State(state): State<AppState>) -> Json<ShellSnapshot> {
    Json(state.shell.snapshot().await)
}

/// GET /api/artifact.png[?raw=true]
pub async fn artifact_png(
    State(state): State<AppState>,
    Query(params): Query<ArtifactParams>,
) -> ApiResult<Response> {
    let artifact = state
        .shell
        .artifact()
        .await
        .ok_or_else(|| ApiError::NotFound("No word cloud has been generated".to_string()))?;

    let (frame_width, frame_height) = state.frame_size;
    let png = tokio::task::spawn_blocking(move || {
        if params.raw {
            encode_png(&artifact.image)
        } else {
            encode_png(&artifact.framed(frame_width, frame_height))
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("PNG encoding task failed: {}", e)))??;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        ],
        png,
    )
        .into_response())
}
