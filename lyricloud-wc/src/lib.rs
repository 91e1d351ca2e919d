//! lyricloud-wc library interface
//!
//! Looks up a song's lyrics, strips annotation tokens, and renders the
//! remaining words as a word cloud. The pipeline is driven by the
//! interaction [`shell::Shell`] and served over HTTP.

pub mod api;
pub mod credentials;
pub mod error;
pub mod models;
pub mod services;
pub mod shell;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use lyricloud_common::events::EventBus;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::shell::Shell;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub shell: Arc<Shell>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Display frame the artifact is presented in, in pixels
    pub frame_size: (u32, u32),
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(shell: Arc<Shell>, event_bus: EventBus, frame_size: (u32, u32)) -> Self {
        Self {
            shell,
            event_bus,
            frame_size,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::generate_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
