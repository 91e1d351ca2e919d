//! HTTP API handlers for lyricloud-wc

pub mod generate;
pub mod health;
pub mod sse;
pub mod ui;

pub use generate::generate_routes;
pub use health::health_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
