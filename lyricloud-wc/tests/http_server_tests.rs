//! HTTP server and routing integration tests
//!
//! The shell runs against a stub provider and a stub renderer so the routes
//! can be exercised without network access or fonts.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{Rgba, RgbaImage};
use lyricloud_common::events::EventBus;
use lyricloud_wc::models::{NormalizedText, Query, RawText, SongMatch};
use lyricloud_wc::services::{
    Artifact, ArtifactRenderer, FetchError, FetchOutcome, LyricsProvider, RenderError,
    RenderOptions,
};
use lyricloud_wc::shell::Shell;
use lyricloud_wc::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Knows exactly one song; a title of "Locked" fails with 401
struct StubProvider;

#[async_trait]
impl LyricsProvider for StubProvider {
    async fn search(&self, query: &Query) -> Result<FetchOutcome, FetchError> {
        match query.title() {
            "Imagine" => Ok(FetchOutcome::Found(RawText {
                text: "Imagine [Verse] all the people".to_string(),
                song: SongMatch {
                    title: "Imagine".to_string(),
                    artist: "John Lennon".to_string(),
                    url: "https://genius.com/John-lennon-imagine-lyrics".to_string(),
                },
            })),
            "Locked" => Err(FetchError::Unauthorized { status: 401 }),
            _ => Ok(FetchOutcome::NotFound),
        }
    }
}

/// Holds every search until the gate is opened, then behaves like `StubProvider`
struct GatedProvider {
    gate: Arc<Notify>,
}

#[async_trait]
impl LyricsProvider for GatedProvider {
    async fn search(&self, query: &Query) -> Result<FetchOutcome, FetchError> {
        self.gate.notified().await;
        StubProvider.search(query).await
    }
}

struct StubRenderer;

impl ArtifactRenderer for StubRenderer {
    fn render(&self, text: &NormalizedText, options: &RenderOptions) -> Result<Artifact, RenderError> {
        Ok(Artifact {
            image: RgbaImage::from_pixel(options.width, options.height, Rgba([20, 40, 60, 255])),
            background: options.background,
            words_placed: text.as_str().split_whitespace().count(),
        })
    }
}

fn test_app_state() -> AppState {
    app_state_with(Arc::new(StubProvider))
}

fn app_state_with(provider: Arc<dyn LyricsProvider>) -> AppState {
    let event_bus = EventBus::new(100);
    let options = RenderOptions {
        width: 80,
        height: 40,
        ..RenderOptions::default()
    };
    let shell = Arc::new(Shell::new(
        provider,
        Arc::new(StubRenderer),
        options,
        event_bus.clone(),
    ));
    AppState::new(shell, event_bus, (150, 70))
}

fn post_generate(title: &str, artist: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": title, "artist": artist }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_root_route_serves_form() {
    let app = build_router(test_app_state());

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("text/html"));

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Name of Song"));
    assert!(html.contains("Name of Artist"));
    assert!(html.contains("Generate Word Cloud"));
}

#[tokio::test]
async fn test_static_assets_served() {
    let state = test_app_state();

    for (uri, content_type) in [
        ("/static/lyricloud.js", "application/javascript"),
        ("/static/lyricloud.css", "text/css"),
    ] {
        let response = build_router(state.clone()).oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(response.headers().get("content-type").unwrap(), content_type);
    }
}

#[tokio::test]
async fn test_script_recovers_from_conflict_and_follows_state() {
    let response = build_router(test_app_state())
        .oneshot(get("/static/lyricloud.js"))
        .await
        .unwrap();
    let script = String::from_utf8(body_bytes(response).await).unwrap();

    // 409 leaves the button usable
    let conflict = script.find("response.status === 409").unwrap();
    let branch = &script[conflict..conflict + 200];
    assert!(branch.contains("button.disabled = false"));

    // every state change re-reads /api/state, terminal states included
    let listener = script.find("addEventListener('ShellStateChanged'").unwrap();
    let handler = &script[listener..listener + 120];
    assert!(handler.contains("loadState(false)"));
    assert!(!handler.contains("'searching'"));
}

#[tokio::test]
async fn test_generate_success_then_artifact() {
    let state = test_app_state();

    // Given: a known song
    let response = build_router(state.clone())
        .oneshot(post_generate("Imagine", "John Lennon"))
        .await
        .unwrap();

    // Then: success with the canvas size
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"], "success");
    assert_eq!(body["title"], "Imagine");
    assert_eq!(body["artist"], "John Lennon");
    assert_eq!(body["width"], 80);
    assert_eq!(body["height"], 40);
    // "Imagine  all the people" reached the renderer without the annotation
    assert_eq!(body["words_placed"], 4);

    // And: the framed PNG is available
    let response = build_router(state.clone())
        .oneshot(get("/api/artifact.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let png = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((png.width(), png.height()), (150, 70));

    // And: the raw canvas is available
    let response = build_router(state)
        .oneshot(get("/api/artifact.png?raw=true"))
        .await
        .unwrap();
    let png = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((png.width(), png.height()), (80, 40));
}

#[tokio::test]
async fn test_generate_blank_input_is_input_invalid() {
    let app = build_router(test_app_state());

    let response = app.oneshot(post_generate("", "Anyone")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"], "input_invalid");
    assert_eq!(body["message"], "Please enter both song name and artist name.");
}

#[tokio::test]
async fn test_generate_missing_fields_count_as_blank() {
    let app = build_router(test_app_state());
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"title": "Imagine"}"#))
        .unwrap();

    let body = body_json(app.oneshot(request).await.unwrap()).await;

    assert_eq!(body["state"], "input_invalid");
}

#[tokio::test]
async fn test_generate_not_found_has_no_artifact() {
    let state = test_app_state();

    let response = build_router(state.clone())
        .oneshot(post_generate("Unknown Song", "Nobody"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["state"], "not_found");
    assert_eq!(
        body["message"],
        "Song not found. Please check the song name and artist."
    );

    let response = build_router(state)
        .oneshot(get("/api/artifact.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_generate_provider_failure_is_error_state() {
    let state = test_app_state();

    let response = build_router(state.clone())
        .oneshot(post_generate("Locked", "Anyone"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["state"], "error");
    assert_eq!(body["status"], 401);

    // Health reports the failure
    let response = build_router(state).oneshot(get("/health")).await.unwrap();
    let health = body_json(response).await;
    assert!(health["last_error"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_generate_while_running_is_conflict() {
    let gate = Arc::new(Notify::new());
    let state = app_state_with(Arc::new(GatedProvider { gate: gate.clone() }));

    // Given: a run waiting on the provider
    let first = {
        let app = build_router(state.clone());
        tokio::spawn(async move { app.oneshot(post_generate("Imagine", "John Lennon")).await })
    };
    while !state.shell.state().await.is_searching() {
        tokio::task::yield_now().await;
    }

    // When: a second request arrives
    let response = build_router(state.clone())
        .oneshot(post_generate("Unknown Song", "Nobody"))
        .await
        .unwrap();

    // Then: it is rejected and the running request is untouched
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");

    let snapshot = body_json(build_router(state.clone()).oneshot(get("/api/state")).await.unwrap()).await;
    assert_eq!(snapshot["state"], "searching");
    assert_eq!(snapshot["inputs"]["title"], "Imagine");

    gate.notify_one();
    let response = first.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["state"], "success");
}

#[tokio::test]
async fn test_state_reports_retained_inputs() {
    let state = test_app_state();

    let body = body_json(build_router(state.clone()).oneshot(get("/api/state")).await.unwrap()).await;
    assert_eq!(body["state"], "idle");
    assert_eq!(body["inputs"], json!({ "title": "", "artist": "" }));

    build_router(state.clone())
        .oneshot(post_generate("Unknown Song", "Nobody"))
        .await
        .unwrap();

    let body = body_json(build_router(state).oneshot(get("/api/state")).await.unwrap()).await;
    assert_eq!(body["state"], "not_found");
    assert_eq!(
        body["inputs"],
        json!({ "title": "Unknown Song", "artist": "Nobody" })
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(test_app_state());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lyricloud-wc");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_events_route_is_sse() {
    let app = build_router(test_app_state());

    let response = app.oneshot(get("/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}
