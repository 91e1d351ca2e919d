//! Genius client tests against an in-process fake provider
//!
//! The fake serves `/search` (bearer-checked) and song pages on 127.0.0.1:0.

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lyricloud_common::config::GeniusConfig;
use lyricloud_wc::credentials::Credential;
use lyricloud_wc::models::Query;
use lyricloud_wc::services::{FetchError, FetchOutcome, GeniusClient, LyricsProvider};
use serde_json::{json, Value};
use std::collections::HashMap;

const TOKEN: &str = "test-token-123";

const IMAGINE_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div data-lyrics-container="true">
  <div data-exclude-from-selection="true">12 Contributors</div>[Verse 1]<br>Imagine there's no heaven<br>It's easy if you try
</div>
<div class="ad">Buy tickets now</div>
<div data-lyrics-container="true">[Chorus]<br>Imagine all the people</div>
</body></html>"#;

const INSTRUMENTAL_PAGE: &str = r#"<!DOCTYPE html>
<html><body><div class="lyrics-placeholder">This song is an instrumental</div></body></html>"#;

#[derive(Clone)]
struct Fake {
    base: String,
}

fn song_hit(base: &str, title: &str, artist: &str, slug: &str) -> Value {
    json!({
        "type": "song",
        "result": {
            "title": title,
            "url": format!("{}/songs/{}", base, slug),
            "primary_artist": { "name": artist }
        }
    })
}

async fn fake_search(
    State(fake): State<Fake>,
    headers: HeaderMap,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Response {
    let expected = format!("Bearer {}", TOKEN);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "meta": { "status": 401, "message": "invalid_token" } })),
        )
            .into_response();
    }

    let q = params.get("q").cloned().unwrap_or_default();
    let hits = if q.starts_with("Imagine") {
        vec![
            json!({ "type": "artist", "result": { "name": "John Lennon" } }),
            song_hit(&fake.base, "Imagine (Tracklist)", "John Lennon", "tracklist"),
            song_hit(&fake.base, "Imagine (Live)", "Someone Else", "imagine-live"),
            song_hit(&fake.base, "Imagine", "John Lennon", "imagine"),
        ]
    } else if q.starts_with("Silence") {
        vec![song_hit(&fake.base, "Silence", "Quiet Band", "silence")]
    } else if q.starts_with("Broken") {
        vec![song_hit(&fake.base, "Broken", "Gone", "missing-page")]
    } else if q.starts_with("Overload") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "meta": { "status": 503, "message": "try again later" } })),
        )
            .into_response();
    } else {
        vec![]
    };

    Json(json!({ "meta": { "status": 200 }, "response": { "hits": hits } })).into_response()
}

async fn fake_page(Path(slug): Path<String>) -> Response {
    match slug.as_str() {
        "imagine" => Html(IMAGINE_PAGE).into_response(),
        "silence" => Html(INSTRUMENTAL_PAGE).into_response(),
        _ => (StatusCode::NOT_FOUND, "no such page").into_response(),
    }
}

async fn spawn_fake_provider() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let app = Router::new()
        .route("/search", get(fake_search))
        .route("/songs/:slug", get(fake_page))
        .with_state(Fake { base: base.clone() });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base
}

fn client(base: &str, token: &str) -> GeniusClient {
    let config = GeniusConfig {
        api_base: base.to_string(),
        timeout_secs: 5,
        ..GeniusConfig::default()
    };
    GeniusClient::new(Credential::new(token), &config).unwrap()
}

#[tokio::test]
async fn test_found_picks_exact_match_and_scrapes_lyrics() {
    let base = spawn_fake_provider().await;
    let client = client(&base, TOKEN);

    let outcome = client
        .search(&Query::new("Imagine", "John Lennon").unwrap())
        .await
        .unwrap();

    let FetchOutcome::Found(raw) = outcome else {
        panic!("expected lyrics, got {:?}", outcome);
    };
    assert_eq!(raw.song.title, "Imagine");
    assert_eq!(raw.song.artist, "John Lennon");
    assert!(raw.song.url.ends_with("/songs/imagine"));
    assert_eq!(
        raw.text,
        "[Verse 1]\nImagine there's no heaven\nIt's easy if you try\n\n[Chorus]\nImagine all the people"
    );
    assert!(!raw.text.contains("Contributors"));
    assert!(!raw.text.contains("Buy tickets"));
}

#[tokio::test]
async fn test_no_hits_is_not_found() {
    let base = spawn_fake_provider().await;
    let outcome = client(&base, TOKEN)
        .search(&Query::new("Unknown Song", "Nobody").unwrap())
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_page_without_lyrics_is_not_found() {
    let base = spawn_fake_provider().await;
    let outcome = client(&base, TOKEN)
        .search(&Query::new("Silence", "Quiet Band").unwrap())
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let base = spawn_fake_provider().await;
    let err = client(&base, "wrong-token")
        .search(&Query::new("Imagine", "John Lennon").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Unauthorized { status: 401 }));
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_provider_error_carries_status_and_message() {
    let base = spawn_fake_provider().await;
    let err = client(&base, TOKEN)
        .search(&Query::new("Overload", "Anyone").unwrap())
        .await
        .unwrap_err();

    match err {
        FetchError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "try again later");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_song_page_is_api_error() {
    let base = spawn_fake_provider().await;
    let err = client(&base, TOKEN)
        .search(&Query::new("Broken", "Gone").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    // bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&base, TOKEN)
        .search(&Query::new("Imagine", "John Lennon").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
    assert_eq!(err.status(), None);
}
