//! Genius lyrics client
//!
//! Looks a song up through the Genius search API, then scrapes the lyrics
//! from the matched song page. One attempt per call; no retries.
//!
//! Search: `GET {api_base}/search?q=<title> <artist>` (Bearer token)
//! Lyrics: every `div[data-lyrics-container="true"]` of the song page

use async_trait::async_trait;
use lyricloud_common::config::GeniusConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node, Selector};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::credentials::Credential;
use crate::models::{Query, RawText, SongMatch};

const USER_AGENT: &str = concat!("lyricloud/", env!("CARGO_PKG_VERSION"));

/// Titles the provider files as songs that are not actually lyrics
static NON_SONG_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(track\s?list|album art(work)?|liner notes|booklet|credits|interview|skit|instrumental|setlist)\b",
    )
    .expect("non-song pattern is valid")
});

static LYRICS_CONTAINER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[data-lyrics-container="true"]"#).expect("lyrics selector is valid")
});

/// Lyrics provider client errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Provider rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Provider error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// HTTP status reported by the provider, if the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Unauthorized { status } | FetchError::Api { status, .. } => Some(*status),
            FetchError::Network(_) | FetchError::Parse(_) => None,
        }
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(RawText),
    /// The provider answered, but has no lyrics for the query
    NotFound,
}

/// Source of raw lyrics for a query
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    async fn search(&self, query: &Query) -> Result<FetchOutcome, FetchError>;
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchHit {
    #[serde(rename = "type")]
    hit_type: String,
    result: SongResult,
}

// Non-song hits carry a different shape, so every field is defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
struct SongResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    primary_artist: ArtistResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ArtistResult {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    meta: ErrorMeta,
}

#[derive(Debug, Deserialize)]
struct ErrorMeta {
    message: Option<String>,
}

/// Genius API client
///
/// The credential is injected at construction and never re-read.
pub struct GeniusClient {
    http_client: reqwest::Client,
    credential: Credential,
    api_base: String,
}

impl GeniusClient {
    pub fn new(credential: Credential, config: &GeniusConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            credential,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn search_hits(&self, query: &Query) -> Result<Vec<SearchHit>, FetchError> {
        let url = format!("{}/search", self.api_base);
        let term = query.search_term();

        tracing::debug!(url = %url, term = %term, "Querying Genius search API");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.credential.expose())
            .query(&[("q", term.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(FetchError::Unauthorized { status });
        }

        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status,
                message: error_message(&body),
            });
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(envelope.response.hits)
    }

    async fn fetch_lyrics_page(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "Fetching lyrics page");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status,
                message: error_message(&body),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LyricsProvider for GeniusClient {
    async fn search(&self, query: &Query) -> Result<FetchOutcome, FetchError> {
        let hits = self.search_hits(query).await?;

        let Some(song) = select_song(query, &hits) else {
            tracing::info!(
                title = %query.title(),
                artist = %query.artist(),
                hits = hits.len(),
                "No song hit for query"
            );
            return Ok(FetchOutcome::NotFound);
        };

        let html = self.fetch_lyrics_page(&song.url).await?;
        let lyrics = extract_lyrics(&html);

        if lyrics.trim().is_empty() {
            tracing::info!(url = %song.url, "Song page has no lyrics");
            return Ok(FetchOutcome::NotFound);
        }

        tracing::info!(
            title = %song.title,
            artist = %song.artist,
            chars = lyrics.len(),
            "Retrieved lyrics from Genius"
        );

        Ok(FetchOutcome::Found(RawText { text: lyrics, song }))
    }
}

/// Pick the hit that best matches the query
///
/// Exact (cleaned) title with a matching artist wins; otherwise the first
/// song hit that is not a track list, credits page or similar.
fn select_song(query: &Query, hits: &[SearchHit]) -> Option<SongMatch> {
    let wanted_title = clean_str(query.title());
    let wanted_artist = clean_str(query.artist());

    let songs: Vec<&SongResult> = hits
        .iter()
        .filter(|hit| hit.hit_type == "song" && !hit.result.url.is_empty())
        .map(|hit| &hit.result)
        .filter(|song| {
            clean_str(&song.title) == wanted_title || !NON_SONG_TITLE.is_match(&song.title)
        })
        .collect();

    let exact = songs.iter().find(|song| {
        let artist = clean_str(&song.primary_artist.name);
        clean_str(&song.title) == wanted_title
            && (artist.contains(&wanted_artist) || wanted_artist.contains(&artist))
    });

    exact.or_else(|| songs.first()).map(|song| SongMatch {
        title: song.title.clone(),
        artist: song.primary_artist.name.clone(),
        url: song.url.clone(),
    })
}

/// Lowercase, fold curly apostrophes, drop punctuation, collapse whitespace
fn clean_str(s: &str) -> String {
    s.replace('\u{2019}', "'")
        .replace('\u{200b}', "")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract lyrics text from a song page
///
/// `<br>` becomes a newline; elements marked `data-exclude-from-selection`
/// (contributor headers, embedded ads) are skipped. Containers are joined
/// with a newline.
pub fn extract_lyrics(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut sections = Vec::new();

    for container in document.select(&LYRICS_CONTAINER) {
        let mut text = String::new();

        for node in container.descendants() {
            let excluded = node.ancestors().chain(std::iter::once(node)).any(|n| {
                n.value()
                    .as_element()
                    .is_some_and(|e| e.attr("data-exclude-from-selection").is_some())
            });
            if excluded {
                continue;
            }

            match node.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(e) if e.name() == "br" => text.push('\n'),
                _ => {}
            }
        }

        sections.push(text);
    }

    sections.join("\n").trim().to_string()
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.meta.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
