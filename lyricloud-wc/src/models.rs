//! Plain data records passed between pipeline stages

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected query input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("song title is blank")]
    BlankTitle,

    #[error("artist name is blank")]
    BlankArtist,
}

/// A song lookup request
///
/// Both fields are trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    title: String,
    artist: String,
}

impl Query {
    pub fn new(title: &str, artist: &str) -> Result<Self, QueryError> {
        let title = title.trim();
        let artist = artist.trim();

        if title.is_empty() {
            return Err(QueryError::BlankTitle);
        }
        if artist.is_empty() {
            return Err(QueryError::BlankArtist);
        }

        Ok(Self {
            title: title.to_string(),
            artist: artist.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Free-text search term sent to the provider
    pub fn search_term(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }
}

/// Song the provider matched the query to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMatch {
    pub title: String,
    pub artist: String,
    pub url: String,
}

/// Lyrics exactly as retrieved from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    pub text: String,
    pub song: SongMatch,
}

/// Lyrics with annotation tokens removed
///
/// Only produced by [`crate::services::normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}
