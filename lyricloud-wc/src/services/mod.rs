//! Pipeline stages: fetch, normalize, render

pub mod fonts;
pub mod genius_client;
pub mod layout;
pub mod normalizer;
pub mod renderer;
pub mod word_frequency;

pub use genius_client::{FetchError, FetchOutcome, GeniusClient, LyricsProvider};
pub use normalizer::normalize;
pub use renderer::{encode_png, Artifact, ArtifactRenderer, RenderError, RenderOptions, WordCloudRenderer};
pub use word_frequency::{word_frequencies, Stopwords, WordFrequency};
