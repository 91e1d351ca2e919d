//! Annotation stripping
//!
//! Removes bracketed section markers such as `[Chorus]` or `[Verse 2: Artist]`
//! from lyrics. A span runs from a `[` to the next `]`, across line breaks
//! (shortest match, no nesting). Everything outside the spans, whitespace
//! included, is kept as-is; a `[` with no later `]` is left alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{NormalizedText, RawText};

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*?\]").expect("annotation pattern is valid"));

/// Strip annotation tokens from raw provider text
pub fn normalize(raw: RawText) -> NormalizedText {
    NormalizedText::new(strip_annotations(&raw.text))
}

/// Remove every `[...]` span from `text`
pub fn strip_annotations(text: &str) -> String {
    ANNOTATION.replace_all(text, "").into_owned()
}
