//! Word frequency table for the word cloud
//!
//! Tokens are runs of word characters (apostrophes allowed after the first
//! character) of length two or more. Processing, in order:
//! 1. Trailing `'s` is dropped.
//! 2. Pure numbers and stopwords are dropped (case-insensitive).
//! 3. Case variants are merged; the most frequent spelling is displayed.
//! 4. A plural (`words`) is merged into its singular (`word`) when both occur.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w']+").expect("token pattern is valid"));

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "com", "could", "couldn't", "did", "didn't",
    "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "else", "ever", "few",
    "for", "from", "further", "get", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "hence", "her", "here", "here's", "hers", "herself",
    "him", "himself", "his", "how", "how's", "however", "http", "i", "i'd", "i'll", "i'm", "i've",
    "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "k", "let's", "like",
    "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "otherwise", "ought", "our", "ours", "ourselves", "out",
    "over", "own", "r", "same", "shall", "shan't", "she", "she'd", "she'll", "she's", "should",
    "shouldn't", "since", "so", "some", "such", "than", "that", "that's", "the", "their",
    "theirs", "them", "themselves", "then", "there", "there's", "therefore", "these", "they",
    "they'd", "they'll", "they're", "they've", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll", "we're", "we've", "were",
    "weren't", "what", "what's", "when", "when's", "where", "where's", "which", "while", "who",
    "who's", "whom", "why", "why's", "with", "won't", "would", "wouldn't", "www", "you", "you'd",
    "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

/// Case-insensitive stopword set
#[derive(Debug, Clone)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    /// Built-in English stopwords
    pub fn english() -> Self {
        Self(ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect())
    }

    /// Add extra words (case-insensitive)
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0
            .extend(extra.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(&word.to_lowercase())
    }
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::english()
    }
}

/// One entry of the frequency table
#[derive(Debug, Clone, PartialEq)]
pub struct WordFrequency {
    /// Display spelling
    pub word: String,
    pub count: usize,
    /// `count` relative to the most frequent word (0.0, 1.0]
    pub weight: f32,
}

/// Compute the frequency table of `text`, most frequent first
///
/// Ties are broken alphabetically (case-insensitive) so the output is
/// deterministic.
pub fn word_frequencies(text: &str, stopwords: &Stopwords, max_words: usize) -> Vec<WordFrequency> {
    // lowercase key -> spelling -> count
    let mut variants: HashMap<String, HashMap<String, usize>> = HashMap::new();

    for token in TOKEN.find_iter(text).map(|m| m.as_str()) {
        let word = strip_possessive(token);
        if word.chars().count() < 2 {
            continue;
        }
        if word.chars().all(|c| c.is_numeric()) {
            continue;
        }
        if stopwords.contains(word) {
            continue;
        }

        *variants
            .entry(word.to_lowercase())
            .or_default()
            .entry(word.to_string())
            .or_insert(0) += 1;
    }

    merge_plurals(&mut variants);

    let mut table: Vec<(String, String, usize)> = variants
        .into_iter()
        .map(|(key, spellings)| {
            let count = spellings.values().sum();
            let display = most_common_spelling(&spellings);
            (key, display, count)
        })
        .collect();

    table.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    table.truncate(max_words);

    let max_count = table.first().map(|(_, _, c)| *c).unwrap_or(1) as f32;

    table
        .into_iter()
        .map(|(_, word, count)| WordFrequency {
            word,
            count,
            weight: count as f32 / max_count,
        })
        .collect()
}

fn strip_possessive(token: &str) -> &str {
    token
        .strip_suffix("'s")
        .or_else(|| token.strip_suffix("'S"))
        .unwrap_or(token)
}

fn merge_plurals(variants: &mut HashMap<String, HashMap<String, usize>>) {
    let plurals: Vec<String> = variants
        .keys()
        .filter(|key| key.ends_with('s') && !key.ends_with("ss") && key.len() > 3)
        .filter(|key| variants.contains_key(&key[..key.len() - 1]))
        .cloned()
        .collect();

    for plural in plurals {
        let singular = plural[..plural.len() - 1].to_string();
        if let Some(plural_spellings) = variants.remove(&plural) {
            let target = variants.entry(singular).or_default();
            for (spelling, count) in plural_spellings {
                let singular_spelling = spelling[..spelling.len() - 1].to_string();
                *target.entry(singular_spelling).or_insert(0) += count;
            }
        }
    }
}

fn most_common_spelling(spellings: &HashMap<String, usize>) -> String {
    spellings
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(spelling, _)| spelling.clone())
        .unwrap_or_default()
}
