/// Lexicon-based sentiment scoring.
///
/// Text is normalized, tokenized on whitespace and matched word-by-word
/// against [`Lexicon`]. No phrase or negation handling: "not good" scores
/// as positive through "good".
pub mod lexicon;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub use lexicon::Lexicon;

/// Per-review label threshold.
pub const REVIEW_THRESHOLD: f64 = 0.05;

/// Threshold for labelling an averaged score. Looser than the per-review one.
pub const AVERAGE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    fn with_threshold(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Sentiment::Positive
        } else if score < -threshold {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Label for a single review score.
    #[must_use]
    pub fn for_review(score: f64) -> Self {
        Self::with_threshold(score, REVIEW_THRESHOLD)
    }

    /// Label for the mean score of a report.
    #[must_use]
    pub fn for_average(score: f64) -> Self {
        Self::with_threshold(score, AVERAGE_THRESHOLD)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentAnalysis {
    /// Always within `[-1, 1]`.
    pub score: f64,
    #[serde(rename = "sentiment")]
    pub label: Sentiment,
    #[serde(rename = "positiveWords")]
    pub positive_word_count: usize,
    #[serde(rename = "negativeWords")]
    pub negative_word_count: usize,
    #[serde(rename = "totalWords")]
    pub total_word_count: usize,
}

impl SentimentAnalysis {
    fn neutral() -> Self {
        Self {
            score: 0.0,
            label: Sentiment::Neutral,
            positive_word_count: 0,
            negative_word_count: 0,
            total_word_count: 0,
        }
    }
}

/// Lowercase and replace every run of non-word characters with one space.
#[must_use]
pub fn normalize(text: &str) -> String {
    static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").unwrap());
    NON_WORD
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Score `text` against the built-in lexicon.
#[must_use]
pub fn score(text: &str) -> SentimentAnalysis {
    score_with(Lexicon::standard(), text)
}

/// Score `text` against `lexicon`. Never fails; empty input is neutral.
pub fn score_with(lexicon: &Lexicon, text: &str) -> SentimentAnalysis {
    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.is_empty() {
        return SentimentAnalysis::neutral();
    }

    let mut positive_score = 0u32;
    let mut negative_score = 0u32;
    let mut positive_count = 0usize;
    let mut negative_count = 0usize;

    for word in &words {
        if let Some(weight) = lexicon.positive_weight(word) {
            positive_score += weight;
            positive_count += 1;
        }
        if let Some(weight) = lexicon.negative_weight(word) {
            negative_score += weight;
            negative_count += 1;
        }
    }

    let total_weight = positive_score + negative_score;
    let raw = if total_weight > 0 {
        (f64::from(positive_score) - f64::from(negative_score)) / f64::from(total_weight)
    } else {
        (positive_count as f64 - negative_count as f64) / words.len() as f64
    };
    let score = raw.clamp(-1.0, 1.0);
    let label = Sentiment::for_review(score);

    debug!(
        positive_count,
        negative_count,
        positive_score,
        negative_score,
        score,
        "scored \"{}\"",
        preview(text, 50)
    );

    SentimentAnalysis {
        score,
        label,
        positive_word_count: positive_count,
        negative_word_count: negative_count,
        total_word_count: words.len(),
    }
}

/// First `max_chars` characters of `text`, for log lines.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
