/// Aggregated analysis results and their text rendering.
///
/// The JSON shape produced by [`Report`]'s `Serialize` impl is what the
/// popup side reads: `success`, `reviews`, `averageScore`,
/// `averageSentiment`, `mostPositive`, `leastPositive`, `totalReviews`, or
/// `{success: false, error}`.
use serde::{Serialize, Serializer};

use crate::extract::Review;
use crate::sentiment::{self, Sentiment, SentimentAnalysis};

/// Error text the popup treats as an empty state rather than a failure.
pub const NO_REVIEWS_ERROR: &str = "No reviews found on this page";

/// Characters of review text kept for display.
pub const DISPLAY_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedReview {
    #[serde(rename = "text")]
    pub display_text: String,
    pub analysis: SentimentAnalysis,
}

impl AnalyzedReview {
    /// Score a review and keep only its display text.
    #[must_use]
    pub fn from_review(review: &Review) -> Self {
        Self {
            display_text: display_text(&review.text, DISPLAY_CHARS),
            analysis: sentiment::score(&review.text),
        }
    }
}

/// `text` cut to `max_chars` characters, with an ellipsis when anything was cut.
#[must_use]
pub fn display_text(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str(ELLIPSIS);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub reviews: Vec<AnalyzedReview>,
    pub average_score: f64,
    #[serde(rename = "averageSentiment")]
    pub average_label: Sentiment,
    pub most_positive: AnalyzedReview,
    pub least_positive: AnalyzedReview,
    pub total_reviews: usize,
}

impl Summary {
    /// Aggregate analyzed reviews. `None` when there are none.
    ///
    /// The most and least positive reviews are the ends of a stable
    /// descending sort by score.
    #[must_use]
    pub fn from_analyzed(reviews: Vec<AnalyzedReview>) -> Option<Self> {
        if reviews.is_empty() {
            return None;
        }

        let average_score =
            reviews.iter().map(|r| r.analysis.score).sum::<f64>() / reviews.len() as f64;

        let mut ranked: Vec<&AnalyzedReview> = reviews.iter().collect();
        ranked.sort_by(|a, b| b.analysis.score.total_cmp(&a.analysis.score));
        let most_positive = ranked[0].clone();
        let least_positive = ranked[ranked.len() - 1].clone();

        Some(Self {
            total_reviews: reviews.len(),
            average_label: Sentiment::for_average(average_score),
            average_score,
            most_positive,
            least_positive,
            reviews,
        })
    }
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Success(Summary),
    Failure { error: String },
}

impl Report {
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Report::Failure {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn no_reviews() -> Self {
        Self::failure(NO_REVIEWS_ERROR)
    }

    /// Score and aggregate `reviews`; an empty list is the no-reviews failure.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let analyzed = reviews.iter().map(AnalyzedReview::from_review).collect();
        Self::from_analyzed(analyzed)
    }

    #[must_use]
    pub fn from_analyzed(reviews: Vec<AnalyzedReview>) -> Self {
        match Summary::from_analyzed(reviews) {
            Some(summary) => Report::Success(summary),
            None => Self::no_reviews(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success(_))
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Report::Success(summary) => Some(summary),
            Report::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Report::Success(_) => None,
            Report::Failure { error } => Some(error),
        }
    }

    /// Whether this is the empty-page outcome rather than a real failure.
    pub fn is_no_reviews(&self) -> bool {
        self.error() == Some(NO_REVIEWS_ERROR)
    }
}

#[derive(Serialize)]
struct WireReport<'a> {
    success: bool,
    #[serde(flatten)]
    summary: Option<&'a Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireReport {
            success: self.is_success(),
            summary: self.summary(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

// ── Text rendering ───────────────────────────────────────────────────

fn emoji(label: Sentiment) -> &'static str {
    match label {
        Sentiment::Positive => "😊",
        Sentiment::Negative => "😞",
        Sentiment::Neutral => "😐",
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render a report for the terminal.
#[must_use]
pub fn render(report: &Report) -> String {
    let summary = match report {
        Report::Success(summary) => summary,
        Report::Failure { .. } if report.is_no_reviews() => {
            return "😐 No reviews found on this page. Open a restaurant's reviews and try again.\n"
                .to_string();
        }
        Report::Failure { error } => return format!("❌ Error: {error}\n"),
    };

    let mut out = String::from("🍽️  Sentiment Analysis Results\n\n📊 Analysis Summary\n");
    out.push_str(&format!(
        "  Average Sentiment: {}\n",
        capitalize_first(summary.average_label.as_str())
    ));
    out.push_str(&format!("  Average Score:     {:.3}\n", summary.average_score));
    out.push_str(&format!("  Reviews Analyzed:  {}\n\n", summary.total_reviews));

    for (title, review) in [
        ("😊 Most Positive Review", &summary.most_positive),
        ("😞 Least Positive Review", &summary.least_positive),
    ] {
        out.push_str(&format!(
            "{title}\n  {}\n  Score: {:.3}\n\n",
            review.display_text, review.analysis.score
        ));
    }

    out.push_str("📝 All Analyzed Reviews\n");
    for (i, review) in summary.reviews.iter().enumerate() {
        let a = &review.analysis;
        out.push_str(&format!(
            "  Review {}  {} {}\n    {}\n    Score: {:.3}  Positive words: {}  Negative words: {}\n",
            i + 1,
            emoji(a.label),
            capitalize_first(a.label.as_str()),
            review.display_text,
            a.score,
            a.positive_word_count,
            a.negative_word_count
        ));
    }
    out
}
