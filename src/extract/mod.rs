/// Review extraction: locate candidates, drop duplicates, sample a few.
pub mod locator;

use std::collections::HashSet;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;
use crate::page::{CandidateNode, ContentWatcher, Page, PageSource};
use crate::sentiment::preview;

pub use locator::{CandidateSource, HeuristicSource, ReviewLocator, StructuralSource, Tier};

/// Characters of normalized text compared when deduplicating.
const DEDUP_KEY_CHARS: usize = 100;

/// Text of one review as found on the page, untruncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Deduplicated candidates kept, in document order, before sampling.
    pub max_candidates: usize,
    /// Reviews drawn from the kept candidates.
    pub sample_size: usize,
    /// Candidates at or below this many characters are dropped.
    pub min_review_chars: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            sample_size: 5,
            min_review_chars: 20,
        }
    }
}

/// Locator plus the dedup and sampling policy applied to what it finds.
pub struct Extractor {
    locator: ReviewLocator,
    limits: ExtractionLimits,
}

impl Extractor {
    pub fn new(locator: ReviewLocator, limits: ExtractionLimits) -> Self {
        Self { locator, limits }
    }

    #[must_use]
    pub fn limits(&self) -> ExtractionLimits {
        self.limits
    }

    /// Find candidates through every locator tier, letting the page settle
    /// before the tiers that ask for it.
    pub async fn locate<S: PageSource>(
        &self,
        source: &S,
        html: String,
        watcher: &ContentWatcher,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateNode>> {
        self.locator.locate(source, html, watcher, cancel).await
    }

    /// Deduplicate, cap and sample located candidates into reviews.
    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: Vec<CandidateNode>,
        rng: &mut R,
    ) -> Vec<Review> {
        let mut unique = dedup_candidates(candidates, self.limits.min_review_chars);
        info!("After deduplication: {} unique reviews", unique.len());

        unique.truncate(self.limits.max_candidates);
        let reviews: Vec<Review> = sample(rng, unique, self.limits.sample_size)
            .into_iter()
            .map(|text| Review { text })
            .collect();

        info!("Final reviews to analyze: {}", reviews.len());
        for (i, review) in reviews.iter().enumerate() {
            debug!("Review {}: \"{}\"", i + 1, preview(&review.text, 100));
        }
        reviews
    }

    /// Extract reviews from a single snapshot without waiting for more content.
    pub fn extract_from<R: Rng + ?Sized>(&self, page: &Page, rng: &mut R) -> Vec<Review> {
        self.select(self.locator.locate_in(page), rng)
    }
}

/// Key under which two candidate texts count as the same review.
fn dedup_key(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(DEDUP_KEY_CHARS)
        .collect()
}

/// Keep the first candidate per dedup key, dropping any whose text has
/// `min_chars` characters or fewer. Document order is preserved.
pub fn dedup_candidates(candidates: Vec<CandidateNode>, min_chars: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for node in candidates {
        if node.text.chars().count() > min_chars && seen.insert(dedup_key(&node.text)) {
            unique.push(node.text);
        }
    }
    unique
}

/// Draw up to `count` items without replacement, each uniformly from what
/// remains in `pool`.
pub fn sample<T, R: Rng + ?Sized>(rng: &mut R, mut pool: Vec<T>, count: usize) -> Vec<T> {
    let mut picked = Vec::with_capacity(count.min(pool.len()));
    while picked.len() < count && !pool.is_empty() {
        let idx = rng.gen_range(0..pool.len());
        picked.push(pool.remove(idx));
    }
    picked
}
