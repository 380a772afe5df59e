/// Tiered review locator.
///
/// Each tier is a [`CandidateSource`]; tiers run in order and the first one
/// producing any candidate wins. Structural selectors go first, keyword
/// heuristics follow when the markup gives nothing away.
use scraper::Selector;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::page::{CandidateNode, ContentWatcher, Page, PageSource};

// ── Structural selectors ─────────────────────────────────────────────

pub const DEFAULT_SELECTORS: &[&str] = &[
    r#"[data-testid="review-item"]"#,
    r#"[data-testid="review-text"]"#,
    r#"[data-testid="user-review"]"#,
    r#"[data-testid="review-content"]"#,
    ".review-item",
    ".review-container",
    ".user-review",
    r#"[class*="review"]"#,
    r#"[class*="Review"]"#,
    ".review-text",
    ".review-content",
    ".user-review-text",
    ".review-description",
    ".review-body",
    ".review-message",
    ".review-comment",
    ".review-detail",
    ".review-summary",
    ".review-full-text",
    ".review-snippet",
    ".review-excerpt",
    ".review-paragraph",
    ".user-review-content",
    ".review-user-content",
    ".review-user-text",
    ".review-user-message",
    ".review-user-comment",
    ".review-user-description",
    ".review-user-body",
    ".review-user-summary",
    ".review-user-full-text",
    ".review-user-snippet",
    ".review-user-excerpt",
    ".review-user-paragraph",
    r#"[data-testid="review"]"#,
    r#"[data-testid="user-review-text"]"#,
    r#"[data-testid="review-text-content"]"#,
    ".review-text-content",
    ".user-review-text-content",
    ".review-description-text",
    ".review-body-text",
    ".review-message-text",
    ".review-comment-text",
    ".review-detail-text",
    ".review-summary-text",
    ".review-full-text-content",
    ".review-snippet-text",
    ".review-excerpt-text",
    ".review-paragraph-text",
];

// ── Heuristic vocabularies ───────────────────────────────────────────

pub const REVIEW_KEYWORDS: &[&str] = &[
    "food", "service", "restaurant", "delicious", "tasty", "good", "bad", "great",
    "amazing", "terrible", "love", "hate", "recommend", "avoid", "experience",
    "quality", "taste", "atmosphere", "staff", "wait", "price", "value", "dish",
    "meal", "cuisine", "flavor", "portion", "ambiance", "delivery", "takeaway",
    "dine-in", "excellent", "outstanding", "fantastic", "brilliant", "superb",
    "incredible", "wonderful", "yummy", "enjoy", "satisfied", "best", "awesome",
    "nice", "pleasant", "fresh", "hot", "crispy", "juicy", "flavorful", "aromatic",
    "authentic", "traditional", "homemade", "generous", "reasonable", "affordable",
    "worth", "premium", "awful", "horrible", "disgusting", "worst", "disappointed",
    "poor", "mediocre", "bland", "cold", "overcooked", "undercooked", "expensive",
    "waste", "never", "dry", "soggy", "burnt", "tasteless", "flavorless", "greasy",
    "oily", "salty", "spicy", "slow", "rude", "unfriendly", "dirty", "noisy",
    "crowded", "small", "overpriced",
];

/// Added to [`REVIEW_KEYWORDS`] for the wide pass.
pub const BROAD_EXTRA_KEYWORDS: &[&str] = &[
    "like", "dislike", "enjoyed", "hated", "loved", "enjoyable", "disappointing",
    "satisfying", "unsatisfying", "perfect", "imperfect",
];

/// Exclusive bounds a node's text must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicBounds {
    pub min_chars: usize,
    pub max_chars: usize,
    /// Minimum number of space-separated pieces, exclusive.
    pub min_tokens: usize,
}

impl HeuristicBounds {
    pub const NARROW: Self = Self {
        min_chars: 20,
        max_chars: 2000,
        min_tokens: 3,
    };

    pub const WIDE: Self = Self {
        min_chars: 15,
        max_chars: 3000,
        min_tokens: 2,
    };

    fn admits(&self, text: &str) -> bool {
        let chars = text.chars().count();
        chars > self.min_chars
            && chars < self.max_chars
            && text.split(' ').count() > self.min_tokens
    }
}

// ── Candidate sources ────────────────────────────────────────────────

/// One strategy for finding review-like nodes in a page.
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &str;

    /// Matching nodes in document order. Empty when the strategy finds nothing.
    fn candidates(&self, page: &Page) -> Vec<CandidateNode>;
}

/// Tries CSS selectors in order; all matches of the first productive one win.
pub struct StructuralSource {
    selectors: Vec<(String, Selector)>,
}

impl StructuralSource {
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| {
                let s = s.as_ref();
                Selector::parse(s)
                    .map(|sel| (s.to_string(), sel))
                    .map_err(|e| Error::InvalidSelector {
                        selector: s.to_string(),
                        reason: format!("{e:?}"),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    pub fn standard() -> Result<Self> {
        Self::new(DEFAULT_SELECTORS)
    }
}

impl CandidateSource for StructuralSource {
    fn name(&self) -> &str {
        "structural"
    }

    fn candidates(&self, page: &Page) -> Vec<CandidateNode> {
        for (text, selector) in &self.selectors {
            let found = page.select(selector);
            if !found.is_empty() {
                info!("Found {} reviews with selector: {text}", found.len());
                return found;
            }
        }
        Vec::new()
    }
}

/// Scans every element, keeping visible content nodes that mention review
/// vocabulary and fall within [`HeuristicBounds`].
pub struct HeuristicSource {
    name: &'static str,
    keywords: Vec<String>,
    bounds: HeuristicBounds,
}

impl HeuristicSource {
    pub fn new<S: AsRef<str>>(name: &'static str, keywords: &[S], bounds: HeuristicBounds) -> Self {
        Self {
            name,
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
            bounds,
        }
    }

    /// The first keyword pass.
    pub fn narrow() -> Self {
        Self::new("heuristic-narrow", REVIEW_KEYWORDS, HeuristicBounds::NARROW)
    }

    /// The relaxed pass used once the page had more time to load.
    pub fn wide() -> Self {
        let keywords: Vec<&str> = REVIEW_KEYWORDS
            .iter()
            .chain(BROAD_EXTRA_KEYWORDS)
            .copied()
            .collect();
        Self::new("heuristic-wide", &keywords, HeuristicBounds::WIDE)
    }

    fn accepts(&self, node: &CandidateNode) -> bool {
        let flags = node.flags;
        if flags.in_navigation
            || flags.interactive
            || flags.in_script
            || flags.hidden
            || flags.own_ui
        {
            return false;
        }
        if !self.bounds.admits(&node.text) {
            return false;
        }
        let lower = node.text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl CandidateSource for HeuristicSource {
    fn name(&self) -> &str {
        self.name
    }

    fn candidates(&self, page: &Page) -> Vec<CandidateNode> {
        let found: Vec<CandidateNode> = page
            .elements()
            .into_iter()
            .filter(|n| self.accepts(n))
            .collect();
        info!("Found {} potential review elements ({})", found.len(), self.name);
        found
    }
}

// ── Locator ──────────────────────────────────────────────────────────

/// One escalation level of the locator.
pub struct Tier {
    pub source: Box<dyn CandidateSource>,
    /// Give the page time to settle before this tier runs.
    pub settle: bool,
}

impl Tier {
    pub fn immediate(source: impl CandidateSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            settle: false,
        }
    }

    pub fn after_settle(source: impl CandidateSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            settle: true,
        }
    }
}

pub struct ReviewLocator {
    tiers: Vec<Tier>,
}

impl ReviewLocator {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// Structural selectors, then the narrow scan, then the wide scan after
    /// the page settles.
    pub fn with_selectors<S: AsRef<str>>(selectors: &[S]) -> Result<Self> {
        Ok(Self::new(vec![
            Tier::immediate(StructuralSource::new(selectors)?),
            Tier::immediate(HeuristicSource::narrow()),
            Tier::after_settle(HeuristicSource::wide()),
        ]))
    }

    pub fn standard() -> Result<Self> {
        Self::with_selectors(DEFAULT_SELECTORS)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Run every tier against a single snapshot, without waiting.
    pub fn locate_in(&self, page: &Page) -> Vec<CandidateNode> {
        for tier in &self.tiers {
            let found = tier.source.candidates(page);
            if !found.is_empty() {
                return found;
            }
            debug!("tier {} found nothing", tier.source.name());
        }
        Vec::new()
    }

    /// Run the tiers against `html`, re-reading the page through `watcher`
    /// before any tier marked `settle`.
    pub async fn locate<S: PageSource>(
        &self,
        source: &S,
        html: String,
        watcher: &ContentWatcher,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateNode>> {
        let mut html = html;
        for tier in &self.tiers {
            if tier.settle {
                info!(
                    "No reviews found, waiting up to {:?} for dynamic content",
                    watcher.max_wait
                );
                html = watcher.wait_until_stable(source, cancel).await?;
            }
            let found = {
                let page = Page::parse(&html);
                tier.source.candidates(&page)
            };
            if !found.is_empty() {
                return Ok(found);
            }
            debug!("tier {} found nothing", tier.source.name());
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::source::tests::Scripted;
    use std::time::Duration;

    fn texts(nodes: &[CandidateNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.text.as_str()).collect()
    }

    #[test]
    fn test_default_selectors_parse() {
        let source = StructuralSource::standard().unwrap();
        assert_eq!(source.selectors.len(), DEFAULT_SELECTORS.len());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let err = StructuralSource::new(&["[data-testid="]).err().unwrap();
        assert!(matches!(err, Error::InvalidSelector { .. }));
    }

    #[test]
    fn test_structural_first_productive_selector_wins() {
        let page = Page::parse(
            r#"<div class="user-review">From user-review class</div>
               <div data-testid="review-text">From test id</div>"#,
        );
        let found = StructuralSource::standard().unwrap().candidates(&page);
        assert_eq!(texts(&found), vec!["From test id"]);
    }

    #[test]
    fn test_structural_class_substring() {
        let page = Page::parse(r#"<p class="sc-ReviewCard-x1">Lovely place overall</p>"#);
        let found = StructuralSource::standard().unwrap().candidates(&page);
        assert_eq!(texts(&found), vec!["Lovely place overall"]);
    }

    #[test]
    fn test_custom_selectors() {
        let page = Page::parse(r#"<blockquote class="opinion">Custom markup text</blockquote>"#);
        let locator = ReviewLocator::with_selectors(&["blockquote.opinion"]).unwrap();
        assert_eq!(texts(&locator.locate_in(&page)), vec!["Custom markup text"]);
    }

    #[test]
    fn test_narrow_filters() {
        let page = Page::parse(
            r#"<nav><p>Great food deals in navigation bar today</p></nav>
               <button>The food here is great and the service too</button>
               <p style="display:none">Hidden: the food here is great and fresh</p>
               <p id="sentiment-overlay">Our own overlay says the food is great</p>
               <p>Short food</p>
               <p>Chairs tables windows doors and more furniture</p>
               <p>The food was delicious and the staff friendly</p>"#,
        );
        let found = HeuristicSource::narrow().candidates(&page);
        let found = texts(&found);
        assert!(found.contains(&"The food was delicious and the staff friendly"));
        for excluded in [
            "Great food deals in navigation bar today",
            "The food here is great and the service too",
            "Hidden: the food here is great and fresh",
            "Our own overlay says the food is great",
            "Short food",
        ] {
            assert!(!found.contains(&excluded), "{excluded}");
        }
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let narrow = HeuristicBounds::NARROW;
        assert!(!narrow.admits("aaaa bbbb cccc ddddd")); // 20 chars
        assert!(narrow.admits("aaaa bbbb cccc dddddd")); // 21 chars
        assert!(!narrow.admits("aaaaaaaaaa bbbbbbbbbb ccc")); // 3 tokens
        assert!(HeuristicBounds::WIDE.admits("aaaaaaaaaa bbbbbbbbbb ccc"));
    }

    #[test]
    fn test_wide_catches_what_narrow_misses() {
        let page = Page::parse("<p>We really liked it here</p>");
        assert!(HeuristicSource::narrow().candidates(&page).is_empty());
        let wide = HeuristicSource::wide().candidates(&page);
        assert!(!wide.is_empty());
        assert!(wide.iter().all(|n| n.text == "We really liked it here"));
    }

    #[test]
    fn test_locate_in_falls_through_tiers() {
        let page = Page::parse("<div><p>The biryani was tasty and well spiced</p></div>");
        let found = ReviewLocator::standard().unwrap().locate_in(&page);
        assert!(texts(&found).contains(&"The biryani was tasty and well spiced"));
    }

    #[test]
    fn test_locate_in_empty_page() {
        let page = Page::parse("<p>nothing</p>");
        assert!(ReviewLocator::standard().unwrap().locate_in(&page).is_empty());
    }

    #[tokio::test]
    async fn test_settle_tier_sees_late_content() {
        let late = "<main><p>Loved every bite, would come back</p></main>";
        let source = Scripted::new(&["<main></main>", late, late]);
        let watcher = ContentWatcher::new(Duration::from_millis(1), Duration::from_secs(5));
        let locator = ReviewLocator::standard().unwrap();
        let found = locator
            .locate(&source, "<main></main>".to_string(), &watcher, &CancellationToken::new())
            .await
            .unwrap();
        assert!(texts(&found).contains(&"Loved every bite, would come back"));
    }
}
