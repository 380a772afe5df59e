/// Analysis orchestration: extract reviews from a page, score each one and
/// aggregate the scores into a [`Report`].
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::extract::{Extractor, ReviewLocator};
use crate::page::{ContentWatcher, Page, PageSource};
use crate::report::Report;

pub struct Analyzer {
    extractor: Extractor,
    watcher: ContentWatcher,
    retry_settle: Duration,
    seed: Option<u64>,
}

impl Analyzer {
    pub fn new(extractor: Extractor, watcher: ContentWatcher, retry_settle: Duration) -> Self {
        Self {
            extractor,
            watcher,
            retry_settle,
            seed: None,
        }
    }

    /// Build the analyzer described by `config`. Fails on invalid selectors.
    pub fn from_config(config: &Config) -> Result<Self> {
        let locator = ReviewLocator::with_selectors(&config.selectors)?;
        Ok(Self::new(
            Extractor::new(locator, config.limits()),
            config.watcher(),
            config.retry_settle(),
        ))
    }

    /// Sample reviews deterministically. Every run then draws the same subset.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Run a full analysis of `source`. Always resolves to a report; errors
    /// become `{success: false, error}`.
    pub async fn analyze<S: PageSource>(&self, source: &S, cancel: &CancellationToken) -> Report {
        match self.run(source, cancel).await {
            Ok(report) => report,
            Err(e) => {
                error!("Error in analyze: {e}");
                Report::failure(e.to_string())
            }
        }
    }

    async fn run<S: PageSource>(&self, source: &S, cancel: &CancellationToken) -> Result<Report> {
        info!("Starting review analysis of {}", source.describe());

        let html = self.watcher.wait_until_stable(source, cancel).await?;
        let retry_watcher = self.watcher.with_max_wait(self.retry_settle);
        let candidates = self
            .extractor
            .locate(source, html, &retry_watcher, cancel)
            .await?;

        let reviews = {
            let mut rng = self.rng();
            self.extractor.select(candidates, &mut rng)
        };
        if reviews.is_empty() {
            info!("No reviews found");
            return Ok(Report::no_reviews());
        }

        let report = Report::from_reviews(&reviews);
        log_summary(&report);
        Ok(report)
    }

    /// Analyze a single snapshot without waiting for the page to settle.
    pub fn analyze_page(&self, page: &Page) -> Report {
        let mut rng = self.rng();
        let reviews = self.extractor.extract_from(page, &mut rng);
        let report = Report::from_reviews(&reviews);
        log_summary(&report);
        report
    }
}

fn log_summary(report: &Report) {
    let Some(summary) = report.summary() else {
        return;
    };
    let scores: Vec<String> = summary
        .reviews
        .iter()
        .map(|r| format!("{:.3}", r.analysis.score))
        .collect();
    info!("All scores: {}", scores.join(", "));
    info!(
        "Average score: {:.3} ({})",
        summary.average_score, summary.average_label
    );
    info!(
        "Most positive: {:.3}, least positive: {:.3}",
        summary.most_positive.analysis.score, summary.least_positive.analysis.score
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Source;
    use crate::page::source::tests::Scripted;
    use crate::report::NO_REVIEWS_ERROR;
    use crate::sentiment::Sentiment;

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.settle.entry_settle_ms = 20;
        config.settle.retry_settle_ms = 20;
        config.settle.poll_interval_ms = 1;
        config
    }

    fn analyzer() -> Analyzer {
        Analyzer::from_config(&fast_config()).unwrap().with_seed(3)
    }

    const PAGE: &str = r#"
        <html><body>
          <header><h1>Spice Route</h1></header>
          <section>
            <div data-testid="review-text">Absolutely delicious biryani, perfect spice and generous portions.</div>
            <div data-testid="review-text">Terrible service, the naan was cold and the curry tasteless.</div>
            <div data-testid="review-text">Decent place; ordered paneer, arrived on time, nothing special.</div>
          </section>
        </body></html>"#;

    #[tokio::test]
    async fn test_analyze_structured_page() {
        let source = Source::Inline(PAGE.to_string());
        let report = analyzer().analyze(&source, &CancellationToken::new()).await;
        let summary = report.summary().expect("report should succeed");
        assert_eq!(summary.total_reviews, 3);
        assert!(summary.most_positive.analysis.score >= summary.least_positive.analysis.score);
        assert_eq!(summary.most_positive.analysis.label, Sentiment::Positive);
        assert_eq!(summary.least_positive.analysis.label, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_analyze_empty_page() {
        let source = Source::Inline("<html><body><p>Hi</p></body></html>".to_string());
        let report = analyzer().analyze(&source, &CancellationToken::new()).await;
        assert_eq!(report.error(), Some(NO_REVIEWS_ERROR));
    }

    #[tokio::test]
    async fn test_analyze_waits_for_late_reviews() {
        let late = r#"<div class="review-card">The thali was fresh and tasty, staff lovely.</div>"#;
        let source = Scripted::new(&["<div id='app'></div>", late, late]);
        let report = analyzer().analyze(&source, &CancellationToken::new()).await;
        assert_eq!(report.summary().map(|s| s.total_reviews), Some(1));
    }

    #[tokio::test]
    async fn test_source_error_becomes_failure() {
        let source = Source::File("/no/such/page.html".into());
        let report = analyzer().analyze(&source, &CancellationToken::new()).await;
        let error = report.error().unwrap();
        assert!(error.contains("/no/such/page.html"), "{error}");
        assert!(!report.is_no_reviews());
    }

    #[tokio::test]
    async fn test_cancelled_analysis_reports_failure() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let source = Source::Inline(PAGE.to_string());
        let report = analyzer().analyze(&source, &cancel).await;
        assert_eq!(report.error(), Some("analysis cancelled"));
    }

    #[test]
    fn test_invalid_selector_in_config() {
        let mut config = fast_config();
        config.selectors = vec!["div[".to_string()];
        assert!(Analyzer::from_config(&config).is_err());
    }

    #[test]
    fn test_analyze_page_caps_at_sample_size() {
        let items: String = (0..8)
            .map(|i| format!("<p class='review'>Visit {i}: good food, great value for money.</p>"))
            .collect();
        let page = Page::parse(&items);
        let report = analyzer().analyze_page(&page);
        assert_eq!(report.summary().unwrap().total_reviews, 5);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let items: String = (0..10)
            .map(|i| format!("<p class='review'>Visit {i}: good food, great value for money.</p>"))
            .collect();
        let page = Page::parse(&items);
        let a = analyzer().analyze_page(&page);
        let b = analyzer().analyze_page(&page);
        assert_eq!(a, b);
    }
}
