//! Competitive Analysis Integration Tests
//!
//! Runs the analyzer against in-memory search and fetch providers.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copyforge::{CompetitiveAnalyzer, CoreError, FetchError, PageFetcher, SearchProvider};

// ============================================================================
// Fakes
// ============================================================================

struct StaticSearch {
    urls: Vec<String>,
    requested_limit: AtomicUsize,
}

impl StaticSearch {
    fn new(urls: Vec<String>) -> Self {
        Self { urls, requested_limit: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _keyword: &str, limit: usize) -> Result<Vec<String>, FetchError> {
        self.requested_limit.store(limit, Ordering::SeqCst);
        Ok(self.urls.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _keyword: &str, _limit: usize) -> Result<Vec<String>, FetchError> {
        Err(FetchError::Search("ERROR 120 :: WRONG KEY".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Serves canned pages; a page listed in `slow` sleeps before answering.
#[derive(Default)]
struct PageMap {
    pages: HashMap<String, Result<String, FetchError>>,
    slow: HashMap<String, Duration>,
}

impl PageMap {
    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), Ok(html));
        self
    }

    fn failing(mut self, url: &str, error: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    fn slow(mut self, url: &str, delay: Duration) -> Self {
        self.slow.insert(url.to_string(), delay);
        self
    }
}

#[async_trait]
impl PageFetcher for PageMap {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        if let Some(delay) = self.slow.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Connection(format!("unreachable: {url}"))))
    }
}

fn url(i: usize) -> String {
    format!("https://competitor{i}.example/laptop-x")
}

fn competitor_page(title: &str, with_faq: bool) -> String {
    let faq = if with_faq {
        "<h2>Frequently asked questions</h2><p>Does it run games? Yes it does.</p>"
    } else {
        ""
    };
    format!(
        r#"<html><head><title>{title}</title></head><body>
<nav><a href="/">Home</a> <a href="/deals">Deals</a></nav>
<article>
  <h1>{title}</h1>
  <h2>Specifications</h2>
  <table><tr><td>CPU</td><td>Fast</td></tr></table>
  <h2>Performance</h2>
  <p>We ran every benchmark we could think of on this laptop.</p>
  {faq}
</article>
<footer>Copyright</footer>
</body></html>"#
    )
}

// ============================================================================
// Partial Failure Tests
// ============================================================================

mod partial_failures {
    use super::*;

    #[tokio::test]
    async fn test_two_of_five_failures_are_skipped() {
        let urls: Vec<String> = (1..=5).map(url).collect();
        let fetcher = PageMap::default()
            .page(&urls[0], competitor_page("Laptop X review", true))
            .failing(&urls[1], FetchError::Status { url: urls[1].clone(), status: 403 })
            .page(&urls[2], competitor_page("Laptop X tested", false))
            .failing(&urls[3], FetchError::Connection("connection reset".to_string()))
            .page(&urls[4], competitor_page("Is Laptop X worth it?", false));

        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(urls.clone())), Arc::new(fetcher));
        let context = analyzer.analyze("laptop x").await.unwrap();

        assert_eq!(context.keyword, "laptop x");
        assert_eq!(context.competitors.len(), 3);
        assert_eq!(context.skipped.len(), 2);

        let analyzed: Vec<&str> = context.competitors.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(analyzed, vec![urls[0].as_str(), urls[2].as_str(), urls[4].as_str()]);
        assert_eq!(context.skipped[0].url, urls[1]);
        assert!(context.skipped[0].reason.contains("403"));
        assert!(context.skipped[1].reason.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_outline_ignores_boilerplate() {
        let fetcher = PageMap::default().page(&url(1), competitor_page("Laptop X review", true));
        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(vec![url(1)])), Arc::new(fetcher));

        let context = analyzer.analyze("laptop x").await.unwrap();
        let summary = &context.competitors[0];

        assert_eq!(summary.title, "Laptop X review");
        let headings: Vec<&str> = summary.headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(
            headings,
            vec!["Laptop X review", "Specifications", "Performance", "Frequently asked questions"]
        );
        assert!(!summary.gaps.iter().any(|g| g.starts_with("FAQ")));
        assert!(summary.gaps.iter().any(|g| g.starts_with("Closing verdict")));
    }

    #[tokio::test]
    async fn test_gaps_shared_by_all_competitors() {
        let urls: Vec<String> = (1..=2).map(url).collect();
        let fetcher = PageMap::default()
            .page(&urls[0], competitor_page("A", true))
            .page(&urls[1], competitor_page("B", false));
        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(urls)), Arc::new(fetcher));

        let context = analyzer.analyze("laptop x").await.unwrap();

        assert!(context.shared_gaps().iter().any(|g| g.starts_with("Closing verdict")));
        assert!(!context.shared_gaps().iter().any(|g| g.starts_with("FAQ")));
        assert!(context.all_gaps().iter().any(|g| g.starts_with("FAQ")));
    }

    #[tokio::test]
    async fn test_duplicate_results_fetched_once() {
        let search = StaticSearch::new(vec![url(1), url(1), url(2)]);
        let fetcher = PageMap::default()
            .page(&url(1), competitor_page("A", true))
            .page(&url(2), competitor_page("B", true));
        let analyzer = CompetitiveAnalyzer::new(Arc::new(search), Arc::new(fetcher));

        let context = analyzer.analyze("laptop x").await.unwrap();
        assert_eq!(context.competitors.len(), 2);
    }
}

// ============================================================================
// Timeout Tests
// ============================================================================

mod timeouts {
    use super::*;

    #[tokio::test]
    async fn test_slow_page_times_out() {
        let urls: Vec<String> = (1..=2).map(url).collect();
        let fetcher = PageMap::default()
            .page(&urls[0], competitor_page("Fast", true))
            .page(&urls[1], competitor_page("Slow", true))
            .slow(&urls[1], Duration::from_secs(5));

        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(urls.clone())), Arc::new(fetcher))
            .with_timeouts(Duration::from_millis(50), Duration::from_secs(2));
        let context = analyzer.analyze("laptop x").await.unwrap();

        assert_eq!(context.competitors.len(), 1);
        assert_eq!(context.skipped[0].url, urls[1]);
        assert!(context.skipped[0].reason.starts_with("Timed out"));
    }

    #[tokio::test]
    async fn test_overall_budget_bounds_the_analysis() {
        let urls: Vec<String> = (1..=2).map(url).collect();
        let fetcher = PageMap::default()
            .page(&urls[0], competitor_page("Fast", true))
            .page(&urls[1], competitor_page("Slow", true))
            .slow(&urls[1], Duration::from_secs(5));

        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(urls.clone())), Arc::new(fetcher))
            .with_timeouts(Duration::from_secs(10), Duration::from_millis(100));
        let context = analyzer.analyze("laptop x").await.unwrap();

        assert_eq!(context.competitors.len(), 1);
        assert_eq!(context.skipped[0].reason, FetchError::BudgetExhausted.to_string());
    }

    #[tokio::test]
    async fn test_deeply_nested_page_is_analyzed() {
        let nested = format!(
            "<html><body><article><h1>Laptop X</h1>{}<h2>Specifications</h2><p>deep text</p></article></body></html>",
            "<div>".repeat(30_000)
        );
        let fetcher = PageMap::default().page(&url(1), nested);
        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(vec![url(1)])), Arc::new(fetcher))
            .with_timeouts(Duration::from_secs(10), Duration::from_secs(20));

        let context = analyzer.analyze("laptop x").await.unwrap();
        let headings: Vec<&str> = context.competitors[0].headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(headings, vec!["Laptop X", "Specifications"]);
    }
}

// ============================================================================
// Unavailable Analysis Tests
// ============================================================================

mod unavailable {
    use super::*;

    #[tokio::test]
    async fn test_search_failure_is_unavailable() {
        let analyzer = CompetitiveAnalyzer::new(Arc::new(FailingSearch), Arc::new(PageMap::default()));
        let err = analyzer.analyze("laptop x").await.unwrap_err();

        assert!(matches!(err, CoreError::AnalysisUnavailable { ref reason, .. } if reason.contains("WRONG KEY")));
    }

    #[tokio::test]
    async fn test_pages_without_content_are_unavailable() {
        let urls: Vec<String> = (1..=2).map(url).collect();
        let fetcher = PageMap::default()
            .page(&urls[0], "<html><body><nav>menu</nav></body></html>".to_string())
            .page(&urls[1], String::new());
        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(urls)), Arc::new(fetcher));

        let err = analyzer.analyze("laptop x").await.unwrap_err();
        assert!(matches!(err, CoreError::AnalysisUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_blank_keyword_rejected() {
        let analyzer = CompetitiveAnalyzer::new(Arc::new(StaticSearch::new(vec![url(1)])), Arc::new(PageMap::default()));
        let err = analyzer.analyze("   ").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_result_limit_passed_to_search() {
        let search = Arc::new(StaticSearch::new(vec![url(1)]));
        let fetcher = PageMap::default().page(&url(1), competitor_page("A", true));
        let analyzer = CompetitiveAnalyzer::new(search.clone(), Arc::new(fetcher));

        analyzer.analyze_for("laptop x", &common::archetype("product-review")).await.unwrap();
        assert_eq!(search.requested_limit.load(Ordering::SeqCst), 5);
    }
}
