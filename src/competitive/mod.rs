//! Competitive analysis.
//!
//! Resolves the top organic results for a keyword, fetches them
//! concurrently and reduces each page to an outline plus the structural
//! gaps it leaves. Individual pages may fail; the analysis only fails when
//! no page at all could be analyzed.

mod extract;
#[cfg(feature = "http")]
mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::archetype::{generic_hints, Archetype, StructuralHint};
use crate::core::{CompetitiveConfig, CoreError, CoreResult, FetchError};

pub use extract::{content_gaps, extract_outline, PageOutline};
#[cfg(feature = "http")]
pub use http::{parse_semrush_response, HttpFetcher, SemrushSearch};

/// Resolves organic search results for a keyword.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Get up to `limit` result URLs in ranking order.
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<String>, FetchError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Downloads a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML of `url`, giving up after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// A heading found on a competitor page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 to 3
    pub level: u8,
    /// Visible heading text
    pub text: String,
}

/// Outline of one competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSummary {
    /// Source URL
    pub url: String,
    /// Page title
    pub title: String,
    /// h1-h3 headings in document order
    pub headings: Vec<Heading>,
    /// Words in the main content
    pub word_count: usize,
    /// Structural hints the page does not cover
    pub gaps: Vec<String>,
}

/// A result that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCompetitor {
    /// Source URL
    pub url: String,
    /// Why it was skipped
    pub reason: String,
}

/// Aggregated view of the current competition for a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveContext {
    /// Keyword the results were resolved for
    pub keyword: String,
    /// Analyzed competitors in ranking order
    pub competitors: Vec<CompetitorSummary>,
    /// Results that could not be analyzed, in ranking order
    pub skipped: Vec<SkippedCompetitor>,
}

impl CompetitiveContext {
    /// Word count of the longest competitor.
    pub fn max_word_count(&self) -> usize {
        self.competitors.iter().map(|c| c.word_count).max().unwrap_or(0)
    }

    /// Average competitor word count.
    pub fn average_word_count(&self) -> usize {
        if self.competitors.is_empty() {
            return 0;
        }
        self.competitors.iter().map(|c| c.word_count).sum::<usize>() / self.competitors.len()
    }

    /// Distinct gaps across all competitors, in first-seen order.
    pub fn all_gaps(&self) -> Vec<&str> {
        let mut gaps: Vec<&str> = Vec::new();
        for gap in self.competitors.iter().flat_map(|c| c.gaps.iter()) {
            if !gaps.contains(&gap.as_str()) {
                gaps.push(gap);
            }
        }
        gaps
    }

    /// Gaps that no competitor covers.
    pub fn shared_gaps(&self) -> Vec<&str> {
        self.all_gaps()
            .into_iter()
            .filter(|gap| self.competitors.iter().all(|c| c.gaps.iter().any(|g| g == gap)))
            .collect()
    }
}

/// Runs competitive analyses.
#[derive(Clone)]
pub struct CompetitiveAnalyzer {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    max_competitors: usize,
    request_timeout: Duration,
    overall_budget: Duration,
}

impl CompetitiveAnalyzer {
    /// Create an analyzer with default limits (5 results, 15s per page,
    /// 45s overall).
    pub fn new(search: Arc<dyn SearchProvider>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::from_config(search, fetcher, &CompetitiveConfig::default())
    }

    /// Create an analyzer with limits from configuration.
    pub fn from_config(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        config: &CompetitiveConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            max_competitors: config.max_competitors,
            request_timeout: config.request_timeout(),
            overall_budget: config.overall_budget(),
        }
    }

    /// Override the per-page timeout and overall budget.
    pub fn with_timeouts(mut self, request_timeout: Duration, overall_budget: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.overall_budget = overall_budget;
        self
    }

    /// Analyze against the generic CMS hint set.
    pub async fn analyze(&self, keyword: &str) -> CoreResult<CompetitiveContext> {
        self.analyze_with_hints(keyword, &generic_hints()).await
    }

    /// Analyze against an archetype's structural hints.
    pub async fn analyze_for(&self, keyword: &str, archetype: &Archetype) -> CoreResult<CompetitiveContext> {
        self.analyze_with_hints(keyword, &archetype.hints).await
    }

    async fn analyze_with_hints(
        &self,
        keyword: &str,
        hints: &[StructuralHint],
    ) -> CoreResult<CompetitiveContext> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(CoreError::InvalidRequest("keyword must not be empty".to_string()));
        }
        let unavailable = |reason: String| CoreError::AnalysisUnavailable { keyword: keyword.to_string(), reason };

        let mut urls = self
            .search
            .search(keyword, self.max_competitors)
            .await
            .map_err(|e| unavailable(format!("{} search failed: {}", self.search.name(), e)))?;
        let mut seen = std::collections::HashSet::new();
        urls.retain(|url| seen.insert(url.clone()));
        urls.truncate(self.max_competitors);

        if urls.is_empty() {
            return Err(unavailable("no organic results".to_string()));
        }
        tracing::debug!(keyword, results = urls.len(), provider = self.search.name(), "Fetching competitors");

        let deadline = tokio::time::Instant::now() + self.overall_budget;
        let request_timeout = self.request_timeout;
        let hints: Arc<[StructuralHint]> = hints.into();
        let analyses = urls.iter().map(|url| {
            let fetcher = Arc::clone(&self.fetcher);
            let hints = Arc::clone(&hints);
            let analysis = async move {
                let html = match tokio::time::timeout(request_timeout, fetcher.fetch(url, request_timeout)).await {
                    Err(_) => return Err(FetchError::Timeout(request_timeout)),
                    Ok(Err(e)) => return Err(e),
                    Ok(Ok(html)) => html,
                };
                // Extraction is CPU-bound; keep it off the async workers.
                let owned_url = url.clone();
                match tokio::task::spawn_blocking(move || extract::summarize(&owned_url, &html, &hints)).await {
                    Ok(summary) => summary,
                    Err(e) => Err(FetchError::Extraction(e.to_string())),
                }
            };
            async move { tokio::time::timeout_at(deadline, analysis).await.unwrap_or(Err(FetchError::BudgetExhausted)) }
        });
        let results = join_all(analyses).await;

        let mut competitors = Vec::new();
        let mut skipped = Vec::new();
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(summary) => competitors.push(summary),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping competitor");
                    skipped.push(SkippedCompetitor { url: url.clone(), reason: e.to_string() });
                }
            }
        }

        if competitors.is_empty() {
            return Err(unavailable(format!("none of {} results could be analyzed", urls.len())));
        }

        tracing::info!(
            keyword,
            analyzed = competitors.len(),
            skipped = skipped.len(),
            "Competitive analysis complete"
        );
        Ok(CompetitiveContext { keyword: keyword.to_string(), competitors, skipped })
    }
}
