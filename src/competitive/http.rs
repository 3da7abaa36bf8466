//! HTTP search and fetch adapters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{PageFetcher, SearchProvider};
use crate::core::{CompetitiveConfig, FetchError};

const SEMRUSH_BASE_URL: &str = "https://api.semrush.com/";

/// Fetches competitor pages with a browser user agent.
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher using the configured user agent.
    pub fn new(config: &CompetitiveConfig) -> Self {
        Self { client: Client::new(), user_agent: config.user_agent.clone() }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        response.text().await.map_err(|e| request_error(e, timeout))
    }
}

fn request_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Connection(error.to_string())
    }
}

/// SEMrush `phrase_organic` report as a search provider.
pub struct SemrushSearch {
    client: Client,
    api_key: String,
    database: String,
    base_url: String,
}

impl SemrushSearch {
    /// Create a provider.
    ///
    /// Reads the API key from SEMRUSH_API_KEY environment variable.
    pub fn new(database: impl Into<String>) -> anyhow::Result<Self> {
        let api_key =
            std::env::var("SEMRUSH_API_KEY").map_err(|_| anyhow::anyhow!("SEMRUSH_API_KEY not set"))?;
        Ok(Self::with_key(api_key, database))
    }

    /// Create a provider with an explicit key.
    pub fn with_key(api_key: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            database: database.into(),
            base_url: SEMRUSH_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for SemrushSearch {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}?type=phrase_organic&key={}&phrase={}&database={}&display_limit={}&export_columns=Ur",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(keyword),
            urlencoding::encode(&self.database),
            limit.min(100)
        );

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| FetchError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Search(format!("SEMrush returned HTTP {}", status.as_u16())));
        }

        let body = response.text().await.map_err(|e| FetchError::Search(e.to_string()))?;
        let mut urls = parse_semrush_response(&body)?;
        urls.truncate(limit);
        Ok(urls)
    }

    fn name(&self) -> &str {
        "semrush"
    }
}

/// Parse a semicolon-separated SEMrush report into its `Url` column.
///
/// SEMrush reports errors in the body (`ERROR 50 :: NOTHING FOUND`); "nothing
/// found" is an empty result, any other error is a search failure.
pub fn parse_semrush_response(body: &str) -> Result<Vec<String>, FetchError> {
    let body = body.trim();
    if let Some(error) = body.strip_prefix("ERROR") {
        if error.contains("NOTHING FOUND") {
            return Ok(Vec::new());
        }
        return Err(FetchError::Search(format!("SEMrush ERROR{}", error)));
    }

    let mut lines = body.lines();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let column = header
        .split(';')
        .position(|name| name.trim() == "Url")
        .ok_or_else(|| FetchError::Search(format!("no Url column in report header '{}'", header)))?;

    Ok(lines
        .filter_map(|line| line.split(';').nth(column))
        .map(str::trim)
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
        .map(str::to_string)
        .collect())
}
