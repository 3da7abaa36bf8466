//! Error types shared by the generation core.

use std::time::Duration;

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure reported by a language model provider.
///
/// Transient failures (rate limits, timeouts, overloaded upstream) are worth
/// retrying; fatal ones (bad credentials, rejected request) are not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Retryable failure.
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Non-retryable failure.
    #[error("Fatal provider error: {0}")]
    Fatal(String),
}

impl ProviderError {
    /// Check whether the failure may succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Get the provider's message.
    pub fn message(&self) -> &str {
        match self {
            Self::Transient(msg) | Self::Fatal(msg) => msg,
        }
    }
}

/// Failure fetching a single page or search result list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request did not complete in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection-level failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The page had no usable main content.
    #[error("No main content found")]
    NoContent,

    /// Outline extraction did not finish.
    #[error("Page could not be processed: {0}")]
    Extraction(String),

    /// The analysis wall-clock budget ran out before this fetch finished.
    #[error("Analysis time budget exhausted")]
    BudgetExhausted,

    /// The search provider failed or returned garbage.
    #[error("Search failed: {0}")]
    Search(String),
}

/// Errors surfaced by the generation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Unknown archetype id.
    #[error("Archetype not found: {0}")]
    NotFound(String),

    /// Required archetype fields are missing from the request.
    #[error("Incomplete request for '{archetype}': missing {}", .missing.join(", "))]
    IncompleteRequest { archetype: String, missing: Vec<String> },

    /// The request is structurally wrong (unknown field, target out of range).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Language model call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The critique stage did not return parseable structure.
    #[error("Malformed critique: {0}")]
    MalformedCritique(String),

    /// A single competitor could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No competitor page was reachable.
    #[error("Competitive analysis unavailable for '{keyword}': {reason}")]
    AnalysisUnavailable { keyword: String, reason: String },

    /// The caller cancelled the run between stages.
    #[error("Run cancelled")]
    Cancelled,

    /// Engine wiring or configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::IncompleteRequest { .. } => "incomplete_request",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Provider(ProviderError::Transient(_)) => "provider_transient",
            Self::Provider(ProviderError::Fatal(_)) => "provider_fatal",
            Self::MalformedCritique(_) => "malformed_critique",
            Self::Fetch(_) => "fetch",
            Self::AnalysisUnavailable { .. } => "analysis_unavailable",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
        }
    }

    /// Whether re-submitting the same input could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider(ProviderError::Transient(_))
                | Self::MalformedCritique(_)
                | Self::AnalysisUnavailable { .. }
                | Self::Cancelled
                | Self::Fetch(_)
        )
    }
}
