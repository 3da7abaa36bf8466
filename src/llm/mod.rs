//! Language model integration.
//!
//! The orchestrator talks to a [`LanguageModel`]; adapters for the Anthropic
//! Messages API and a local Ollama server are provided behind the `http`
//! feature. Provider failures are classified as transient or fatal so the
//! caller can decide whether another attempt is worthwhile.

#[cfg(feature = "http")]
mod claude;
#[cfg(feature = "http")]
mod ollama;

#[cfg(feature = "http")]
pub use claude::ClaudeProvider;
#[cfg(feature = "http")]
pub use ollama::OllamaProvider;

use async_trait::async_trait;

use crate::core::ProviderError;

/// A single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request with default limits.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), system: None, max_tokens: 8000, temperature: 0.7 }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Trait for language model providers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Classify an HTTP error status.
///
/// Rate limits, request timeouts and server-side failures (including
/// Anthropic's 529 "overloaded") are transient; everything else is fatal.
pub fn classify_status(status: u16, body: &str) -> ProviderError {
    let message = format!("HTTP {}: {}", status, body.trim());
    match status {
        408 | 409 | 425 | 429 | 500..=599 => ProviderError::Transient(message),
        _ => ProviderError::Fatal(message),
    }
}

/// Classify a transport-level failure.
#[cfg(feature = "http")]
pub(crate) fn transport_error(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        ProviderError::Transient(error.to_string())
    } else {
        ProviderError::Fatal(error.to_string())
    }
}

/// Build the configured provider.
#[cfg(feature = "http")]
pub fn provider_from_config(
    config: &crate::core::LlmConfig,
) -> anyhow::Result<std::sync::Arc<dyn LanguageModel>> {
    match config.provider.as_str() {
        "claude" | "anthropic" => {
            let mut provider = ClaudeProvider::new()?;
            if let Some(ref model) = config.model {
                provider = provider.with_model(model);
            }
            Ok(std::sync::Arc::new(provider))
        }
        "ollama" => {
            let mut provider = OllamaProvider::new(&config.ollama);
            if let Some(ref model) = config.model {
                provider = provider.with_model(model);
            }
            Ok(std::sync::Arc::new(provider))
        }
        other => anyhow::bail!("Unknown LLM provider '{}' (expected claude or ollama)", other),
    }
}
