//! Ollama local LLM integration.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{classify_status, transport_error, CompletionRequest, LanguageModel};
use crate::core::{OllamaConfig, ProviderError};

/// Ollama API provider for local LLM.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a provider from configuration.
    ///
    /// OLLAMA_HOST overrides the configured base URL.
    pub fn new(config: &OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: std::env::var("OLLAMA_HOST").unwrap_or_else(|_| config.base_url.clone()),
            model: config.model.clone(),
        }
    }

    /// Create with a specific base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl LanguageModel for OllamaProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = OllamaRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            options: OllamaOptions { temperature: request.temperature, num_predict: request.max_tokens },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Fatal(format!("Unexpected Ollama response: {}", e)))?;
        Ok(response.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama generate request.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama generate response.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}
