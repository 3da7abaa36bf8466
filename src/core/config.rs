//! Configuration management for Copyforge.
//!
//! Handles loading configuration from TOML files. Secrets never live in the
//! file; API keys are read from the environment (optionally via `.env`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RetryConfig;
use crate::prompt::BrandVoice;
use crate::validation::ValidationPolicy;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language model settings
    pub llm: LlmConfig,

    /// Stage protocol settings
    pub generation: GenerationConfig,

    /// Competitor scraping settings
    pub competitive: CompetitiveConfig,

    /// Structural validation policy
    pub validation: ValidationPolicy,

    /// Brand voice injected into every prompt
    pub brand: BrandConfig,
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider (claude, ollama)
    pub provider: String,

    /// Model to use (provider default when unset)
    pub model: Option<String>,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature for the draft and final stages
    pub temperature: f32,

    /// Sampling temperature for the critique stage
    pub critique_temperature: f32,

    /// Timeout for a single completion call, in seconds
    pub call_timeout_secs: u64,

    /// Responses longer than this many characters are rejected
    pub max_response_chars: usize,

    /// Ollama-specific settings
    pub ollama: OllamaConfig,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama server URL
    pub base_url: String,

    /// Model to use
    pub model: String,
}

/// Stage protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Retries per model call on transient provider errors
    pub retries: u32,

    /// First backoff delay between retries, in milliseconds
    pub retry_delay_ms: u64,

    /// Draft characters embedded into the critique and final prompts
    pub draft_excerpt_chars: usize,

    /// Critique characters embedded into the final prompt
    pub critique_excerpt_chars: usize,

    /// Maximum issues kept from the critique
    pub max_critique_issues: usize,
}

/// Competitor scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitiveConfig {
    /// Number of organic results analyzed
    pub max_competitors: usize,

    /// Per-page fetch timeout, in seconds
    pub request_timeout_secs: u64,

    /// Wall-clock budget for the whole analysis, in seconds
    pub overall_budget_secs: u64,

    /// SEMrush regional database
    pub database: String,

    /// User agent sent to competitor sites
    pub user_agent: String,
}

/// Brand voice configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    /// Brand name used in prompts
    pub name: String,

    /// Tone rules, one per line in the prompt
    pub tone_rules: Vec<String>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.copyforge.toml` in current directory
    /// 2. `~/.config/copyforge/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".copyforge.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.competitive.max_competitors == 0 || self.competitive.max_competitors > 5 {
            anyhow::bail!("competitive.max_competitors must be between 1 and 5");
        }
        if self.generation.max_critique_issues == 0 || self.generation.max_critique_issues > 5 {
            anyhow::bail!("generation.max_critique_issues must be between 1 and 5");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be between 0.0 and 2.0");
        }
        self.validation.check()?;
        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("copyforge"))
    }
}

impl LlmConfig {
    /// Per-call timeout as a duration.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl GenerationConfig {
    /// Retry policy applied to every model call.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::model_call()
            .with_max_attempts(self.retries)
            .with_initial_delay(Duration::from_millis(self.retry_delay_ms))
    }
}

impl CompetitiveConfig {
    /// Per-page fetch timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Overall analysis budget.
    pub fn overall_budget(&self) -> Duration {
        Duration::from_secs(self.overall_budget_secs)
    }
}

impl BrandConfig {
    /// Convert into the voice used by the prompt builder.
    pub fn voice(&self) -> BrandVoice {
        BrandVoice::new(self.name.clone(), self.tone_rules.clone())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "claude".to_string(),
            model: None,
            max_tokens: 8000,
            temperature: 0.7,
            critique_temperature: 0.3,
            call_timeout_secs: 300,
            max_response_chars: 200_000,
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:11434".to_string(), model: "llama3.2".to_string() }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            retry_delay_ms: 1000,
            draft_excerpt_chars: 8000,
            critique_excerpt_chars: 3000,
            max_critique_issues: 5,
        }
    }
}

impl Default for CompetitiveConfig {
    fn default() -> Self {
        Self {
            max_competitors: 5,
            request_timeout_secs: 15,
            overall_budget_secs: 45,
            database: "es".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Default for BrandConfig {
    fn default() -> Self {
        let voice = BrandVoice::default();
        Self { name: voice.name().to_string(), tone_rules: voice.rules().to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.max_tokens, 8000);
        assert_eq!(config.competitive.max_competitors, 5);
        assert_eq!(config.generation.retry_config().total_attempts(), 2);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[llm]
provider = "ollama"

[competitive]
request_timeout_secs = 5

[validation]
length_tolerance = 0.1
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.max_tokens, 8000);
        assert_eq!(config.competitive.request_timeout(), Duration::from_secs(5));
        assert!((config.validation.length_tolerance - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_too_many_competitors() {
        let mut config = Config::default();
        config.competitive.max_competitors = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.brand.name, config.brand.name);
        assert_eq!(parsed.validation, config.validation);
    }
}
