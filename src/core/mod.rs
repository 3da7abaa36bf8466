//! Core plumbing shared by every stage of the pipeline.
//!
//! This module contains the error taxonomy, configuration, bounded retry and
//! cooperative cancellation.

mod cancel;
mod config;
mod error;
mod retry;

pub use cancel::CancellationFlag;
pub use config::{BrandConfig, CompetitiveConfig, Config, GenerationConfig, LlmConfig, OllamaConfig};
pub use error::{CoreError, CoreResult, FetchError, ProviderError};
pub use retry::{retry_async_if, RetryConfig, RetryResult};
