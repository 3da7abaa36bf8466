//! Three-stage generation pipeline.
//!
//! A run always moves `Idle → Drafting → Critiquing → Finalizing → Done`.
//! Each stage starts only after the previous one produced usable output; any
//! failure ends the run in `Failed` carrying the stage it reached. Runs own
//! their state, so independent runs can share one [`Orchestrator`].

mod critique;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::core::{
    retry_async_if, CancellationFlag, Config, CoreError, CoreResult, ProviderError, RetryConfig,
};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompt::PromptBuilder;
use crate::request::GenerationRequest;
use crate::validation::count_words;

pub use critique::{CritiqueReport, Issue};

/// Generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Draft,
    Critique,
    Final,
}

impl Stage {
    /// Stages in execution order.
    pub const ORDER: [Self; 3] = [Self::Draft, Self::Critique, Self::Final];

    /// Lowercase stage id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Critique => "critique",
            Self::Final => "final",
        }
    }

    /// Run state while this stage executes.
    pub fn state(&self) -> RunState {
        match self {
            Self::Draft => RunState::Drafting,
            Self::Critique => RunState::Critiquing,
            Self::Final => RunState::Finalizing,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Drafting,
    Critiquing,
    Finalizing,
    Done,
    Failed,
}

impl RunState {
    /// Whether `next` is a legal successor.
    pub fn can_advance_to(self, next: Self) -> bool {
        use RunState::{Critiquing, Done, Drafting, Failed, Finalizing, Idle};
        matches!(
            (self, next),
            (Idle, Drafting)
                | (Drafting, Critiquing)
                | (Critiquing, Finalizing)
                | (Finalizing, Done)
                | (Drafting | Critiquing | Finalizing, Failed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Measurements of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMetrics {
    /// Characters in the output
    pub chars: usize,
    /// Approximate tokens (characters / 4)
    pub approx_tokens: usize,
    /// Words in the output
    pub words: usize,
    /// Model calls made for this stage, retries included
    pub attempts: u32,
    /// Wall-clock time spent in the stage
    pub elapsed_ms: u64,
}

/// Output of one completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Stage that produced it
    pub stage: Stage,
    /// Model output, with any wrapping code fence removed
    pub text: String,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Measurements
    pub metrics: StageMetrics,
}

/// A run's record: one output per completed stage, in order.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRun {
    run_id: Uuid,
    fingerprint: String,
    archetype: String,
    state: RunState,
    stages: Vec<StageOutput>,
    critique: Option<CritiqueReport>,
}

impl GenerationRun {
    fn new(request: &GenerationRequest) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            fingerprint: request.fingerprint(),
            archetype: request.archetype().id.clone(),
            state: RunState::Idle,
            stages: Vec::with_capacity(Stage::ORDER.len()),
            critique: None,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug_assert!(self.state.can_advance_to(next), "{:?} -> {:?}", self.state, next);
        tracing::debug!(from = ?self.state, to = ?next, "Run state change");
        self.state = next;
    }

    fn record(&mut self, stage: Stage, text: String, attempts: u32, elapsed: Duration) {
        debug_assert_eq!(Stage::ORDER.get(self.stages.len()), Some(&stage));
        let chars = text.chars().count();
        let metrics = StageMetrics {
            chars,
            approx_tokens: chars / 4,
            words: count_words(&text),
            attempts,
            elapsed_ms: elapsed.as_millis() as u64,
        };
        tracing::info!(
            stage = %stage,
            chars,
            words = metrics.words,
            attempts,
            elapsed_ms = metrics.elapsed_ms,
            "Stage complete"
        );
        self.stages.push(StageOutput { stage, text, timestamp: Utc::now(), metrics });
    }

    fn fail(self, stage: Stage, error: CoreError) -> RunFailure {
        tracing::warn!(stage = %stage, kind = error.kind(), error = %error, "Run failed");
        RunFailure { run_id: self.run_id, stage, reached: self.state, error, completed: self.stages }
    }

    /// Unique run id.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Fingerprint of the request that started the run.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Archetype id.
    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Completed stages in order.
    pub fn stages(&self) -> &[StageOutput] {
        &self.stages
    }

    /// Output of a stage, once completed.
    pub fn stage(&self, stage: Stage) -> Option<&StageOutput> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Parsed critique, once the critique stage completed.
    pub fn critique(&self) -> Option<&CritiqueReport> {
        self.critique.as_ref()
    }

    /// Final HTML of a finished run.
    pub fn final_html(&self) -> Option<&str> {
        self.stage(Stage::Final).map(|s| s.text.as_str())
    }
}

/// A run that ended in `Failed`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct RunFailure {
    /// Run id
    pub run_id: Uuid,
    /// Stage that failed
    pub stage: Stage,
    /// State the run was in when it failed
    pub reached: RunState,
    /// Cause
    pub error: CoreError,
    /// Stages that completed before the failure
    pub completed: Vec<StageOutput>,
}

/// Drives runs through the three stages.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    prompts: PromptBuilder,
    retry: RetryConfig,
    call_timeout: Duration,
    max_tokens: u32,
    temperature: f32,
    critique_temperature: f32,
    max_response_chars: usize,
}

impl Orchestrator {
    /// Create an orchestrator with default settings.
    pub fn new(model: Arc<dyn LanguageModel>, prompts: PromptBuilder) -> Self {
        let config = Config::default();
        Self::from_config(model, &config).with_prompts(prompts)
    }

    /// Create an orchestrator from configuration.
    pub fn from_config(model: Arc<dyn LanguageModel>, config: &Config) -> Self {
        let call_timeout = config.llm.call_timeout();
        Self {
            model,
            prompts: PromptBuilder::from_config(config),
            retry: config.generation.retry_config(),
            call_timeout,
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            critique_temperature: config.llm.critique_temperature,
            max_response_chars: config.llm.max_response_chars,
        }
    }

    /// Replace the prompt builder.
    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Replace the per-call retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the response size ceiling, in characters.
    pub fn with_max_response_chars(mut self, max_chars: usize) -> Self {
        self.max_response_chars = max_chars;
        self
    }

    /// The model in use.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Execute a run to completion or failure.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationFlag,
    ) -> Result<GenerationRun, RunFailure> {
        let run = GenerationRun::new(request);
        let span = tracing::info_span!(
            "generation",
            run_id = %run.run_id,
            archetype = %run.archetype,
            mode = %request.mode(),
            model = self.model.name()
        );
        self.run_stages(run, request, cancel).instrument(span).await
    }

    async fn run_stages(
        &self,
        mut run: GenerationRun,
        request: &GenerationRequest,
        cancel: &CancellationFlag,
    ) -> Result<GenerationRun, RunFailure> {
        // Draft
        run.enter(RunState::Drafting);
        let started = Instant::now();
        let calls = AtomicU32::new(0);
        let draft = match self.draft(request, cancel, &calls).await {
            Ok(text) => text,
            Err(e) => return Err(run.fail(Stage::Draft, e)),
        };
        run.record(Stage::Draft, draft.clone(), calls.load(Ordering::Relaxed), started.elapsed());

        // Critique
        run.enter(RunState::Critiquing);
        let started = Instant::now();
        let calls = AtomicU32::new(0);
        let (critique_text, report) = match self.critique(request, &draft, cancel, &calls).await {
            Ok(parsed) => parsed,
            Err(e) => return Err(run.fail(Stage::Critique, e)),
        };
        run.record(Stage::Critique, critique_text, calls.load(Ordering::Relaxed), started.elapsed());
        tracing::debug!(issues = report.issues.len(), "Critique parsed");
        run.critique = Some(report);

        // Final
        run.enter(RunState::Finalizing);
        let started = Instant::now();
        let calls = AtomicU32::new(0);
        let report = run.critique.clone().unwrap_or_default();
        let final_text = match self.finalize(request, &draft, &report, cancel, &calls).await {
            Ok(text) => text,
            Err(e) => return Err(run.fail(Stage::Final, e)),
        };
        run.record(Stage::Final, final_text, calls.load(Ordering::Relaxed), started.elapsed());

        run.enter(RunState::Done);
        Ok(run)
    }

    async fn draft(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationFlag,
        calls: &AtomicU32,
    ) -> CoreResult<String> {
        check_cancelled(cancel)?;
        let prompt = self.prompts.build_draft_prompt(request)?;
        self.call(Stage::Draft, prompt, self.temperature, Body::Html, calls).await
    }

    async fn critique(
        &self,
        request: &GenerationRequest,
        draft: &str,
        cancel: &CancellationFlag,
        calls: &AtomicU32,
    ) -> CoreResult<(String, CritiqueReport)> {
        check_cancelled(cancel)?;
        let max_issues = self.prompts.max_issues();

        let outcome = retry_async_if(
            &RetryConfig::once_immediately(),
            |e: &CoreError| matches!(e, CoreError::MalformedCritique(_)),
            |attempt| async move {
                let prompt = if attempt == 1 {
                    self.prompts.build_critique_prompt(request, draft)?
                } else {
                    tracing::info!("Critique unparseable, retrying with strict formatting");
                    self.prompts.build_strict_critique_prompt(request, draft)?
                };
                let text =
                    self.call(Stage::Critique, prompt, self.critique_temperature, Body::Json, calls).await?;
                let report = CritiqueReport::parse(&text, max_issues)?;
                Ok((text, report))
            },
        )
        .await;

        outcome.into_result()
    }

    async fn finalize(
        &self,
        request: &GenerationRequest,
        draft: &str,
        critique: &CritiqueReport,
        cancel: &CancellationFlag,
        calls: &AtomicU32,
    ) -> CoreResult<String> {
        check_cancelled(cancel)?;
        let prompt = self.prompts.build_final_prompt(request, draft, critique)?;
        self.call(Stage::Final, prompt, self.temperature, Body::Html, calls).await
    }

    /// One model call with transient retries, a per-call timeout, an empty
    /// output check and a response size ceiling. HTML bodies are unwrapped
    /// from a surrounding code fence before the empty check.
    async fn call(
        &self,
        stage: Stage,
        prompt: String,
        temperature: f32,
        body: Body,
        calls: &AtomicU32,
    ) -> CoreResult<String> {
        let request = CompletionRequest::new(prompt)
            .with_system(self.prompts.system_prompt())
            .with_max_tokens(self.max_tokens)
            .with_temperature(temperature);
        let request = &request;

        let outcome = retry_async_if(
            &self.retry,
            |e: &CoreError| matches!(e, CoreError::Provider(ProviderError::Transient(_))),
            |attempt| async move {
                calls.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(stage = %stage, attempt, prompt_chars = request.prompt.len(), "Calling model");

                let text = match tokio::time::timeout(self.call_timeout, self.model.complete(request)).await {
                    Err(_) => {
                        return Err(CoreError::Provider(ProviderError::Transient(format!(
                            "no response within {}s",
                            self.call_timeout.as_secs()
                        ))))
                    }
                    Ok(result) => result?,
                };
                let text = match body {
                    Body::Html => strip_code_fence(&text).to_string(),
                    Body::Json => text,
                };

                if text.trim().is_empty() {
                    return Err(CoreError::Provider(ProviderError::Transient(
                        "model returned an empty response".to_string(),
                    )));
                }
                if text.chars().count() > self.max_response_chars {
                    return Err(CoreError::Provider(ProviderError::Fatal(format!(
                        "response exceeds {} characters",
                        self.max_response_chars
                    ))));
                }
                Ok(text)
            },
        )
        .await;

        if outcome.was_retried {
            tracing::debug!(stage = %stage, attempts = outcome.attempts, "Model call retried");
        }
        outcome.into_result()
    }
}

/// Expected shape of a model response.
#[derive(Debug, Clone, Copy)]
enum Body {
    Html,
    Json,
}

fn check_cancelled(cancel: &CancellationFlag) -> CoreResult<()> {
    if cancel.is_cancelled() {
        Err(CoreError::Cancelled)
    } else {
        Ok(())
    }
}

/// Remove a Markdown code fence wrapped around the whole output.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (```html), with or without a line break after it.
    let info_len = body.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(body.len());
    body[info_len..].trim()
}
