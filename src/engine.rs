//! Core API.
//!
//! [`Engine`] ties the registry, orchestrator, analyzer and validator
//! together and reports every failure as a serializable
//! [`FailureDescriptor`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, ArchetypeRegistry};
use crate::competitive::{CompetitiveAnalyzer, CompetitiveContext};
use crate::core::{CancellationFlag, CoreError};
use crate::pipeline::{GenerationRun, Orchestrator, RunFailure};
use crate::request::GenerationRequest;
use crate::validation::{ValidationReport, Validator};

/// Failure as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{stage}: {cause}")]
pub struct FailureDescriptor {
    /// Where it failed: a generation stage, `analysis`, `validation` or `request`
    pub stage: String,
    /// Error kind, e.g. `provider_transient`
    pub kind: String,
    /// Human-readable cause
    pub cause: String,
    /// Whether re-submitting could succeed
    pub retryable: bool,
    /// Run id, for generation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl FailureDescriptor {
    /// Describe a core error raised at `stage`.
    pub fn new(stage: impl Into<String>, error: &CoreError) -> Self {
        Self {
            stage: stage.into(),
            kind: error.kind().to_string(),
            cause: error.to_string(),
            retryable: error.is_retryable(),
            run_id: None,
        }
    }
}

impl From<RunFailure> for FailureDescriptor {
    fn from(failure: RunFailure) -> Self {
        Self { run_id: Some(failure.run_id.to_string()), ..Self::new(failure.stage.as_str(), &failure.error) }
    }
}

/// Facade over the generation core.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<ArchetypeRegistry>,
    orchestrator: Orchestrator,
    analyzer: Option<CompetitiveAnalyzer>,
    validator: Validator,
}

impl Engine {
    /// Create an engine without competitive analysis.
    pub fn new(registry: Arc<ArchetypeRegistry>, orchestrator: Orchestrator, validator: Validator) -> Self {
        Self { registry, orchestrator, analyzer: None, validator }
    }

    /// Enable competitive analysis.
    pub fn with_analyzer(mut self, analyzer: CompetitiveAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Build an engine from configuration and environment.
    ///
    /// Competitive analysis is enabled when SEMRUSH_API_KEY is set.
    #[cfg(feature = "http")]
    pub fn from_config(config: &crate::core::Config) -> anyhow::Result<Self> {
        use crate::competitive::{HttpFetcher, SemrushSearch};

        let model = crate::llm::provider_from_config(&config.llm)?;
        let orchestrator = Orchestrator::from_config(model, config);
        let mut engine = Self::new(
            Arc::new(ArchetypeRegistry::builtin()),
            orchestrator,
            Validator::new(config.validation.clone()),
        );

        match SemrushSearch::new(config.competitive.database.clone()) {
            Ok(search) => {
                let analyzer = CompetitiveAnalyzer::from_config(
                    Arc::new(search),
                    Arc::new(HttpFetcher::new(&config.competitive)),
                    &config.competitive,
                );
                engine = engine.with_analyzer(analyzer);
            }
            Err(e) => tracing::debug!(error = %e, "Competitive analysis disabled"),
        }
        Ok(engine)
    }

    /// The archetype catalog.
    pub fn registry(&self) -> &ArchetypeRegistry {
        &self.registry
    }

    /// Look up an archetype.
    pub fn archetype(&self, id: &str) -> Result<Arc<Archetype>, FailureDescriptor> {
        self.registry.get(id).map_err(|e| FailureDescriptor::new("request", &e))
    }

    /// Run the three-stage pipeline.
    pub async fn run_generation(&self, request: &GenerationRequest) -> Result<GenerationRun, FailureDescriptor> {
        self.run_generation_with_cancel(request, &CancellationFlag::new()).await
    }

    /// Run the pipeline, checking `cancel` between stages.
    pub async fn run_generation_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationFlag,
    ) -> Result<GenerationRun, FailureDescriptor> {
        self.orchestrator.run(request, cancel).await.map_err(FailureDescriptor::from)
    }

    /// Analyze competitors with the generic hint set.
    pub async fn analyze_competitors(&self, keyword: &str) -> Result<CompetitiveContext, FailureDescriptor> {
        let analyzer = self.analyzer()?;
        analyzer.analyze(keyword).await.map_err(|e| FailureDescriptor::new("analysis", &e))
    }

    /// Analyze competitors against an archetype's hints.
    pub async fn analyze_competitors_for(
        &self,
        keyword: &str,
        archetype_id: &str,
    ) -> Result<CompetitiveContext, FailureDescriptor> {
        let archetype = self.archetype(archetype_id)?;
        let analyzer = self.analyzer()?;
        analyzer.analyze_for(keyword, &archetype).await.map_err(|e| FailureDescriptor::new("analysis", &e))
    }

    /// Validate HTML against an archetype's default target.
    ///
    /// Fails only for an unknown archetype.
    pub fn validate(&self, html: &str, archetype_id: &str) -> Result<ValidationReport, FailureDescriptor> {
        let archetype = self.archetype(archetype_id)?;
        Ok(self.validator.validate_for(html, &archetype, archetype.words.default))
    }

    /// Validate HTML against an archetype and explicit target.
    ///
    /// The target must lie within the archetype's word range.
    pub fn validate_with_target(
        &self,
        html: &str,
        archetype_id: &str,
        target: usize,
    ) -> Result<ValidationReport, FailureDescriptor> {
        let archetype = self.archetype(archetype_id)?;
        let target = archetype.check_target(target).map_err(|e| FailureDescriptor::new("request", &e))?;
        Ok(self.validator.validate_for(html, &archetype, target))
    }

    /// Validate a run's output against its request.
    pub fn validate_request(&self, html: &str, request: &GenerationRequest) -> ValidationReport {
        self.validator.validate(html, request)
    }

    fn analyzer(&self) -> Result<&CompetitiveAnalyzer, FailureDescriptor> {
        self.analyzer.as_ref().ok_or_else(|| {
            FailureDescriptor::new(
                "analysis",
                &CoreError::Config("no search provider configured (set SEMRUSH_API_KEY)".to_string()),
            )
        })
    }
}
