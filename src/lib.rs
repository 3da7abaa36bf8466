#![allow(clippy::format_push_string)]
#![allow(clippy::unused_self)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::float_cmp)]

//! # Copyforge
//!
//! Staged LLM article generation for a CMS with strict structural rules.
//!
//! An article is produced in three model calls: a draft, a JSON critique of
//! that draft, and a final rewrite that applies the critique. The result is
//! then checked by a structural validator that knows the CMS document schema
//! and the archetype the article was written for.
//!
//! ## Features
//!
//! - **Archetypes**: Ten built-in content templates with input schemas,
//!   length ranges and structural hints
//! - **Competitive Rewrite**: Scrapes the top organic results and feeds their
//!   outlines and gaps into the prompts
//! - **Structural Validation**: Document shape, headings, CMS blocks, links,
//!   classes, length and Markdown residue
//! - **Providers**: Anthropic Messages API or a local Ollama server
//!
//! ## Quick Start
//!
//! ```bash
//! # List archetypes
//! copyforge archetypes
//!
//! # Generate a review
//! copyforge generate product-review "laptop x review" --field product="Laptop X" --target 1200
//!
//! # Validate existing HTML
//! copyforge validate article.html --archetype product-review
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::redundant_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::redundant_clone)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::use_self)]

pub mod archetype;
pub mod cms;
pub mod competitive;
pub mod core;
pub mod engine;
pub mod llm;
pub mod pipeline;
pub mod product;
pub mod prompt;
pub mod request;
pub mod validation;

// Re-export commonly used types
pub use archetype::{Archetype, ArchetypeRegistry, CmsElement, FieldKind, FieldSpec};
pub use competitive::{
    CompetitiveAnalyzer, CompetitiveContext, CompetitorSummary, PageFetcher, SearchProvider,
    SkippedCompetitor,
};
pub use core::{CancellationFlag, Config, CoreError, CoreResult, FetchError, ProviderError};
pub use engine::{Engine, FailureDescriptor};
pub use llm::{CompletionRequest, LanguageModel};
pub use pipeline::{
    CritiqueReport, GenerationRun, Issue, Orchestrator, RunFailure, RunState, Stage, StageOutput,
};
pub use product::ProductData;
pub use prompt::{BrandVoice, PromptBuilder};
pub use request::{GenerationRequest, LinkKind, LinkSpec, Mode, ToneParams};
pub use validation::{Finding, RuleId, Severity, ValidationPolicy, ValidationReport, Validator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "copyforge";
