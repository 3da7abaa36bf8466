//! Generation requests.
//!
//! A [`GenerationRequest`] can only be obtained through its builder, which
//! checks the supplied fields against the archetype's schema. Unknown keys,
//! malformed values and missing required inputs are rejected here, before
//! any prompt is assembled.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::archetype::Archetype;
use crate::competitive::CompetitiveContext;
use crate::core::{CoreError, CoreResult};
use crate::product::ProductData;

/// Generation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Fresh article
    #[default]
    New,
    /// Competitive rewrite informed by scraped competitors
    Rewrite,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Rewrite => write!(f, "rewrite"),
        }
    }
}

/// How the article addresses the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Second person, informal
    #[default]
    Informal,
    /// Second person, formal
    Formal,
    /// No direct address
    Impersonal,
}

/// Tone parameters layered on top of the brand voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneParams {
    /// Reader address
    pub addressing: Addressing,
    /// Whether light humor and tech analogies are welcome
    pub humor: bool,
    /// Extra tone notes from the writer
    pub notes: Vec<String>,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self { addressing: Addressing::Informal, humor: true, notes: Vec::new() }
    }
}

/// Kind of link the article must include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Category or editorial page on the brand's site
    Internal,
    /// Product detail page on the brand's site
    Product,
    /// Third-party source
    External,
}

/// A link the writer wants embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Target URL
    pub url: String,
    /// Anchor text
    pub anchor: String,
    /// Link kind
    pub kind: LinkKind,
}

/// A validated, immutable generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub(crate) archetype: Arc<Archetype>,
    pub(crate) keyword: String,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) target_length: usize,
    pub(crate) tone: ToneParams,
    pub(crate) mode: Mode,
    pub(crate) competitive: Option<CompetitiveContext>,
    pub(crate) secondary_keywords: Vec<String>,
    pub(crate) links: Vec<LinkSpec>,
    pub(crate) instructions: Option<String>,
    pub(crate) product: Option<ProductData>,
}

impl GenerationRequest {
    /// Start building a request for an archetype and main keyword.
    pub fn builder(archetype: Arc<Archetype>, keyword: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            archetype,
            keyword: keyword.into(),
            fields: BTreeMap::new(),
            target_length: None,
            tone: ToneParams::default(),
            competitive: None,
            secondary_keywords: Vec::new(),
            links: Vec::new(),
            instructions: None,
            product: None,
        }
    }

    /// The archetype this request targets.
    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Main keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Field values keyed by field name.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Value of one field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Exact target length in words.
    pub fn target_length(&self) -> usize {
        self.target_length
    }

    /// Tone parameters.
    pub fn tone(&self) -> &ToneParams {
        &self.tone
    }

    /// Generation mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Competitive context (rewrite mode only).
    pub fn competitive(&self) -> Option<&CompetitiveContext> {
        self.competitive.as_ref()
    }

    /// Secondary keywords.
    pub fn secondary_keywords(&self) -> &[String] {
        &self.secondary_keywords
    }

    /// Links to embed.
    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    /// Free-form extra instructions.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Structured product sheet, if one was supplied.
    pub fn product(&self) -> Option<&ProductData> {
        self.product.as_ref()
    }

    /// Required archetype fields without a non-blank value.
    pub fn missing_fields(&self) -> Vec<String> {
        self.archetype
            .required_fields()
            .filter(|spec| self.field(&spec.name).map_or(true, |v| v.trim().is_empty()))
            .map(|spec| spec.name.clone())
            .collect()
    }

    /// Fail with `IncompleteRequest` when a required field is missing.
    pub fn ensure_complete(&self) -> CoreResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::IncompleteRequest { archetype: self.archetype.id.clone(), missing })
        }
    }

    /// Deterministic SHA-256 fingerprint of the request's content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.archetype.id.as_bytes());
        hasher.update([0]);
        hasher.update(self.mode.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(self.keyword.as_bytes());
        hasher.update([0]);
        hasher.update(self.target_length.to_le_bytes());
        for (key, value) in &self.fields {
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.as_bytes());
            hasher.update([0]);
        }
        for keyword in &self.secondary_keywords {
            hasher.update(keyword.as_bytes());
            hasher.update([0]);
        }
        if let Some(ref instructions) = self.instructions {
            hasher.update(instructions.as_bytes());
        }
        if let Some(ref product) = self.product {
            hasher.update(product.product_id.as_bytes());
            hasher.update([0]);
        }
        if let Some(ref context) = self.competitive {
            hasher.update(context.keyword.as_bytes());
            for competitor in &context.competitors {
                hasher.update(competitor.url.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Builder for [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    archetype: Arc<Archetype>,
    keyword: String,
    fields: BTreeMap<String, String>,
    target_length: Option<usize>,
    tone: ToneParams,
    competitive: Option<CompetitiveContext>,
    secondary_keywords: Vec<String>,
    links: Vec<LinkSpec>,
    instructions: Option<String>,
    product: Option<ProductData>,
}

impl GenerationRequestBuilder {
    /// Set one archetype field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set several archetype fields.
    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the exact target length in words.
    pub fn target_length(mut self, words: usize) -> Self {
        self.target_length = Some(words);
        self
    }

    /// Set tone parameters.
    pub fn tone(mut self, tone: ToneParams) -> Self {
        self.tone = tone;
        self
    }

    /// Add secondary keywords.
    pub fn secondary_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Add a link to embed.
    pub fn link(mut self, link: LinkSpec) -> Self {
        self.links.push(link);
        self
    }

    /// Set extra instructions.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = (!instructions.trim().is_empty()).then_some(instructions);
        self
    }

    /// Attach a structured product sheet.
    pub fn product(mut self, product: ProductData) -> Self {
        self.product = Some(product);
        self
    }

    /// Switch to rewrite mode with the given competitive context.
    pub fn rewrite(mut self, context: CompetitiveContext) -> Self {
        self.competitive = Some(context);
        self
    }

    /// Validate and build the request.
    pub fn build(self) -> CoreResult<GenerationRequest> {
        let archetype = self.archetype;

        let keyword = self.keyword.trim().to_string();
        if keyword.is_empty() {
            return Err(CoreError::IncompleteRequest {
                archetype: archetype.id.clone(),
                missing: vec!["keyword".to_string()],
            });
        }

        for (name, value) in &self.fields {
            let Some(spec) = archetype.field(name) else {
                return Err(CoreError::InvalidRequest(format!(
                    "unknown field '{}' for archetype '{}'",
                    name, archetype.id
                )));
            };
            if !value.trim().is_empty() && !spec.kind.accepts(value) {
                return Err(CoreError::InvalidRequest(format!(
                    "field '{}' expects a {:?} value, got '{}'",
                    name, spec.kind, value
                )));
            }
        }

        let target_length = match self.target_length {
            Some(target) => archetype.check_target(target)?,
            None => archetype.words.default,
        };

        let mode = if self.competitive.is_some() { Mode::Rewrite } else { Mode::New };

        let request = GenerationRequest {
            archetype,
            keyword,
            fields: self.fields,
            target_length,
            tone: self.tone,
            mode,
            competitive: self.competitive,
            secondary_keywords: self.secondary_keywords,
            links: self.links,
            instructions: self.instructions,
            product: self.product,
        };
        request.ensure_complete()?;
        Ok(request)
    }
}
