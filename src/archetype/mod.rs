//! Archetype registry.
//!
//! An archetype is a content template: which inputs the writer must supply,
//! how long the article should be, and which structural elements the CMS
//! expects. The built-in catalog is created once and shared read-only
//! between concurrent runs.

mod catalog;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

pub use catalog::generic_hints;

/// Kind of value an archetype field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Short single-line text
    Text,
    /// Free-form paragraph
    LongText,
    /// Integer or decimal number
    Number,
    /// Absolute URL
    Url,
    /// Comma-separated list
    List,
}

impl FieldKind {
    /// Check that a raw value is acceptable for this kind.
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Self::Text | Self::LongText | Self::List => true,
            Self::Number => value.replace(',', ".").parse::<f64>().is_ok(),
            Self::Url => value.starts_with("http://") || value.starts_with("https://"),
        }
    }
}

/// One input an archetype asks the writer for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field key used in requests
    pub name: String,
    /// Expected value kind
    pub kind: FieldKind,
    /// Help text shown next to the input
    pub help: Option<String>,
    /// Whether the request must supply it
    pub required: bool,
}

/// Target word-count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    /// Shortest acceptable target
    pub min: usize,
    /// Target used when the request does not set one
    pub default: usize,
    /// Longest acceptable target
    pub max: usize,
}

impl WordRange {
    /// Check whether a requested target lies within the range.
    pub fn contains(&self, target: usize) -> bool {
        (self.min..=self.max).contains(&target)
    }
}

/// Structural expectation of an archetype, e.g. "comparison table".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralHint {
    /// Instruction as it appears in prompts
    pub description: String,
    /// Lowercase fragments that reveal the element in a competitor's headings
    pub match_terms: Vec<String>,
    /// HTML tag whose presence also satisfies the hint
    pub element: Option<String>,
}

/// Optional CMS blocks that some archetypes make mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmsElement {
    /// Highlighted tip or warning box
    Callout,
    /// Frequently asked questions block
    Faq,
    /// Closing verdict box
    Verdict,
}

impl CmsElement {
    /// All elements in check order.
    pub const ALL: [Self; 3] = [Self::Callout, Self::Faq, Self::Verdict];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Callout => "callout box",
            Self::Faq => "FAQ block",
            Self::Verdict => "verdict box",
        }
    }
}

impl fmt::Display for CmsElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minimum link counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkThresholds {
    /// Links to the brand's own site
    pub min_internal: usize,
    /// Links to third-party sites
    pub min_external: usize,
}

/// A content template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    /// Stable identifier (kebab-case)
    pub id: String,
    /// Display name
    pub name: String,
    /// One-sentence description used in prompts
    pub description: String,
    /// Inputs in display order
    pub fields: Vec<FieldSpec>,
    /// Target length range
    pub words: WordRange,
    /// Structural hints in prompt order
    pub hints: Vec<StructuralHint>,
    /// CMS blocks whose absence is critical
    pub required_elements: Vec<CmsElement>,
    /// Link minimums
    pub links: LinkThresholds,
}

impl Archetype {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields the request must supply.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Whether the CMS element is mandatory for this archetype.
    pub fn requires(&self, element: CmsElement) -> bool {
        self.required_elements.contains(&element)
    }

    /// Reject a target length outside the archetype's word range.
    pub fn check_target(&self, target: usize) -> CoreResult<usize> {
        if self.words.contains(target) {
            Ok(target)
        } else {
            Err(CoreError::InvalidRequest(format!(
                "target length {} is outside {}..={} for archetype '{}'",
                target, self.words.min, self.words.max, self.id
            )))
        }
    }
}

static BUILTIN: Lazy<ArchetypeRegistry> =
    Lazy::new(|| ArchetypeRegistry::indexed(catalog::builtin()));

/// Read-only catalog of archetypes in declared order.
#[derive(Debug, Clone)]
pub struct ArchetypeRegistry {
    archetypes: Vec<Arc<Archetype>>,
    index: HashMap<String, usize>,
}

impl ArchetypeRegistry {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Build a registry from a custom list, rejecting duplicates and
    /// inconsistent ranges.
    pub fn from_archetypes(archetypes: Vec<Archetype>) -> CoreResult<Self> {
        let mut seen = HashSet::with_capacity(archetypes.len());
        for archetype in &archetypes {
            let WordRange { min, default, max } = archetype.words;
            if !(min <= default && default <= max) || min == 0 {
                return Err(CoreError::Config(format!(
                    "archetype '{}' has an invalid word range {min}/{default}/{max}",
                    archetype.id
                )));
            }
            if !seen.insert(archetype.id.as_str()) {
                return Err(CoreError::Config(format!("duplicate archetype id '{}'", archetype.id)));
            }
        }

        Ok(Self::indexed(archetypes))
    }

    fn indexed(archetypes: Vec<Archetype>) -> Self {
        let index = archetypes.iter().enumerate().map(|(i, a)| (a.id.clone(), i)).collect();
        Self { archetypes: archetypes.into_iter().map(Arc::new).collect(), index }
    }

    /// Get an archetype by id.
    pub fn get(&self, id: &str) -> CoreResult<Arc<Archetype>> {
        self.index
            .get(id)
            .map(|&i| Arc::clone(&self.archetypes[i]))
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    /// All archetypes in declared order.
    pub fn list(&self) -> &[Arc<Archetype>] {
        &self.archetypes
    }

    /// Number of archetypes.
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = ArchetypeRegistry::builtin();
        let review = registry.get("product-review").unwrap();
        assert_eq!(review.id, "product-review");
        assert!(review.field("product").is_some_and(|f| f.required));
        assert!(review.words.contains(1200));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let registry = ArchetypeRegistry::builtin();
        assert_eq!(registry.get("haiku").unwrap_err(), CoreError::NotFound("haiku".into()));
    }

    #[test]
    fn test_list_order_is_stable() {
        let first: Vec<String> =
            ArchetypeRegistry::builtin().list().iter().map(|a| a.id.clone()).collect();
        let second: Vec<String> =
            ArchetypeRegistry::builtin().list().iter().map(|a| a.id.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first.first().map(String::as_str), Some("seo-article"));
    }

    #[test]
    fn test_every_builtin_is_well_formed() {
        for archetype in ArchetypeRegistry::builtin().list() {
            assert!(!archetype.hints.is_empty(), "{} has no hints", archetype.id);
            assert!(archetype.required_fields().count() >= 1, "{} has no inputs", archetype.id);
            assert!(archetype.words.min <= archetype.words.default);
        }
    }

    #[test]
    fn test_builtin_catalog_passes_checks() {
        assert!(ArchetypeRegistry::from_archetypes(catalog::builtin()).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let review = ArchetypeRegistry::builtin().get("product-review").unwrap();
        let result = ArchetypeRegistry::from_archetypes(vec![(*review).clone(), (*review).clone()]);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_check_target_bounds() {
        let review = ArchetypeRegistry::builtin().get("product-review").unwrap();
        assert_eq!(review.check_target(review.words.min).unwrap(), review.words.min);
        assert_eq!(review.check_target(review.words.max).unwrap(), review.words.max);
        assert!(matches!(review.check_target(0), Err(CoreError::InvalidRequest(_))));
        assert!(review.check_target(review.words.max + 1).is_err());
    }

    #[test]
    fn test_field_kind_accepts() {
        assert!(FieldKind::Number.accepts("1299,99"));
        assert!(!FieldKind::Number.accepts("cheap"));
        assert!(FieldKind::Url.accepts("https://example.com"));
        assert!(!FieldKind::Url.accepts("example.com"));
    }
}
