//! Severity mapping and tolerances.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Finding severity. Only critical findings fail a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Identifier of a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    DocumentShape,
    HeadingHierarchy,
    KickerTag,
    RequiredCallout,
    RequiredFaq,
    RequiredVerdict,
    InternalLinks,
    ExternalLinks,
    CssClasses,
    WordCount,
    MarkdownResidue,
}

impl RuleId {
    /// Every rule in evaluation order.
    pub const ALL: [Self; 11] = [
        Self::DocumentShape,
        Self::HeadingHierarchy,
        Self::KickerTag,
        Self::RequiredCallout,
        Self::RequiredFaq,
        Self::RequiredVerdict,
        Self::InternalLinks,
        Self::ExternalLinks,
        Self::CssClasses,
        Self::WordCount,
        Self::MarkdownResidue,
    ];

    /// Kebab-case identifier used in reports and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentShape => "document-shape",
            Self::HeadingHierarchy => "heading-hierarchy",
            Self::KickerTag => "kicker-tag",
            Self::RequiredCallout => "required-callout",
            Self::RequiredFaq => "required-faq",
            Self::RequiredVerdict => "required-verdict",
            Self::InternalLinks => "internal-links",
            Self::ExternalLinks => "external-links",
            Self::CssClasses => "css-classes",
            Self::WordCount => "word-count",
            Self::MarkdownResidue => "markdown-residue",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tolerances, site domains and severity overrides for the validator.
///
/// Overrides replace the severity of a rule's violations. Purely
/// informational notes (an optional element that is absent, a length inside
/// the hard tolerance) are always reported as `info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Relative length deviation above which the length finding is a violation
    pub length_tolerance: f64,

    /// Relative length deviation above which an informational note is added
    pub info_tolerance: f64,

    /// Hosts whose links count as internal (subdomains included)
    pub site_domains: Vec<String>,

    /// Per-rule severity overrides
    pub severity_overrides: BTreeMap<RuleId, Severity>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            length_tolerance: 0.05,
            info_tolerance: 0.02,
            site_domains: vec!["pccomponentes.com".to_string()],
            severity_overrides: BTreeMap::new(),
        }
    }
}

impl ValidationPolicy {
    /// Severity for a violation of `rule`, honoring overrides.
    pub fn severity(&self, rule: RuleId, default: Severity) -> Severity {
        self.severity_overrides.get(&rule).copied().unwrap_or(default)
    }

    /// Override a rule's severity.
    pub fn with_override(mut self, rule: RuleId, severity: Severity) -> Self {
        self.severity_overrides.insert(rule, severity);
        self
    }

    /// Whether a host belongs to the brand's own site.
    pub fn is_site_host(&self, host: &str) -> bool {
        let host = host.trim_start_matches("www.");
        self.site_domains.iter().any(|domain| {
            let domain = domain.trim_start_matches("www.");
            host.eq_ignore_ascii_case(domain)
                || host.to_ascii_lowercase().ends_with(&format!(".{}", domain.to_ascii_lowercase()))
        })
    }

    /// Reject inconsistent tolerances.
    pub fn check(&self) -> anyhow::Result<()> {
        if !(self.length_tolerance > 0.0 && self.length_tolerance < 1.0) {
            anyhow::bail!("validation.length_tolerance must be between 0 and 1");
        }
        if !(0.0..=self.length_tolerance).contains(&self.info_tolerance) {
            anyhow::bail!("validation.info_tolerance must be between 0 and length_tolerance");
        }
        Ok(())
    }
}
