//! Structural validation of generated HTML.
//!
//! The validator checks a final article against the CMS document schema and
//! the archetype it was generated for. It never fails: problems are reported
//! as findings, and a report passes when none of them is critical.

pub(crate) mod html;
mod policy;
mod rules;
mod words;

use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::request::GenerationRequest;

pub(crate) use html::Document;
pub use policy::{RuleId, Severity, ValidationPolicy};
pub use words::{count_words, decode_entities, visible_text};

/// One rule outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// How serious the finding is
    pub severity: Severity,
    /// Rule that produced it
    pub rule_id: RuleId,
    /// Human-readable description
    pub message: String,
    /// Where in the document, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no finding is critical
    pub pass: bool,
    /// Findings in rule order, then document order
    pub findings: Vec<Finding>,
    /// Words counted in the document
    pub word_count: usize,
    /// Target the count was compared against
    pub target: usize,
    /// Deviation from the target, in percent
    pub deviation_pct: f64,
}

impl ValidationReport {
    /// Findings of a given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Findings produced by a rule.
    pub fn for_rule(&self, rule: RuleId) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.rule_id == rule)
    }

    /// Number of critical findings.
    pub fn critical_count(&self) -> usize {
        self.with_severity(Severity::Critical).count()
    }
}

/// Validator bound to a policy.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    /// Create a validator with the given policy.
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate a final article against the request it was generated for.
    pub fn validate(&self, html: &str, request: &GenerationRequest) -> ValidationReport {
        self.validate_for(html, request.archetype(), request.target_length())
    }

    /// Validate HTML against an archetype and explicit word target.
    pub fn validate_for(&self, html: &str, archetype: &Archetype, target: usize) -> ValidationReport {
        let doc = Document::parse(html);
        let word_count = count_words(html);
        let ctx = rules::RuleContext { doc: &doc, archetype, policy: &self.policy, target, word_count };

        let mut findings = Vec::new();
        rules::document_shape(&ctx, &mut findings);
        rules::heading_hierarchy(&ctx, &mut findings);
        rules::kicker_tag(&ctx, &mut findings);
        rules::required_elements(&ctx, &mut findings);
        rules::links(&ctx, &mut findings);
        rules::css_classes(&ctx, &mut findings);
        rules::word_count(&ctx, &mut findings);
        rules::markdown_residue(&ctx, &mut findings);

        let pass = !findings.iter().any(|f| f.severity == Severity::Critical);
        tracing::debug!(
            archetype = %archetype.id,
            word_count,
            target,
            findings = findings.len(),
            pass,
            "Validated document"
        );

        ValidationReport {
            pass,
            findings,
            word_count,
            target,
            deviation_pct: rules::deviation(word_count, target) * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeRegistry;

    fn article(body_words: usize) -> String {
        let filler = vec!["palabra"; body_words].join(" ");
        format!(
            r##"<article class="contentGenerator__main">
<span class="kicker">Review</span>
<h2>Laptop X review</h2>
<nav class="toc"><ol><li><a href="#s1">Design</a></li></ol></nav>
<section id="s1"><h3>Design</h3><p>{filler}</p>
<div class="callout"><p>Tip</p></div>
<p><a href="/portatiles">laptops</a> <a href="https://www.pccomponentes.com/x">X</a>
<a href="https://example.org/bench">bench</a></p></section>
</article>
<article class="contentGenerator__faqs"><div class="faqs"><h3>Q?</h3><p>A</p></div></article>
<article class="contentGenerator__verdict"><div class="verdict-box"><h2>Verdict</h2><p>Buy</p></div></article>"##
        )
    }

    fn review() -> std::sync::Arc<Archetype> {
        ArchetypeRegistry::builtin().get("product-review").unwrap()
    }

    #[test]
    fn test_well_formed_article_passes() {
        let html = article(100);
        let words = count_words(&html);
        let report = Validator::default().validate_for(&html, &review(), words);
        assert!(report.pass, "{:?}", report.findings);
        assert_eq!(report.critical_count(), 0);
        assert_eq!(report.for_rule(RuleId::WordCount).count(), 0);
    }

    #[test]
    fn test_h1_is_critical() {
        let html = article(10).replace("<h2>Laptop X review</h2>", "<h1>Laptop X review</h1>");
        let report = Validator::default().validate_for(&html, &review(), count_words(&html));
        assert!(!report.pass);
        assert!(report
            .for_rule(RuleId::HeadingHierarchy)
            .all(|f| f.severity == Severity::Critical));
        assert_eq!(report.for_rule(RuleId::HeadingHierarchy).count(), 2);
    }

    #[test]
    fn test_block_kicker_is_warning() {
        let html = article(10).replace(r#"<span class="kicker">Review</span>"#, r#"<div class="kicker">Review</div>"#);
        let report = Validator::default().validate_for(&html, &review(), count_words(&html));
        assert!(report.pass);
        let finding = report.for_rule(RuleId::KickerTag).next().unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.location.as_deref().unwrap().starts_with("line 2"));
    }

    #[test]
    fn test_missing_callout_depends_on_archetype() {
        let html = article(10).replace(r#"<div class="callout"><p>Tip</p></div>"#, "");
        let words = count_words(&html);

        let report = Validator::default().validate_for(&html, &review(), words);
        assert_eq!(report.for_rule(RuleId::RequiredCallout).next().unwrap().severity, Severity::Critical);

        let comparison = ArchetypeRegistry::builtin().get("comparison").unwrap();
        let report = Validator::default().validate_for(&html, &comparison, words);
        assert_eq!(report.for_rule(RuleId::RequiredCallout).next().unwrap().severity, Severity::Info);
    }

    #[test]
    fn test_link_minimums() {
        let html = article(10).replace(r#"<a href="https://example.org/bench">bench</a>"#, "");
        let report = Validator::default().validate_for(&html, &review(), count_words(&html));
        assert!(report.pass);
        assert_eq!(report.for_rule(RuleId::ExternalLinks).count(), 1);
        assert_eq!(report.for_rule(RuleId::InternalLinks).count(), 0);
    }

    #[test]
    fn test_markdown_residue() {
        let html = article(10).replace("<p>Tip</p>", "<p>**Tip** use it</p>");
        let report = Validator::default().validate_for(&html, &review(), count_words(&html));
        let finding = report.for_rule(RuleId::MarkdownResidue).next().unwrap();
        assert_eq!(finding.severity, Severity::Warning);
    }

    #[test]
    fn test_length_bands() {
        let html = article(100);
        let words = count_words(&html);

        // 3% short: informational only
        let target = (words as f64 / 0.97).round() as usize;
        let report = Validator::default().validate_for(&html, &review(), target);
        assert!(report.pass);
        assert_eq!(report.for_rule(RuleId::WordCount).next().unwrap().severity, Severity::Info);

        // 10% short: critical
        let target = (words as f64 / 0.9).round() as usize;
        let report = Validator::default().validate_for(&html, &review(), target);
        assert!(!report.pass);
        assert!(report.deviation_pct > 5.0);
    }

    #[test]
    fn test_override_can_soften_a_rule() {
        let html = article(10).replace("<h2>Laptop X review</h2>", "<h1>Laptop X review</h1>");
        let policy = ValidationPolicy::default().with_override(RuleId::HeadingHierarchy, Severity::Warning);
        let report = Validator::new(policy).validate_for(&html, &review(), count_words(&html));
        assert!(report.pass);
    }
}
