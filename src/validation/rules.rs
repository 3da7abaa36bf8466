//! Individual structural rules.

use once_cell::sync::Lazy;
use regex::Regex;

use super::html::{Document, TAG_RE};
use super::policy::{RuleId, Severity, ValidationPolicy};
use super::Finding;
use crate::archetype::{Archetype, CmsElement};
use crate::cms;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*\n]+\*\*").unwrap());
static MD_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+\S").unwrap());
static MD_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]\n]+\]\((?:https?://|/)[^)\s]*\)").unwrap());

/// Inputs shared by every rule.
pub(super) struct RuleContext<'a> {
    pub doc: &'a Document,
    pub archetype: &'a Archetype,
    pub policy: &'a ValidationPolicy,
    pub target: usize,
    pub word_count: usize,
}

impl RuleContext<'_> {
    fn violation(&self, rule: RuleId, default: Severity, message: String, location: Option<String>) -> Finding {
        Finding { severity: self.policy.severity(rule, default), rule_id: rule, message, location }
    }

    fn note(&self, rule: RuleId, message: String, location: Option<String>) -> Finding {
        Finding { severity: Severity::Info, rule_id: rule, message, location }
    }

    fn articles(&self) -> Vec<usize> {
        self.doc.top_level().filter(|(_, e)| e.is("article")).map(|(i, _)| i).collect()
    }

    fn main_article(&self) -> Option<usize> {
        let articles = self.articles();
        articles
            .iter()
            .copied()
            .find(|&i| self.doc.element(i).has_class(cms::MAIN_ARTICLE_CLASS))
            .or_else(|| articles.first().copied())
    }
}

pub(super) fn document_shape(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let articles = ctx.articles();
    if articles.len() != cms::ARTICLE_CLASSES.len() {
        out.push(ctx.violation(
            RuleId::DocumentShape,
            Severity::Critical,
            format!(
                "expected {} top-level <article> blocks, found {}",
                cms::ARTICLE_CLASSES.len(),
                articles.len()
            ),
            None,
        ));
    }

    for (idx, element) in ctx.doc.top_level().filter(|(_, e)| !e.is("article")) {
        out.push(ctx.violation(
            RuleId::DocumentShape,
            Severity::Warning,
            format!("<{}> outside the article blocks", element.tag),
            Some(ctx.doc.location(idx)),
        ));
    }
}

pub(super) fn heading_hierarchy(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    for (idx, _) in ctx.doc.by_tag("h1") {
        out.push(ctx.violation(
            RuleId::HeadingHierarchy,
            Severity::Critical,
            "<h1> is reserved for the page template; the title must be an <h2>".to_string(),
            Some(ctx.doc.location(idx)),
        ));
    }

    if let Some(main) = ctx.main_article() {
        if !ctx.doc.descendants(main).any(|(_, e)| e.is("h2")) {
            out.push(ctx.violation(
                RuleId::HeadingHierarchy,
                Severity::Critical,
                "main article has no <h2> title".to_string(),
                Some(ctx.doc.location(main)),
            ));
        }
    }
}

pub(super) fn kicker_tag(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let mut found = false;
    for (idx, element) in ctx.doc.with_class(cms::KICKER_CLASS) {
        found = true;
        if !element.is("span") {
            out.push(ctx.violation(
                RuleId::KickerTag,
                Severity::Warning,
                format!("kicker must be an inline <span>, found <{}>", element.tag),
                Some(ctx.doc.location(idx)),
            ));
        }
    }
    if !found {
        out.push(ctx.note(RuleId::KickerTag, "no kicker above the title".to_string(), None));
    }
}

pub(super) fn required_elements(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    for element in CmsElement::ALL {
        let (rule, present) = match element {
            CmsElement::Callout => (
                RuleId::RequiredCallout,
                cms::CALLOUT_CLASSES.iter().any(|class| ctx.doc.with_class(class).next().is_some()),
            ),
            CmsElement::Faq => (
                RuleId::RequiredFaq,
                ctx.doc.with_class(cms::FAQ_CLASS).next().is_some()
                    || ctx.doc.with_class(cms::FAQ_ARTICLE_CLASS).next().is_some(),
            ),
            CmsElement::Verdict => (
                RuleId::RequiredVerdict,
                ctx.doc.with_class(cms::VERDICT_CLASS).next().is_some()
                    || ctx.doc.with_class(cms::VERDICT_ARTICLE_CLASS).next().is_some(),
            ),
        };

        if present {
            continue;
        }
        if ctx.archetype.requires(element) {
            out.push(ctx.violation(
                rule,
                Severity::Critical,
                format!("{} is required for '{}' but missing", element, ctx.archetype.id),
                None,
            ));
        } else {
            out.push(ctx.note(rule, format!("optional {} not present", element), None));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkClass {
    Internal,
    External,
    Ignored,
}

fn classify_link(href: &str, policy: &ValidationPolicy) -> LinkClass {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["mailto:", "tel:", "javascript:", "data:"].iter().any(|p| lower.starts_with(p))
    {
        return LinkClass::Ignored;
    }

    let rest = if let Some(rest) = lower.strip_prefix("https://").or_else(|| lower.strip_prefix("http://")) {
        rest
    } else if let Some(rest) = lower.strip_prefix("//") {
        rest
    } else {
        return LinkClass::Internal;
    };

    let host = rest.split(['/', '?', '#', ':']).next().unwrap_or_default();
    if policy.is_site_host(host) {
        LinkClass::Internal
    } else {
        LinkClass::External
    }
}

pub(super) fn links(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let (mut internal, mut external) = (0usize, 0usize);
    for (_, anchor) in ctx.doc.by_tag("a") {
        match anchor.attr("href").map(|href| classify_link(href, ctx.policy)) {
            Some(LinkClass::Internal) => internal += 1,
            Some(LinkClass::External) => external += 1,
            _ => {}
        }
    }

    let thresholds = ctx.archetype.links;
    if internal < thresholds.min_internal {
        out.push(ctx.violation(
            RuleId::InternalLinks,
            Severity::Warning,
            format!("{} internal links, at least {} expected", internal, thresholds.min_internal),
            None,
        ));
    }
    if external < thresholds.min_external {
        out.push(ctx.violation(
            RuleId::ExternalLinks,
            Severity::Warning,
            format!("{} external links, at least {} expected", external, thresholds.min_external),
            None,
        ));
    }
}

pub(super) fn css_classes(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    for (position, (idx, expected)) in ctx.articles().into_iter().zip(cms::ARTICLE_CLASSES).enumerate() {
        if !ctx.doc.element(idx).has_class(expected) {
            out.push(ctx.violation(
                RuleId::CssClasses,
                Severity::Warning,
                format!("article {} should carry class \"{}\"", position + 1, expected),
                Some(ctx.doc.location(idx)),
            ));
        }
    }

    if ctx.doc.with_class(cms::TOC_CLASS).next().is_none() {
        out.push(ctx.violation(
            RuleId::CssClasses,
            Severity::Warning,
            format!("no table of contents with class \"{}\"", cms::TOC_CLASS),
            None,
        ));
    }
}

/// Relative deviation of `words` from `target`.
pub(super) fn deviation(words: usize, target: usize) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (words as f64 - target as f64).abs() / target as f64
}

pub(super) fn word_count(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let deviation = deviation(ctx.word_count, ctx.target);
    let message = format!(
        "{} words against a target of {} ({:.1}% off)",
        ctx.word_count,
        ctx.target,
        deviation * 100.0
    );

    if deviation > ctx.policy.length_tolerance {
        out.push(ctx.violation(RuleId::WordCount, Severity::Critical, message, None));
    } else if deviation > ctx.policy.info_tolerance {
        out.push(ctx.note(RuleId::WordCount, message, None));
    }
}

pub(super) fn markdown_residue(ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    // Tags become spaces so offsets and line breaks still match the input.
    let text = TAG_RE.replace_all(ctx.doc.masked(), |caps: &regex::Captures<'_>| " ".repeat(caps[0].len()));

    let patterns: [(&Regex, &str); 4] = [
        (&FENCE_RE, "code fence"),
        (&BOLD_RE, "**bold** marker"),
        (&MD_HEADING_RE, "# heading"),
        (&MD_LINK_RE, "[text](url) link"),
    ];
    for (re, label) in patterns {
        if let Some(m) = re.find(&text) {
            out.push(ctx.violation(
                RuleId::MarkdownResidue,
                Severity::Warning,
                format!("Markdown {} in HTML output", label),
                Some(format!("line {}", ctx.doc.line_of(m.start()))),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_classification() {
        let policy = ValidationPolicy::default();
        assert_eq!(classify_link("/portatiles", &policy), LinkClass::Internal);
        assert_eq!(classify_link("https://www.pccomponentes.com/x", &policy), LinkClass::Internal);
        assert_eq!(classify_link("//pccomponentes.com", &policy), LinkClass::Internal);
        assert_eq!(classify_link("https://example.org/a", &policy), LinkClass::External);
        assert_eq!(classify_link("#section-1", &policy), LinkClass::Ignored);
        assert_eq!(classify_link("mailto:hi@example.org", &policy), LinkClass::Ignored);
    }

    #[test]
    fn test_deviation() {
        assert!((deviation(1260, 1200) - 0.05).abs() < 1e-9);
        assert!((deviation(1140, 1200) - 0.05).abs() < 1e-9);
        assert_eq!(deviation(10, 0), 0.0);
    }
}
