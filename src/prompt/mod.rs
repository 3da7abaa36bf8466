//! Prompt construction for the three generation stages.
//!
//! Every prompt restates the archetype's structural hints, the brand voice
//! and the exact target length, so each stage can be judged on its own. The
//! builder is pure: the same request always yields the same prompt text.

mod brand;

use std::borrow::Cow;

use crate::cms;
use crate::core::{Config, CoreError, CoreResult};
use crate::pipeline::CritiqueReport;
use crate::request::{Addressing, GenerationRequest, LinkKind, Mode};

pub use brand::BrandVoice;

/// Issue categories the critique may use.
pub const CRITIQUE_CATEGORIES: [&str; 7] =
    ["structure", "length", "seo", "links", "tone", "content", "competitive"];

/// Limits for product sheet excerpts.
const PRODUCT_SUMMARY_CHARS: usize = 1000;
const PRODUCT_REVIEW_CHARS: usize = 300;
const PRODUCT_REVIEWS: usize = 3;

/// Builds stage prompts from a request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    voice: BrandVoice,
    draft_excerpt_chars: usize,
    critique_excerpt_chars: usize,
    max_issues: usize,
    length_tolerance: f64,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(BrandVoice::default())
    }
}

impl PromptBuilder {
    /// Create a builder for a brand voice with default limits.
    pub fn new(voice: BrandVoice) -> Self {
        Self {
            voice,
            draft_excerpt_chars: 8000,
            critique_excerpt_chars: 3000,
            max_issues: 5,
            length_tolerance: 0.05,
        }
    }

    /// Create a builder from application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            voice: config.brand.voice(),
            draft_excerpt_chars: config.generation.draft_excerpt_chars,
            critique_excerpt_chars: config.generation.critique_excerpt_chars,
            max_issues: config.generation.max_critique_issues,
            length_tolerance: config.validation.length_tolerance,
        }
    }

    /// Set how much of the draft and critique later prompts embed.
    pub fn with_excerpt_limits(mut self, draft_chars: usize, critique_chars: usize) -> Self {
        self.draft_excerpt_chars = draft_chars;
        self.critique_excerpt_chars = critique_chars;
        self
    }

    /// The brand voice.
    pub fn voice(&self) -> &BrandVoice {
        &self.voice
    }

    /// Maximum number of issues the critique may return.
    pub fn max_issues(&self) -> usize {
        self.max_issues
    }

    /// System prompt shared by all stages.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a senior SEO copywriter and editor at {}. You write long-form articles \
             that are published verbatim in a CMS, so you follow structural instructions \
             to the letter and output exactly the format each task asks for.",
            self.voice.name()
        )
    }

    /// Stage 1: write the draft.
    pub fn build_draft_prompt(&self, request: &GenerationRequest) -> CoreResult<String> {
        request.ensure_complete()?;
        let archetype = request.archetype();

        let mut prompt = format!(
            "Write a {} in HTML for the keyword \"{}\".\n{}\n\n",
            archetype.name.to_lowercase(),
            request.keyword(),
            archetype.description
        );

        prompt.push_str(&self.inputs_section(request));
        if let Some(section) = self.product_section(request) {
            prompt.push_str(&section);
        }
        prompt.push_str(&self.length_section(request));
        prompt.push_str(&self.structure_section(request));
        prompt.push_str(&self.links_section(request));
        prompt.push_str(&self.voice_section(request));
        if let Some(section) = self.competitive_section(request) {
            prompt.push_str(&section);
        }
        prompt.push_str(&self.format_section());
        if let Some(instructions) = request.instructions() {
            prompt.push_str(&format!("# ADDITIONAL INSTRUCTIONS\n{}\n\n", instructions));
        }

        prompt.push_str("Return only the HTML of the three articles, nothing before or after it.\n");
        Ok(prompt)
    }

    /// Stage 2: critique the draft as JSON.
    pub fn build_critique_prompt(&self, request: &GenerationRequest, draft: &str) -> CoreResult<String> {
        request.ensure_complete()?;
        let archetype = request.archetype();

        let mut prompt = format!(
            "Critically review the following draft of a {} for the keyword \"{}\".\n\n",
            archetype.name.to_lowercase(),
            request.keyword()
        );
        prompt.push_str(&format!(
            "# DRAFT\n```html\n{}\n```\n\n",
            excerpt(draft, self.draft_excerpt_chars)
        ));

        prompt.push_str("# REVIEW CRITERIA\n");
        prompt.push_str("Structure:\n");
        for rule in cms::STRUCTURE_RULES {
            prompt.push_str(&format!("- {}\n", rule));
        }
        prompt.push_str(&format!(
            "Length: the visible text must be exactly {} words, within {}.\n",
            request.target_length(),
            self.length_window(request.target_length())
        ));
        prompt.push_str("Expected sections:\n");
        for hint in &archetype.hints {
            prompt.push_str(&format!("- {}\n", hint.description));
        }
        prompt.push_str(&format!(
            "SEO: the keyword \"{}\" appears naturally, subheadings are descriptive, no keyword stuffing.\n",
            request.keyword()
        ));
        prompt.push_str("Tone: the text follows every rule under VOICE.\n");
        if request.competitive().is_some() {
            prompt.push_str(
                "Competition: every gap listed under COMPETITION is closed, in more depth than any competitor.\n",
            );
        }
        prompt.push('\n');

        prompt.push_str(&self.voice_section(request));
        if let Some(section) = self.competitive_section(request) {
            prompt.push_str(&section);
        }
        prompt.push_str(&self.critique_format_section());
        Ok(prompt)
    }

    /// Stage 2 retry after an unparseable critique.
    pub fn build_strict_critique_prompt(&self, request: &GenerationRequest, draft: &str) -> CoreResult<String> {
        let mut prompt = self.build_critique_prompt(request, draft)?;
        prompt.push_str(
            "\n# STRICT OUTPUT\n\
             Your previous answer could not be parsed. Reply with a single JSON object that \
             starts with { and ends with }. No code fences, no comments, no text before or \
             after it. Use exactly the keys shown above.\n",
        );
        Ok(prompt)
    }

    /// Stage 3: rewrite the draft applying the critique.
    pub fn build_final_prompt(
        &self,
        request: &GenerationRequest,
        draft: &str,
        critique: &CritiqueReport,
    ) -> CoreResult<String> {
        request.ensure_complete()?;

        let critique_json = serde_json::to_string_pretty(critique)
            .map_err(|e| CoreError::MalformedCritique(e.to_string()))?;

        let mut prompt = format!(
            "Produce the final version of the article for the keyword \"{}\" by applying \
             every fix from the editorial review to the draft.\n\n",
            request.keyword()
        );
        prompt.push_str(&format!(
            "# DRAFT\n```html\n{}\n```\n\n",
            excerpt(draft, self.draft_excerpt_chars)
        ));
        prompt.push_str(&format!(
            "# EDITORIAL REVIEW\n```json\n{}\n```\n\n",
            excerpt(&critique_json, self.critique_excerpt_chars)
        ));

        prompt.push_str("# TASK\n");
        prompt.push_str("- Fix every issue listed in the review\n");
        prompt.push_str("- Keep everything the review did not flag\n");
        prompt.push_str(&format!(
            "- The final text must be exactly {} words ({})\n",
            request.target_length(),
            self.length_window(request.target_length())
        ));
        if request.mode() == Mode::Rewrite {
            prompt.push_str("- Close every competitor gap and exceed the depth of the best competitor\n");
        }
        prompt.push('\n');

        prompt.push_str(&self.structure_section(request));
        prompt.push_str(&self.voice_section(request));
        if let Some(section) = self.competitive_section(request) {
            prompt.push_str(&section);
        }
        prompt.push_str(&self.format_section());
        prompt.push_str("Return only the final HTML of the three articles, nothing before or after it.\n");
        Ok(prompt)
    }

    fn length_window(&self, target: usize) -> String {
        let lo = (target as f64 * (1.0 - self.length_tolerance)).ceil() as usize;
        let hi = (target as f64 * (1.0 + self.length_tolerance)).floor() as usize;
        format!("{}-{} words counts as on target", lo, hi)
    }

    fn inputs_section(&self, request: &GenerationRequest) -> String {
        let mut section = format!("# BRIEF\nMain keyword: {}\n", request.keyword());
        if !request.secondary_keywords().is_empty() {
            section.push_str(&format!("Secondary keywords: {}\n", request.secondary_keywords().join(", ")));
        }
        for spec in &request.archetype().fields {
            if let Some(value) = request.field(&spec.name).filter(|v| !v.trim().is_empty()) {
                section.push_str(&format!("{}: {}\n", spec.name, value.trim()));
            }
        }
        section.push('\n');
        section
    }

    fn product_section(&self, request: &GenerationRequest) -> Option<String> {
        let product = request.product()?;
        let mut section = format!("# PRODUCT DATA\nProduct: {}\nID: {}\n", product.title, product.product_id);
        if !product.brand_name.is_empty() {
            section.push_str(&format!("Brand: {}\n", product.brand_name));
        }
        if !product.family_name.is_empty() {
            section.push_str(&format!("Family: {}\n", product.family_name));
        }
        if !product.attributes.is_empty() {
            section.push_str("Key attributes:\n");
            for (name, value) in product.attribute_lines() {
                section.push_str(&format!("- {}: {}\n", name, value));
            }
        }
        if !product.description.trim().is_empty() {
            section.push_str(&format!("Description:\n{}\n", product.description.trim()));
        }

        if product.has_reviews() {
            section.push_str(&format!("Based on {} user reviews:\n", product.total_comments));
            if !product.advantages.trim().is_empty() {
                section.push_str(&format!(
                    "Advantages users mention:\n{}\n",
                    excerpt(product.advantages.trim(), PRODUCT_SUMMARY_CHARS)
                ));
            }
            if !product.disadvantages.trim().is_empty() {
                section.push_str(&format!(
                    "Drawbacks users mention:\n{}\n",
                    excerpt(product.disadvantages.trim(), PRODUCT_SUMMARY_CHARS)
                ));
            }
        }
        let opinions: Vec<&str> = product.opinions().take(PRODUCT_REVIEWS).collect();
        if !opinions.is_empty() {
            section.push_str("Highlighted reviews:\n");
            for (i, opinion) in opinions.iter().enumerate() {
                section.push_str(&format!("{}. {}\n", i + 1, excerpt(opinion, PRODUCT_REVIEW_CHARS)));
            }
        }
        if let Some(image) = product.main_image() {
            section.push_str(&format!("Images: {} available, main image {}\n", product.images.len(), image));
        }

        section.push_str(
            "Treat these facts as the source of truth for specifications and prices; \
             never invent data that is not listed here.\n\n",
        );
        Some(section)
    }

    fn length_section(&self, request: &GenerationRequest) -> String {
        format!(
            "# LENGTH\nThe visible text must be exactly {} words. This is a hard constraint: \
             {}; anything outside that range is rejected.\n\n",
            request.target_length(),
            self.length_window(request.target_length())
        )
    }

    fn structure_section(&self, request: &GenerationRequest) -> String {
        let archetype = request.archetype();
        let mut section = String::from("# STRUCTURE\nCover these sections, in this order:\n");
        for (i, hint) in archetype.hints.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, hint.description));
        }
        if !archetype.required_elements.is_empty() {
            let labels: Vec<&str> = archetype.required_elements.iter().map(|e| e.label()).collect();
            section.push_str(&format!("Mandatory blocks: {}.\n", labels.join(", ")));
        }
        section.push('\n');
        section
    }

    fn links_section(&self, request: &GenerationRequest) -> String {
        let thresholds = request.archetype().links;
        let mut section = format!(
            "# LINKS\nInclude at least {} internal links to {} pages and at least {} external \
             links to authoritative sources, all with descriptive anchor text.\n",
            thresholds.min_internal,
            self.voice.name(),
            thresholds.min_external
        );
        for link in request.links() {
            let kind = match link.kind {
                LinkKind::Internal => "internal",
                LinkKind::Product => "product",
                LinkKind::External => "external",
            };
            if link.anchor.is_empty() {
                section.push_str(&format!("- [{}] {}\n", kind, link.url));
            } else {
                section.push_str(&format!("- [{}] \"{}\" -> {}\n", kind, link.anchor, link.url));
            }
        }
        section.push('\n');
        section
    }

    fn voice_section(&self, request: &GenerationRequest) -> String {
        let tone = request.tone();
        let mut section = format!("# VOICE\n{}", self.voice.to_prompt_section());
        section.push_str(match tone.addressing {
            Addressing::Informal => "- Address the reader informally, in the second person\n",
            Addressing::Formal => "- Address the reader formally, in the second person\n",
            Addressing::Impersonal => "- Do not address the reader directly\n",
        });
        if !tone.humor {
            section.push_str("- Keep humor out of this piece\n");
        }
        for note in &tone.notes {
            section.push_str(&format!("- {}\n", note));
        }
        section.push('\n');
        section
    }

    fn competitive_section(&self, request: &GenerationRequest) -> Option<String> {
        let context = request.competitive()?;
        let mut section = format!(
            "# COMPETITION\nThese pages currently rank for \"{}\". Close every gap they leave \
             and go deeper than the most thorough of them; never copy their wording.\n\n",
            context.keyword
        );

        for (i, competitor) in context.competitors.iter().enumerate() {
            section.push_str(&format!(
                "{}. {} ({}) - {} words\n",
                i + 1,
                competitor.title,
                competitor.url,
                competitor.word_count
            ));
            for heading in &competitor.headings {
                let indent = "  ".repeat(usize::from(heading.level.max(1)));
                section.push_str(&format!("{}h{}: {}\n", indent, heading.level, heading.text));
            }
            for gap in &competitor.gaps {
                section.push_str(&format!("   gap: {}\n", gap));
            }
        }
        if !context.skipped.is_empty() {
            section.push_str(&format!("({} more results could not be analyzed.)\n", context.skipped.len()));
        }
        section.push_str(&format!(
            "\nThe longest competitor has {} words; your structure must be more complete than all of them.\n\n",
            context.max_word_count()
        ));
        Some(section)
    }

    fn format_section(&self) -> String {
        let mut section = String::from("# HTML FORMAT\n");
        for rule in cms::STRUCTURE_RULES {
            section.push_str(&format!("- {}\n", rule));
        }
        section.push_str("Follow this skeleton:\n");
        section.push_str(cms::SKELETON);
        section.push_str("\n\n");
        section
    }

    fn critique_format_section(&self) -> String {
        format!(
            "# RESPONSE FORMAT\n\
             Reply with a JSON object only:\n\
             {{\"issues\": [{{\"category\": \"{}\", \"description\": \"what is wrong\", \
             \"fix\": \"how to fix it\", \"severity\": \"high|medium|low\", \
             \"location\": \"where it is\"}}]}}\n\
             List at most {} issues, most important first. An empty list means the draft \
             needs no changes.\n",
            CRITIQUE_CATEGORIES.join("|"),
            self.max_issues
        )
    }
}

/// First `max_chars` characters of `text`.
fn excerpt(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}\n[... truncated]", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeRegistry;
    use crate::competitive::{CompetitiveContext, CompetitorSummary, Heading};
    use crate::pipeline::Issue;
    use std::sync::Arc;

    fn review_request() -> GenerationRequest {
        let archetype = ArchetypeRegistry::builtin().get("product-review").unwrap();
        GenerationRequest::builder(archetype, "laptop x review")
            .field("product", "Laptop X")
            .target_length(1200)
            .build()
            .unwrap()
    }

    fn value_for(spec: &crate::archetype::FieldSpec) -> String {
        match spec.kind {
            crate::archetype::FieldKind::Number => "42".to_string(),
            crate::archetype::FieldKind::Url => "https://example.com/item".to_string(),
            _ => format!("sample {}", spec.name),
        }
    }

    fn rewrite_request() -> GenerationRequest {
        let archetype = ArchetypeRegistry::builtin().get("product-review").unwrap();
        let context = CompetitiveContext {
            keyword: "laptop x review".into(),
            competitors: vec![CompetitorSummary {
                url: "https://rival.example/laptop-x".into(),
                title: "Laptop X tested".into(),
                headings: vec![Heading { level: 2, text: "Battery life".into() }],
                word_count: 1800,
                gaps: vec!["Pros and cons list".into()],
            }],
            skipped: Vec::new(),
        };
        GenerationRequest::builder(archetype, "laptop x review")
            .field("product", "Laptop X")
            .rewrite(context)
            .build()
            .unwrap()
    }

    /// Draft, critique and final prompts for one request.
    fn all_prompts(builder: &PromptBuilder, request: &GenerationRequest) -> [String; 3] {
        let draft = "<article>draft body</article>";
        [
            builder.build_draft_prompt(request).unwrap(),
            builder.build_critique_prompt(request, draft).unwrap(),
            builder.build_final_prompt(request, draft, &CritiqueReport::default()).unwrap(),
        ]
    }

    #[test]
    fn test_draft_prompt_contains_target_and_hints() {
        let registry = ArchetypeRegistry::builtin();
        let builder = PromptBuilder::default();

        for archetype in registry.list() {
            let fields: Vec<(String, String)> =
                archetype.required_fields().map(|spec| (spec.name.clone(), value_for(spec))).collect();
            let target = archetype.words.min;
            let request = GenerationRequest::builder(Arc::clone(archetype), "test keyword")
                .fields(fields.clone())
                .target_length(target)
                .build()
                .unwrap();

            let prompt = builder.build_draft_prompt(&request).unwrap();
            assert!(prompt.contains(&format!("exactly {} words", target)), "{}", archetype.id);
            for hint in &archetype.hints {
                assert!(prompt.contains(&hint.description), "{}: {}", archetype.id, hint.description);
            }
            for (name, value) in &fields {
                assert!(prompt.contains(&format!("{}: {}", name, value)), "{}", archetype.id);
            }
            assert!(prompt.contains(cms::SKELETON));
            assert!(!prompt.contains("# COMPETITION"));
        }
    }

    #[test]
    fn test_every_prompt_carries_voice_target_and_hints() {
        let builder = PromptBuilder::default();
        let request = review_request();

        for prompt in all_prompts(&builder, &request) {
            assert!(prompt.contains("exactly 1200 words"));
            for rule in builder.voice().rules() {
                assert!(prompt.contains(rule.as_str()), "missing rule: {rule}");
            }
            for hint in &request.archetype().hints {
                assert!(prompt.contains(&hint.description));
            }
            assert!(!prompt.contains("# COMPETITION"));
        }
    }

    #[test]
    fn test_every_rewrite_prompt_embeds_competition() {
        let builder = PromptBuilder::default();
        let request = rewrite_request();

        for prompt in all_prompts(&builder, &request) {
            assert!(prompt.contains("# COMPETITION"));
            assert!(prompt.contains("https://rival.example/laptop-x"));
            assert!(prompt.contains("h2: Battery life"));
            assert!(prompt.contains("gap: Pros and cons list"));
            assert!(prompt.contains("1800 words"));
        }
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let request = review_request();
        let builder = PromptBuilder::default();
        assert_eq!(builder.build_draft_prompt(&request).unwrap(), builder.build_draft_prompt(&request).unwrap());
    }

    #[test]
    fn test_draft_prompt_embeds_product_sheet() {
        let product = crate::product::ProductData::from_json(
            r#"{"product_id": "10873412", "title": "Laptop X 15", "description": "A light laptop.",
                "brand_name": "Acme", "attributes": {"RAM": "16 GB"}, "totalComments": 12,
                "advantages": "Battery life", "disadvantages": "Glossy screen",
                "comments": [{"opinion": "Great value"}, {"opinion": "Runs cool"}, {"opinion": "Quiet"},
                             {"opinion": "Fourth review"}]}"#,
        )
        .unwrap();
        let archetype = ArchetypeRegistry::builtin().get("product-review").unwrap();
        let request = GenerationRequest::builder(archetype, "laptop x review")
            .field("product", "Laptop X")
            .product(product)
            .build()
            .unwrap();

        let prompt = PromptBuilder::default().build_draft_prompt(&request).unwrap();
        assert!(prompt.contains("# PRODUCT DATA\nProduct: Laptop X 15\nID: 10873412\nBrand: Acme\n"));
        assert!(prompt.contains("- RAM: 16 GB"));
        assert!(prompt.contains("Based on 12 user reviews"));
        assert!(prompt.contains("Drawbacks users mention:\nGlossy screen"));
        assert!(prompt.contains("3. Quiet"));
        assert!(!prompt.contains("Fourth review"));
        assert!(review_request().product().is_none());
        assert!(!PromptBuilder::default().build_draft_prompt(&review_request()).unwrap().contains("# PRODUCT DATA"));
    }

    #[test]
    fn test_critique_prompt_truncates_draft() {
        let request = review_request();
        let draft = "x".repeat(20_000);
        let builder = PromptBuilder::default().with_excerpt_limits(100, 50);
        let prompt = builder.build_critique_prompt(&request, &draft).unwrap();
        assert!(prompt.contains("[... truncated]"));
        assert!(!prompt.contains(&"x".repeat(101)));
        assert!(prompt.contains("\"issues\""));
        assert!(prompt.contains("at most 5 issues"));
    }

    #[test]
    fn test_strict_prompt_extends_regular_one() {
        let request = review_request();
        let builder = PromptBuilder::default();
        let regular = builder.build_critique_prompt(&request, "<article></article>").unwrap();
        let strict = builder.build_strict_critique_prompt(&request, "<article></article>").unwrap();
        assert!(strict.starts_with(&regular));
        assert!(strict.contains("STRICT OUTPUT"));
    }

    #[test]
    fn test_final_prompt_embeds_draft_and_critique() {
        let request = review_request();
        let critique = CritiqueReport {
            issues: vec![Issue {
                category: "length".into(),
                description: "Too short".into(),
                fix: "Expand the performance section".into(),
                severity: None,
                location: None,
            }],
        };
        let prompt = PromptBuilder::default()
            .build_final_prompt(&request, "<article>draft body</article>", &critique)
            .unwrap();
        assert!(prompt.contains("draft body"));
        assert!(prompt.contains("Expand the performance section"));
        assert!(prompt.contains("exactly 1200 words"));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("ñañaña", 3), "ñañ\n[... truncated]");
        assert_eq!(excerpt("short", 10), "short");
    }
}
