//! Built-in archetype definitions.

use super::{
    Archetype, CmsElement, FieldKind, FieldSpec, LinkThresholds, StructuralHint, WordRange,
};

fn field(name: &str, kind: FieldKind, required: bool, help: &str) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        kind,
        help: (!help.is_empty()).then(|| help.to_string()),
        required,
    }
}

fn hint(description: &str, match_terms: &[&str], element: Option<&str>) -> StructuralHint {
    StructuralHint {
        description: description.to_string(),
        match_terms: match_terms.iter().map(|t| (*t).to_string()).collect(),
        element: element.map(str::to_string),
    }
}

fn faq_hint() -> StructuralHint {
    hint(
        "FAQ section answering the questions readers actually search for",
        &["faq", "frequently asked", "questions", "preguntas"],
        None,
    )
}

fn verdict_hint() -> StructuralHint {
    hint(
        "Closing verdict with a clear, opinionated recommendation",
        &["verdict", "conclusion", "final thoughts", "veredicto", "should you buy"],
        None,
    )
}

fn comparison_table_hint() -> StructuralHint {
    hint(
        "Comparison table summarizing the options side by side",
        &["comparison", "compared", " vs", "table", "comparativa"],
        Some("table"),
    )
}

/// Hints used when competitors are analyzed without an archetype.
pub fn generic_hints() -> Vec<StructuralHint> {
    vec![
        hint("Table of contents", &["contents", "in this article", "índice"], None),
        comparison_table_hint(),
        faq_hint(),
        verdict_hint(),
    ]
}

#[allow(clippy::too_many_arguments)]
fn archetype(
    id: &str,
    name: &str,
    description: &str,
    fields: Vec<FieldSpec>,
    words: (usize, usize, usize),
    hints: Vec<StructuralHint>,
    required_elements: &[CmsElement],
    links: (usize, usize),
) -> Archetype {
    Archetype {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        fields,
        words: WordRange { min: words.0, default: words.1, max: words.2 },
        hints,
        required_elements: required_elements.to_vec(),
        links: LinkThresholds { min_internal: links.0, min_external: links.1 },
    }
}

/// The built-in catalog, in display order.
pub fn builtin() -> Vec<Archetype> {
    use CmsElement::{Callout, Faq, Verdict};
    use FieldKind::{List, LongText, Number, Text, Url};

    vec![
        archetype(
            "seo-article",
            "SEO article with internal links",
            "Search-optimized article that routes readers to relevant categories and products.",
            vec![
                field("main_category", Text, true, "Category the article should link to"),
                field("featured_products", List, false, "Products to highlight, comma-separated"),
            ],
            (1000, 1500, 2500),
            vec![
                hint(
                    "Introduction that uses the main keyword in the first paragraph",
                    &["introduction", "what is", "overview"],
                    None,
                ),
                hint(
                    "H3 sections with contextual internal links to categories and products",
                    &["best", "how to choose", "types"],
                    None,
                ),
                comparison_table_hint(),
                faq_hint(),
                verdict_hint(),
            ],
            &[Faq, Verdict],
            (2, 1),
        ),
        archetype(
            "how-to-guide",
            "Step-by-step guide",
            "Tutorial that walks the reader through a process with clear numbered steps.",
            vec![
                field("difficulty_level", Text, true, "Beginner, intermediate or advanced"),
                field("estimated_time", Text, false, "How long the process takes"),
                field("tools", List, false, "Tools or materials needed"),
            ],
            (1200, 1800, 3000),
            vec![
                hint("Prerequisites the reader needs before starting", &["requirements", "before you start", "what you need"], None),
                hint("Numbered steps with one action each", &["step", "paso"], Some("ol")),
                hint("Tips and warnings inside callout boxes", &["tip", "warning", "careful"], None),
                hint("Common mistakes to avoid", &["mistake", "avoid", "errores"], None),
                faq_hint(),
                verdict_hint(),
            ],
            &[Callout, Faq, Verdict],
            (2, 1),
        ),
        archetype(
            "explainer",
            "Explainer",
            "Educational piece that makes a technology or concept understandable.",
            vec![
                field("main_concept", Text, true, "Concept or technology being explained"),
                field("technical_level", Text, false, "How technical the audience is"),
            ],
            (1000, 1600, 2500),
            vec![
                hint("Clear one-paragraph definition of the concept", &["what is", "definition", "qué es"], None),
                hint("How it works, explained with an everyday analogy", &["how it works", "how does", "funciona"], None),
                hint("Practical examples and use cases", &["example", "use case", "applications"], None),
                hint("Advantages and disadvantages", &["advantages", "pros", "disadvantages", "cons"], None),
                faq_hint(),
                verdict_hint(),
            ],
            &[Faq, Verdict],
            (2, 1),
        ),
        archetype(
            "product-review",
            "Product review",
            "In-depth review of one product with specifications, testing, pros and cons and a verdict.",
            vec![
                field("product", Text, true, "Product name as sold"),
                field("price", Number, false, "Current price"),
                field("key_specs", List, false, "Specifications worth testing"),
            ],
            (1000, 1500, 2500),
            vec![
                hint("Technical specifications table", &["specifications", "specs", "características"], Some("table")),
                hint("Design and build quality", &["design", "build", "diseño"], None),
                hint("Real-world performance tests", &["performance", "benchmark", "test", "rendimiento"], None),
                hint("Pros and cons list", &["pros", "cons", "strengths", "weaknesses"], None),
                hint("Who the product is for", &["who is it for", "who should", "para quién"], None),
                faq_hint(),
                verdict_hint(),
            ],
            &[Callout, Faq, Verdict],
            (2, 1),
        ),
        archetype(
            "comparison",
            "Head-to-head comparison",
            "Direct comparison between two products that ends with a winner per use case.",
            vec![
                field("product_a", Text, true, "First product"),
                field("product_b", Text, true, "Second product"),
                field("use_case", Text, false, "Use case that decides the winner"),
            ],
            (1200, 1800, 3000),
            vec![
                comparison_table_hint(),
                hint("Round-by-round analysis per criterion", &["design", "performance", "battery", "price"], None),
                hint("Winner for each use case", &["winner", "which to buy", "ganador"], None),
                faq_hint(),
                verdict_hint(),
            ],
            &[Faq, Verdict],
            (2, 1),
        ),
        archetype(
            "buying-guide",
            "Buying guide",
            "Guide that teaches readers how to choose within a category and recommends picks per budget.",
            vec![
                field("category", Text, true, "Product category"),
                field("budget", Text, false, "Budget range to focus on"),
            ],
            (1500, 2200, 3500),
            vec![
                hint("Key buying criteria explained one by one", &["how to choose", "what to look for", "criteria"], None),
                hint("Recommendations split by budget tier", &["budget", "price range", "cheap", "premium"], None),
                hint("Mistakes to avoid when buying", &["mistake", "avoid"], None),
                comparison_table_hint(),
                faq_hint(),
                verdict_hint(),
            ],
            &[Callout, Faq, Verdict],
            (3, 1),
        ),
        archetype(
            "best-of-list",
            "Best-of list",
            "Ranked selection of the best products in a category with a short review of each.",
            vec![
                field("category", Text, true, "Product category"),
                field("item_count", Number, false, "Number of products in the ranking"),
            ],
            (1200, 2000, 3500),
            vec![
                hint("Selection criteria used for the ranking", &["how we chose", "criteria", "methodology"], None),
                hint("Ranked entries with a mini review each", &["best", "top", "mejor"], None),
                hint("Best pick per use case", &["best for", "ideal for"], None),
                comparison_table_hint(),
                faq_hint(),
                verdict_hint(),
            ],
            &[Faq, Verdict],
            (3, 1),
        ),
        archetype(
            "troubleshooting",
            "Troubleshooting",
            "Problem-solving article that diagnoses a fault and walks through the fixes.",
            vec![
                field("problem", LongText, true, "Problem the reader is facing"),
                field("device", Text, false, "Affected device or system"),
            ],
            (800, 1200, 2000),
            vec![
                hint("Symptoms that identify the problem", &["symptom", "signs"], None),
                hint("Likely causes ordered by frequency", &["cause", "why", "causas"], None),
                hint("Step-by-step fixes from simplest to most involved", &["fix", "solution", "how to solve"], Some("ol")),
                hint("Prevention advice", &["prevent", "avoid"], None),
                faq_hint(),
                verdict_hint(),
            ],
            &[Callout, Faq, Verdict],
            (1, 1),
        ),
        archetype(
            "deals-roundup",
            "Deals roundup",
            "Curated roundup of deals for a shopping event with buying advice.",
            vec![
                field("event", Text, true, "Shopping event, e.g. Black Friday"),
                field("category", Text, false, "Category to focus on"),
            ],
            (800, 1200, 2000),
            vec![
                hint("Featured deals with price and discount", &["deal", "offer", "discount", "ofertas"], None),
                hint("Deals grouped by category", &["category", "laptops", "monitors"], None),
                hint("Promotional callout with the event dates", &["dates", "when", "until"], None),
                hint("Tips to spot a genuine bargain", &["tips", "genuine", "price history"], None),
                verdict_hint(),
            ],
            &[Callout, Verdict],
            (3, 0),
        ),
        archetype(
            "news",
            "Product news",
            "Timely news piece about a launch or announcement with context and our take.",
            vec![
                field("headline_topic", Text, true, "What was announced"),
                field("source_url", Url, false, "Official announcement"),
            ],
            (500, 800, 1500),
            vec![
                hint("What happened, in the first paragraph", &["announced", "launch", "news"], None),
                hint("Key specifications", &["specifications", "specs", "features"], None),
                hint("Availability and pricing", &["availability", "price", "release date"], None),
                hint("Our take on what it means", &["our take", "opinion", "what it means"], None),
            ],
            &[Verdict],
            (1, 1),
        ),
    ]
}
