//! Outline extraction from competitor pages.

use serde::{Deserialize, Serialize};

use super::{CompetitorSummary, Heading};
use crate::archetype::StructuralHint;
use crate::core::FetchError;
use crate::validation::html::Element;
use crate::validation::{count_words, visible_text, Document};

/// Boilerplate subtrees dropped before measuring a page.
const REMOVED_TAGS: [&str; 10] =
    ["script", "style", "nav", "header", "footer", "aside", "form", "iframe", "noscript", "svg"];

/// Classes and ids that usually wrap the article body, tried after the
/// semantic containers.
const CONTENT_CLASSES: [&str; 5] =
    ["article-content", "post-content", "entry-content", "content-area", "main-content"];

/// Outline of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutline {
    /// Page title
    pub title: Option<String>,
    /// h1-h3 headings of the main content, in document order
    pub headings: Vec<Heading>,
    /// Words in the main content
    pub word_count: usize,
    /// Distinct tags present in the main content
    pub tags: Vec<String>,
}

/// Extract headings, word count and tag inventory from a page's main region.
pub fn extract_outline(html: &str) -> PageOutline {
    let doc = Document::parse(html);
    let region = main_region(&doc);

    let region_range = match region {
        Some(root) => doc.subtree(root),
        None => 0..doc.elements().len(),
    };

    // Outermost removed elements, in document order, and everything kept.
    let mut removed: Vec<usize> = Vec::new();
    let mut kept: Vec<usize> = Vec::new();
    let mut skip_until = 0;
    for idx in region_range {
        if idx < skip_until {
            continue;
        }
        if REMOVED_TAGS.contains(&doc.element(idx).tag.as_str()) {
            removed.push(idx);
            skip_until = doc.subtree(idx).end;
        } else {
            kept.push(idx);
        }
    }

    let headings = kept
        .iter()
        .filter_map(|&idx| {
            let level = match doc.element(idx).tag.as_str() {
                "h1" => 1,
                "h2" => 2,
                "h3" => 3,
                _ => return None,
            };
            let text = visible_text(doc.inner_html(idx));
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect();

    let mut tags: Vec<String> = kept.iter().map(|&idx| doc.element(idx).tag.clone()).collect();
    tags.sort();
    tags.dedup();

    let body = region_text(&doc, region, &removed);
    let title = doc
        .by_tag("title")
        .next()
        .map(|(idx, _)| visible_text(doc.inner_html(idx)))
        .filter(|t| !t.is_empty());

    PageOutline { title, headings, word_count: count_words(&body), tags }
}

/// Summarize a fetched page and diff it against structural hints.
pub(crate) fn summarize(
    url: &str,
    html: &str,
    hints: &[StructuralHint],
) -> Result<CompetitorSummary, FetchError> {
    let outline = extract_outline(html);
    if outline.word_count == 0 && outline.headings.is_empty() {
        return Err(FetchError::NoContent);
    }

    let gaps = content_gaps(&outline, hints);
    let title = outline
        .title
        .clone()
        .or_else(|| outline.headings.iter().find(|h| h.level == 1).map(|h| h.text.clone()))
        .unwrap_or_else(|| url.to_string());

    Ok(CompetitorSummary {
        url: url.to_string(),
        title,
        headings: outline.headings,
        word_count: outline.word_count,
        gaps,
    })
}

/// Hints the page does not cover, by description.
pub fn content_gaps(outline: &PageOutline, hints: &[StructuralHint]) -> Vec<String> {
    let headings: Vec<String> = outline.headings.iter().map(|h| h.text.to_lowercase()).collect();

    hints
        .iter()
        .filter(|hint| {
            let by_heading = hint
                .match_terms
                .iter()
                .any(|term| headings.iter().any(|h| h.contains(&term.to_lowercase())));
            let by_element = hint.element.as_ref().is_some_and(|tag| outline.tags.contains(tag));
            !(by_heading || by_element)
        })
        .map(|hint| hint.description.clone())
        .collect()
}

fn first_where(doc: &Document, pred: impl Fn(&Element) -> bool) -> Option<usize> {
    doc.elements().iter().position(pred)
}

fn main_region(doc: &Document) -> Option<usize> {
    first_where(doc, |e| e.is("article"))
        .or_else(|| first_where(doc, |e| e.attr("role") == Some("main")))
        .or_else(|| first_where(doc, |e| e.is("main")))
        .or_else(|| CONTENT_CLASSES.iter().find_map(|class| first_where(doc, |e| e.has_class(class))))
        .or_else(|| first_where(doc, |e| e.attr("id") == Some("content")))
        .or_else(|| first_where(doc, |e| e.is("body")))
}

fn region_text(doc: &Document, region: Option<usize>, removed: &[usize]) -> String {
    let masked = doc.masked();
    let (mut cursor, end) = match region {
        Some(root) => {
            let element = doc.element(root);
            (element.open_end, element.close_start)
        }
        None => (0, masked.len()),
    };

    let mut text = String::with_capacity(end.saturating_sub(cursor));
    for &idx in removed {
        let range = doc.outer_range(idx);
        if range.start < cursor || range.start > end {
            continue;
        }
        text.push_str(&masked[cursor..range.start]);
        text.push(' ');
        cursor = range.end.min(end);
    }
    text.push_str(&masked[cursor..end]);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::generic_hints;

    const PAGE: &str = r#"<html><head><title>Best laptops 2026</title><style>h2 { color: red }</style></head>
<body>
<header><nav><a href="/">Home</a> <h2>Menu</h2></nav></header>
<article>
  <h1>The best laptops</h1>
  <p>We tested twenty laptops over three months.</p>
  <aside><h3>Newsletter</h3><p>Sign up now for deals</p></aside>
  <h2>How we chose</h2>
  <p>Battery, screen and keyboard.</p>
  <h3>Frequently asked questions</h3>
  <p>Which one should I buy?</p>
</article>
<footer>Copyright words here</footer>
</body></html>"#;

    #[test]
    fn test_outline_uses_article_region() {
        let outline = extract_outline(PAGE);
        let texts: Vec<&str> = outline.headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["The best laptops", "How we chose", "Frequently asked questions"]);
        assert_eq!(outline.title.as_deref(), Some("Best laptops 2026"));
        // aside excluded
        assert_eq!(outline.word_count, 25);
    }

    #[test]
    fn test_falls_back_to_body() {
        let outline = extract_outline("<body><nav>skip me</nav><h2>Intro</h2><p>one two</p></body>");
        assert_eq!(outline.headings.len(), 1);
        assert_eq!(outline.word_count, 3);
    }

    #[test]
    fn test_gaps_against_generic_hints() {
        let outline = extract_outline(PAGE);
        let gaps = content_gaps(&outline, &generic_hints());
        assert!(gaps.iter().any(|g| g.starts_with("Comparison table")));
        assert!(gaps.iter().any(|g| g.starts_with("Closing verdict")));
        assert!(!gaps.iter().any(|g| g.starts_with("FAQ")));
    }

    #[test]
    fn test_empty_page_is_no_content() {
        let result = summarize("https://x.example", "<html><body><nav>menu</nav></body></html>", &[]);
        assert_eq!(result.unwrap_err(), FetchError::NoContent);
    }

    #[test]
    fn test_deeply_nested_page_is_measured() {
        let depth = 20_000;
        let page = format!(
            "<article><h2>Deep</h2>{}<p>one two three</p><nav>{}<p>menu</p></nav></article>",
            "<div>".repeat(depth),
            "<span>".repeat(depth)
        );
        let outline = extract_outline(&page);
        assert_eq!(outline.headings.len(), 1);
        assert_eq!(outline.word_count, 4);
        assert!(outline.tags.contains(&"div".to_string()));
        assert!(!outline.tags.contains(&"span".to_string()));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let summary = summarize("https://x.example", "<article><h1>Hello</h1><p>body text</p></article>", &[])
            .unwrap();
        assert_eq!(summary.title, "Hello");
    }
}
