//! Lenient HTML element tree.
//!
//! Tags are found with linear-time regexes and nested with an open-element
//! stack. Comments and `<script>`/`<style>` bodies are masked out first so
//! markup inside them is never mistaken for structure. Unbalanced input is
//! tolerated: a closing tag pops back to its matching opener, stray closers
//! are ignored and elements left open run to the end of the input.
//!
//! Elements are stored in document order and each records where its subtree
//! ends, so containment checks are constant time and parsing stays linear
//! however deeply the input nests.

use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Comments and raw-text elements whose content is not markup.
pub(crate) static RAW_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap()
});

/// Opening, closing and self-closing tags.
pub(crate) static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap()
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// One element of the parsed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes with lowercase names, in source order
    pub attrs: Vec<(String, String)>,
    /// Index of the enclosing element
    pub parent: Option<usize>,
    /// Nesting depth, 0 for top-level elements
    pub depth: usize,
    /// Byte offset of `<`
    pub start: usize,
    /// Byte offset just past the opening tag
    pub open_end: usize,
    /// Byte offset of the closing tag (or of the implicit close)
    pub close_start: usize,
    /// Byte offset just past the closing tag
    pub end: usize,
    /// Index one past the element's last descendant
    pub subtree_end: usize,
}

impl Element {
    /// Value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Whitespace-separated class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// Whether the element carries a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Whether the element is one of the given tags.
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

/// Parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    masked: String,
    elements: Vec<Element>,
    line_starts: Vec<usize>,
}

impl Document {
    /// Parse an HTML fragment or page.
    pub fn parse(html: &str) -> Self {
        let masked = mask_raw_text(html);
        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        // Open elements per tag; stray closers are skipped without scanning the stack.
        let mut open_by_tag: HashMap<String, usize> = HashMap::new();

        for caps in TAG_RE.captures_iter(&masked) {
            let Some(whole) = caps.get(0) else { continue };
            let closing = !caps[1].is_empty();
            let tag = caps[2].to_ascii_lowercase();

            if closing {
                if open_by_tag.get(&tag).copied().unwrap_or(0) == 0 {
                    continue;
                }
                let Some(pos) = open.iter().rposition(|&i| elements[i].tag == tag) else {
                    continue;
                };
                let subtree_end = elements.len();
                for &implicit in &open[pos + 1..] {
                    let element = &mut elements[implicit];
                    element.close_start = whole.start();
                    element.end = whole.start();
                    element.subtree_end = subtree_end;
                }
                let idx = open[pos];
                elements[idx].close_start = whole.start();
                elements[idx].end = whole.end();
                elements[idx].subtree_end = subtree_end;
                for &popped in &open[pos..] {
                    if let Some(count) = open_by_tag.get_mut(&elements[popped].tag) {
                        *count -= 1;
                    }
                }
                open.truncate(pos);
                continue;
            }

            let raw_attrs = caps.get(3).map_or("", |m| m.as_str());
            let self_closing = raw_attrs.trim_end().ends_with('/');
            let element = Element {
                attrs: parse_attrs(raw_attrs.trim_end_matches('/')),
                parent: open.last().copied(),
                depth: open.len(),
                start: whole.start(),
                open_end: whole.end(),
                close_start: whole.end(),
                end: whole.end(),
                subtree_end: elements.len() + 1,
                tag,
            };

            let idx = elements.len();
            let is_void = self_closing || VOID_ELEMENTS.contains(&element.tag.as_str());
            if !is_void {
                *open_by_tag.entry(element.tag.clone()).or_insert(0) += 1;
                open.push(idx);
            }
            elements.push(element);
        }

        let len = masked.len();
        let count = elements.len();
        for idx in open {
            let element = &mut elements[idx];
            element.close_start = len;
            element.end = len;
            element.subtree_end = count;
        }

        let line_starts = std::iter::once(0)
            .chain(html.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self { masked, elements, line_starts }
    }

    /// All elements in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Element by index.
    pub fn element(&self, idx: usize) -> &Element {
        &self.elements[idx]
    }

    /// Top-level elements.
    pub fn top_level(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.elements.iter().enumerate().filter(|(_, e)| e.depth == 0)
    }

    /// Elements with the given tag.
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (usize, &'a Element)> + 'a {
        self.elements.iter().enumerate().filter(move |(_, e)| e.tag == tag)
    }

    /// Elements carrying the given class.
    pub fn with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = (usize, &'a Element)> + 'a {
        self.elements.iter().enumerate().filter(move |(_, e)| e.has_class(class))
    }

    /// Elements nested anywhere inside `ancestor`.
    pub fn descendants(&self, ancestor: usize) -> impl Iterator<Item = (usize, &Element)> + '_ {
        let range = self.subtree(ancestor);
        self.elements[range.clone()].iter().enumerate().map(move |(i, e)| (range.start + i, e))
    }

    /// Index range of the elements nested inside `ancestor`.
    pub fn subtree(&self, ancestor: usize) -> Range<usize> {
        ancestor + 1..self.elements[ancestor].subtree_end
    }

    /// Whether `idx` is nested inside `ancestor`.
    pub fn is_within(&self, idx: usize, ancestor: usize) -> bool {
        self.subtree(ancestor).contains(&idx)
    }

    /// Markup between the opening and closing tag.
    pub fn inner_html(&self, idx: usize) -> &str {
        let element = &self.elements[idx];
        &self.masked[element.open_end..element.close_start]
    }

    /// Byte range of the element including its tags.
    pub fn outer_range(&self, idx: usize) -> Range<usize> {
        let element = &self.elements[idx];
        element.start..element.end
    }

    /// The input with comments and script/style bodies blanked out.
    pub fn masked(&self) -> &str {
        &self.masked
    }

    /// 1-based line of a byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Location hint for an element, e.g. `line 12 <div>`.
    pub fn location(&self, idx: usize) -> String {
        let element = &self.elements[idx];
        format!("line {} <{}>", self.line_of(element.start), element.tag)
    }
}

/// Replace comments and raw-text element bodies with spaces, keeping byte
/// offsets and line breaks intact.
fn mask_raw_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for m in RAW_TEXT_RE.find_iter(html) {
        out.push_str(&html[last..m.start()]);
        for ch in m.as_str().chars() {
            if ch == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
            }
        }
        last = m.end();
    }
    out.push_str(&html[last..]);
    out
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or_else(String::new, |m| m.as_str().to_string());
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_and_depth() {
        let doc = Document::parse(r#"<article class="a"><h2>T</h2><p>x<br>y</p></article><article></article>"#);
        let top: Vec<&str> = doc.top_level().map(|(_, e)| e.tag.as_str()).collect();
        assert_eq!(top, vec!["article", "article"]);

        let (h2, _) = doc.by_tag("h2").next().unwrap();
        assert!(doc.is_within(h2, 0));
        assert_eq!(doc.element(h2).depth, 1);

        let (br, _) = doc.by_tag("br").next().unwrap();
        assert_eq!(doc.element(br).depth, 2);
        assert_eq!(doc.inner_html(h2), "T");
    }

    #[test]
    fn test_attributes() {
        let doc = Document::parse(r#"<a HREF='/x' class="one  two" data-x=3 hidden>t</a>"#);
        let a = doc.element(0);
        assert_eq!(a.attr("href"), Some("/x"));
        assert_eq!(a.attr("data-x"), Some("3"));
        assert_eq!(a.attr("hidden"), Some(""));
        assert!(a.has_class("two"));
        assert!(!a.has_class("one two"));
    }

    #[test]
    fn test_comments_and_scripts_are_not_structure() {
        let doc = Document::parse("<!-- <article> --><script>var s = '<article>';</script><p>x</p>");
        let tags: Vec<&str> = doc.elements().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["p"]);
    }

    #[test]
    fn test_unbalanced_markup_is_tolerated() {
        let doc = Document::parse("<div><p>one<p>two</div></span><section>open");
        let tags: Vec<(&str, usize)> = doc.elements().iter().map(|e| (e.tag.as_str(), e.depth)).collect();
        assert_eq!(tags, vec![("div", 0), ("p", 1), ("p", 2), ("section", 0)]);
        assert_eq!(doc.top_level().count(), 2);
    }

    #[test]
    fn test_subtree_ranges() {
        let doc = Document::parse("<div><p>a<b>b</b></p><p>c</div><section><i>d</i></section><br>");
        assert_eq!(doc.subtree(0), 1..4);
        assert_eq!(doc.subtree(1), 2..3);
        assert_eq!(doc.subtree(3), 4..4);
        assert_eq!(doc.subtree(4), 5..6);
        assert_eq!(doc.subtree(6), 7..7);
        assert!(doc.is_within(2, 0));
        assert!(!doc.is_within(4, 0));
        assert!(!doc.is_within(0, 0));
        let tags: Vec<&str> = doc.descendants(0).map(|(_, e)| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["p", "b", "p"]);
    }

    #[test]
    fn test_deep_nesting_parses_in_linear_time() {
        let depth = 50_000;
        let html = format!("<article class=\"main\">{}<h2>x</h2>{}", "<div>".repeat(depth), "</span>".repeat(depth));
        let started = std::time::Instant::now();
        let doc = Document::parse(&html);
        assert_eq!(doc.descendants(0).count(), depth + 1);
        assert!(doc.descendants(0).any(|(_, e)| e.is("h2")));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_line_numbers() {
        let doc = Document::parse("<p>a</p>\n<p>b</p>\n\n<h1>c</h1>");
        let (h1, _) = doc.by_tag("h1").next().unwrap();
        assert_eq!(doc.location(h1), "line 4 <h1>");
    }
}
