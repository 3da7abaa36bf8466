//! CMS document schema.
//!
//! The generated HTML is pasted into a CMS that expects three top-level
//! `<article>` blocks in a fixed order. Prompt templates and the structural
//! validator both read their class names from here.

/// Class of the first article (kicker, title, table of contents, body).
pub const MAIN_ARTICLE_CLASS: &str = "contentGenerator__main";

/// Class of the second article (frequently asked questions).
pub const FAQ_ARTICLE_CLASS: &str = "contentGenerator__faqs";

/// Class of the third article (closing verdict).
pub const VERDICT_ARTICLE_CLASS: &str = "contentGenerator__verdict";

/// Article classes in document order.
pub const ARTICLE_CLASSES: [&str; 3] = [MAIN_ARTICLE_CLASS, FAQ_ARTICLE_CLASS, VERDICT_ARTICLE_CLASS];

/// Inline label shown above the title.
pub const KICKER_CLASS: &str = "kicker";

/// Table of contents container.
pub const TOC_CLASS: &str = "toc";

/// FAQ list container.
pub const FAQ_CLASS: &str = "faqs";

/// Closing verdict box.
pub const VERDICT_CLASS: &str = "verdict-box";

/// Highlighted callout boxes (plain and promotional).
pub const CALLOUT_CLASSES: [&str; 2] = ["callout", "bf-callout"];

/// Annotated HTML skeleton embedded into generation prompts.
pub const SKELETON: &str = r##"<article class="contentGenerator__main">
    <span class="kicker">KICKER TEXT</span>
    <h2>Main title with the keyword</h2>

    <nav class="toc">
        <p class="toc__title">In this article</p>
        <ol class="toc__list">
            <li><a href="#section-1">Section 1</a></li>
        </ol>
    </nav>

    <section id="section-1">
        <h3>Subheading</h3>
        <p>Body...</p>
        <div class="callout">
            <p><strong>Tip:</strong> highlighted advice.</p>
        </div>
    </section>
</article>

<article class="contentGenerator__faqs">
    <h2>Frequently asked questions</h2>
    <div class="faqs">
        <div class="faqs__item">
            <h3 class="faqs__question">Question?</h3>
            <p class="faqs__answer">Answer...</p>
        </div>
    </div>
</article>

<article class="contentGenerator__verdict">
    <div class="verdict-box">
        <h2>Final verdict</h2>
        <p>Conclusion...</p>
    </div>
</article>"##;

/// Structural rules restated in prose for the critique and final prompts.
pub const STRUCTURE_RULES: [&str; 6] = [
    "Exactly three top-level <article> elements, in this order: contentGenerator__main, contentGenerator__faqs, contentGenerator__verdict",
    "The main title is an <h2>; never use <h1>",
    "The kicker is an inline <span class=\"kicker\">, never a <div> or <p>",
    "A <nav class=\"toc\"> table of contents follows the title",
    "Section subheadings use <h3>",
    "Pure HTML only: no Markdown, no code fences, no commentary before or after the HTML",
];
