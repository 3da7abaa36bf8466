//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use copyforge::validation::count_words;
use copyforge::{Archetype, ArchetypeRegistry};

/// Look up a built-in archetype.
pub fn archetype(id: &str) -> Arc<Archetype> {
    ArchetypeRegistry::builtin().get(id).unwrap()
}

/// A well-formed three-article document with `filler` extra body words.
pub fn article_with_filler(filler: usize) -> String {
    let body = vec!["palabra"; filler].join(" ");
    format!(
        r##"<article class="contentGenerator__main">
    <span class="kicker">Review</span>
    <h2>Laptop X review: worth it in 2026?</h2>
    <nav class="toc">
        <ol>
            <li><a href="#design">Design</a></li>
            <li><a href="#performance">Performance</a></li>
        </ol>
    </nav>
    <section id="design">
        <h3>Design and build quality</h3>
        <p>{body}</p>
        <div class="callout"><p><strong>Tip:</strong> check the hinge before buying.</p></div>
    </section>
    <section id="performance">
        <h3>Performance</h3>
        <p>See our <a href="/portatiles">laptops</a> and the
        <a href="https://www.pccomponentes.com/laptop-x">Laptop X page</a>, or the
        <a href="https://example.org/benchmarks">independent benchmarks</a>.</p>
    </section>
</article>

<article class="contentGenerator__faqs">
    <h2>Frequently asked questions</h2>
    <div class="faqs">
        <h3>Is it good for gaming?</h3>
        <p>Yes, for most titles at medium settings.</p>
    </div>
</article>

<article class="contentGenerator__verdict">
    <div class="verdict-box">
        <h2>Verdict</h2>
        <p>A solid buy at its price.</p>
    </div>
</article>"##
    )
}

/// A well-formed document measuring exactly `words` words.
pub fn article_with_words(words: usize) -> String {
    let base = count_words(&article_with_filler(0));
    assert!(words >= base, "fixture needs at least {base} words");
    let html = article_with_filler(words - base);
    assert_eq!(count_words(&html), words);
    html
}
