//! Performance benchmarks for Copyforge.
//!
//! This module contains benchmarks for:
//! - Structural validation of complete articles
//! - Word counting over HTML
//! - Prompt construction
//! - Competitor outline extraction
//!
//! Run with: `cargo bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use copyforge::competitive::extract_outline;
use copyforge::validation::count_words;
use copyforge::{Archetype, ArchetypeRegistry, GenerationRequest, PromptBuilder, Validator};

// ============================================================================
// Mock Data Fixtures
// ============================================================================

mod fixtures {
    /// Generate a three-article document with `sections` body sections.
    pub fn generate_article(sections: usize) -> String {
        let mut body = String::new();
        for i in 0..sections {
            body.push_str(&format!(
                "<section id=\"s{i}\"><h3>Section {i}</h3>\
                 <p>Battery life, screen quality and keyboard feel all matter when you pick a laptop &amp; \
                 we tested each one for <strong>weeks</strong> before writing this.</p>\
                 <p>See <a href=\"/portatiles\">laptops</a> or <a href=\"https://example.org/{i}\">source</a>.</p>\
                 </section>\n"
            ));
        }
        format!(
            "<article class=\"contentGenerator__main\"><span class=\"kicker\">Review</span>\
             <h2>Laptop X review</h2><nav class=\"toc\"><ol><li><a href=\"#s0\">Start</a></li></ol></nav>\n\
             {body}<div class=\"callout\"><p>Tip</p></div></article>\n\
             <article class=\"contentGenerator__faqs\"><div class=\"faqs\"><h3>Q?</h3><p>A.</p></div></article>\n\
             <article class=\"contentGenerator__verdict\"><div class=\"verdict-box\"><h2>Verdict</h2><p>Buy.</p></div></article>"
        )
    }

    /// Generate a competitor page with boilerplate around the article.
    pub fn generate_competitor_page(sections: usize) -> String {
        let mut body = String::new();
        for i in 0..sections {
            body.push_str(&format!("<h2>Heading {i}</h2><p>Some paragraph text about the product number {i}.</p>"));
        }
        format!(
            "<html><head><title>Competitor</title><script>var x = '<h2>';</script></head><body>\
             <header><nav><a href=\"/\">Home</a></nav></header><article>{body}</article>\
             <footer>Footer</footer></body></html>"
        )
    }
}

fn review() -> Arc<Archetype> {
    ArchetypeRegistry::builtin().get("product-review").unwrap()
}

// ============================================================================
// Validation Benchmarks
// ============================================================================

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let validator = Validator::default();
    let archetype = review();

    for sections in [5, 25, 100] {
        let html = fixtures::generate_article(sections);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("validate", sections), &html, |b, html| {
            b.iter(|| validator.validate_for(black_box(html), &archetype, 1500));
        });
    }

    group.finish();
}

fn bench_word_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("word_count");

    for sections in [5, 100] {
        let html = fixtures::generate_article(sections);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("count_words", sections), &html, |b, html| {
            b.iter(|| count_words(black_box(html)));
        });
    }

    group.finish();
}

// ============================================================================
// Prompt Benchmarks
// ============================================================================

fn bench_prompts(c: &mut Criterion) {
    let builder = PromptBuilder::default();
    let request = GenerationRequest::builder(review(), "laptop x review")
        .field("product", "Laptop X")
        .target_length(1200)
        .build()
        .unwrap();
    let draft = fixtures::generate_article(25);

    c.bench_function("draft_prompt", |b| {
        b.iter(|| builder.build_draft_prompt(black_box(&request)));
    });
    c.bench_function("critique_prompt", |b| {
        b.iter(|| builder.build_critique_prompt(black_box(&request), black_box(&draft)));
    });
}

// ============================================================================
// Extraction Benchmarks
// ============================================================================

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for sections in [10, 100] {
        let page = fixtures::generate_competitor_page(sections);
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(BenchmarkId::new("extract_outline", sections), &page, |b, page| {
            b.iter(|| extract_outline(black_box(page)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validation, bench_word_count, bench_prompts, bench_extraction);
criterion_main!(benches);
