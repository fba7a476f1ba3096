//! Benchmarks for the text filter
//!
//! Run with: cargo bench --package pipeline

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pipeline::filters::TextFilter;

const DESCRIPTIONS: &[&str] = &[
    "A fast, zero-dependency LRU cache for Node.js and the browser",
    "React hooks for managing remote state with caching and revalidation",
    "Command line tool to scaffold TypeScript projects",
    "",
    "Utility belt: debounce, throttle, memoize, deep clone and more",
];

fn bench_whole_word(c: &mut Criterion) {
    let filter = TextFilter::new(&["fast", "cache"], false).expect("valid terms");

    c.bench_function("text_filter_whole_word", |b| {
        b.iter(|| {
            DESCRIPTIONS
                .iter()
                .filter(|d| filter.matches(black_box(d)))
                .count()
        })
    });
}

fn bench_partial(c: &mut Criterion) {
    let filter = TextFilter::new(&["fast", "cache"], true).expect("valid terms");

    c.bench_function("text_filter_partial", |b| {
        b.iter(|| {
            DESCRIPTIONS
                .iter()
                .filter(|d| filter.matches(black_box(d)))
                .count()
        })
    });
}

criterion_group!(benches, bench_whole_word, bench_partial);
criterion_main!(benches);
