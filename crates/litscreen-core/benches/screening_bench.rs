//! # Screening Benchmarks
//!
//! Performance benchmarks for litscreen-core merge and screening passes.
//!
//! Run with: `cargo bench -p litscreen-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use litscreen_core::{
    AbstractResolver, CanonicalRecord, EvidenceMatcher, Pipeline, ScreeningConfig, Source,
    TitleScreener, merge,
};
use std::hint::black_box;

const TITLES: [&str; 4] = [
    "Deep reinforcement learning for ventilator weaning",
    "Predicting extubation failure after mechanical ventilation",
    "Sepsis treatment policies from offline data",
    "A cohort study of ICU readmissions",
];

/// Build `size` records where roughly a third share a DOI with an earlier one.
fn create_corpus(size: usize) -> Vec<CanonicalRecord> {
    (0..size)
        .map(|i| {
            let source = Source::ALL[i % Source::ALL.len()];
            let title = TITLES[i % TITLES.len()];
            let record = CanonicalRecord::new(source, format!("id-{}", i))
                .with_title(&format!("{} {}", title, i / 3))
                .with_year(Some(2015 + (i % 10) as i32));
            if i % 2 == 0 {
                record.with_doi(&format!("10.1000/{}", i / 3))
            } else {
                record
            }
        })
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1000, 10000].iter() {
        let corpus = create_corpus(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &corpus, |b, corpus| {
            b.iter(|| black_box(merge(corpus.clone())));
        });
    }

    group.finish();
}

fn bench_title_screen(c: &mut Criterion) {
    let mut group = c.benchmark_group("title_screen");
    let matcher = EvidenceMatcher::new(ScreeningConfig::default()).expect("compile term lists");

    for size in [100, 1000, 10000].iter() {
        let corpus = create_corpus(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &corpus, |b, corpus| {
            let screener = TitleScreener::new(&matcher, false);
            b.iter(|| black_box(screener.screen(corpus.clone())));
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for size in [100, 1000].iter() {
        let corpus = create_corpus(*size);
        let pipeline = Pipeline::new(ScreeningConfig::default(), AbstractResolver::empty())
            .expect("pipeline");
        group.bench_with_input(BenchmarkId::from_parameter(size), &corpus, |b, corpus| {
            b.iter(|| black_box(pipeline.run(corpus.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge, bench_title_screen, bench_pipeline);
criterion_main!(benches);
