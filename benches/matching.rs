//! Benchmarks for fsadict lookup paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fsadict::Index;

/// Two segments of synthetic keys with a shared prefix structure, plus a
/// handful of overwrites so the zip merge has duplicates to collapse.
fn synthetic_index() -> Index {
    let index = Index::new();
    let old: Vec<(String, String)> = (0..2000)
        .map(|i| (format!("key:{i:08}"), format!("{{v:{i}}}")))
        .collect();
    index.add_segment(old).expect("segment build failed");
    let new: Vec<(String, String)> = (0..2000)
        .step_by(4)
        .map(|i| (format!("key:{i:08}"), format!("{{w:{i}}}")))
        .collect();
    index.add_segment(new).expect("segment build failed");
    index
}

fn bench_exact_get(c: &mut Criterion) {
    let index = synthetic_index();
    c.bench_function("exact_get", |b| {
        b.iter(|| index.get(black_box(b"key:00001000")))
    });
}

fn bench_fuzzy(c: &mut Criterion) {
    let index = synthetic_index();
    c.bench_function("fuzzy_distance_2", |b| {
        b.iter(|| index.fuzzy(black_box(b"key:00001000"), 2, 4).count())
    });
}

fn bench_near(c: &mut Criterion) {
    let index = synthetic_index();
    c.bench_function("near_locked", |b| {
        b.iter(|| index.near(black_box(b"key:00001000"), 4, false).count())
    });
    c.bench_function("near_greedy", |b| {
        b.iter(|| index.near(black_box(b"key:00001000"), 8, true).count())
    });
}

criterion_group!(benches, bench_exact_get, bench_fuzzy, bench_near);
criterion_main!(benches);
