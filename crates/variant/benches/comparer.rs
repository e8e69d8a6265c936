// Structural comparison benchmarks
// Run with: cargo bench -p nebula-variant

use criterion::{Criterion, criterion_group, criterion_main};
use nebula_variant::Variant;
use std::hint::black_box;

fn record(id: i64) -> Variant {
    Variant::object([
        ("id", Variant::from(id)),
        ("name", Variant::from(format!("item-{id}"))),
        ("price", Variant::from(id as f64 * 1.25)),
        ("tags", Variant::array([Variant::from("a"), Variant::from("b")])),
        ("active", Variant::from(id % 2 == 0)),
    ])
}

fn document(size: i64) -> Variant {
    Variant::object([
        ("version", Variant::from("1")),
        ("items", (0..size).map(record).collect()),
    ])
}

/// Hash of a nested document
fn bench_deep_hash(c: &mut Criterion) {
    let doc = document(100);
    c.bench_function("deep_hash_100_records", |b| {
        b.iter(|| black_box(black_box(&doc).deep_hash()));
    });
}

/// Equality of two independently built documents
fn bench_deep_equals(c: &mut Criterion) {
    let left = document(100);
    let right = document(100);
    c.bench_function("deep_equals_100_records", |b| {
        b.iter(|| black_box(black_box(&left).deep_equals(black_box(&right))));
    });
}

/// Cross-representation numeric equality (hot path for mixed sources)
fn bench_numeric_equals(c: &mut Criterion) {
    let int = Variant::from(42);
    let text = Variant::from("42");
    c.bench_function("equals_int_vs_text", |b| {
        b.iter(|| black_box(black_box(&int).deep_equals(black_box(&text))));
    });
}

fn bench_compare(c: &mut Criterion) {
    let left = document(50);
    let right = document(51);
    c.bench_function("compare_50_vs_51_records", |b| {
        b.iter(|| black_box(black_box(&left).compare(black_box(&right))));
    });
}

criterion_group!(
    benches,
    bench_deep_hash,
    bench_deep_equals,
    bench_numeric_equals,
    bench_compare
);
criterion_main!(benches);
