//! Performance benchmarks for scatter-coalesce
//!
//! Run with: cargo bench
//!
//! Covers index construction and both reduction modes at realistic sizes.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use scatter_coalesce::{AxisPolicy, CoalescePolicy, Quadtree, coalesce_sequential};

/// Generate an association-like scatter: x ascending (genomic position),
/// y mostly noise near zero with occasional significant peaks.
fn generate_scatter(num_points: usize) -> Vec<(f64, f64)> {
    (0..num_points)
        .map(|i| {
            let x = i as f64;
            let noise = ((i as f64 * 12.9898).sin() * 43758.5453).fract().abs();
            let y = if i % 997 == 0 { 50.0 + noise * 300.0 } else { noise };
            (x, y)
        })
        .collect()
}

/// Policy tuned to collapse the noise floor while keeping peaks
fn reduction_policy(num_points: usize) -> CoalescePolicy {
    CoalescePolicy::new(
        AxisPolicy::new(num_points as f64 / 800.0, f64::NEG_INFINITY, f64::INFINITY),
        AxisPolicy::new(f64::INFINITY, 0.0, 1.0),
    )
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for size in [10_000, 50_000] {
        let points = generate_scatter(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| {
                Quadtree::build(points.clone(), |p: &(f64, f64)| p.0, |p: &(f64, f64)| p.1)
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_coalesce_indexed(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesce_indexed");

    for size in [10_000, 50_000] {
        let tree =
            Quadtree::build(generate_scatter(size), |p: &(f64, f64)| p.0, |p: &(f64, f64)| {
                p.1
            })
            .unwrap();
        let policy = reduction_policy(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| tree.coalesce(&policy));
        });
        group.bench_with_input(
            BenchmarkId::new("parallel", size),
            &tree,
            |b, tree| {
                b.iter(|| tree.coalesce_par(&policy));
            },
        );
    }

    group.finish();
}

fn bench_coalesce_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesce_sequential");

    for size in [10_000, 50_000] {
        let points = generate_scatter(size);
        let policy = reduction_policy(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| {
                coalesce_sequential(
                    points.clone(),
                    |p: &(f64, f64)| p.0,
                    |p: &(f64, f64)| p.1,
                    &policy,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_index_build,
    bench_coalesce_indexed,
    bench_coalesce_sequential
);
criterion_main!(benches);
