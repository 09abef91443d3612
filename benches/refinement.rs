//! Benchmarks for insertion and refinement
//!
//! 1. **`insert_points`**: unguided (full-scan) batch insertion of random points
//! 2. **`subdivide_triangle`**: flood-filled subdivision of the largest triangle
//! 3. **`refine`**: a complete seeded refinement run at several cutoffs

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use plasma_mesh::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::sync::OnceLock;

const SIZE: f64 = 512.0;

/// Get the deterministic seed for random point generation.
/// Reads `PLASMA_BENCH_SEED` (decimal or 0x-hex). Defaults to 0xD1EA.
fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        std::env::var("PLASMA_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0xD1EA)
    })
}

fn random_interior_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Point::new(
                rng.random_range(1.0..SIZE - 1.0),
                rng.random_range(1.0..SIZE - 1.0),
            )
        })
        .collect()
}

fn empty_mesh(seed: u64) -> DelaunayTriangulation {
    let options = TriangulationOptionsBuilder::default()
        .seed(seed)
        .build()
        .unwrap();
    DelaunayTriangulation::with_options(BoundingBox::from_size(SIZE, SIZE).unwrap(), options)
        .unwrap()
}

fn benchmark_insert_points(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let mut group = c.benchmark_group("insert_points");

    for &n in &[100_usize, 500, 1_000] {
        let points = random_interior_points(n, seed);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter_batched(
                || empty_mesh(seed),
                |mut dt| {
                    for &p in points {
                        let _ = dt.insert_point(p);
                    }
                    black_box(dt)
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn benchmark_subdivide_largest(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let mut group = c.benchmark_group("subdivide_largest");

    for &steps in &[1_000_usize, 5_000] {
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_function(BenchmarkId::from_parameter(steps), |b| {
            b.iter_batched(
                || empty_mesh(seed),
                |mut dt| {
                    for _ in 0..steps {
                        if let Some((key, _)) = dt.largest() {
                            let _ = dt.subdivide_triangle(key);
                        }
                    }
                    black_box(dt)
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn benchmark_refine(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let seeds = random_interior_points(50, seed);
    let mut group = c.benchmark_group("refine");
    group.sample_size(20);

    for &fraction in &[0.005_f64, 0.001, 0.0005] {
        group.bench_with_input(
            BenchmarkId::from_parameter(fraction),
            &fraction,
            |b, &fraction| {
                b.iter(|| {
                    let result = refine(
                        BoundingBox::from_size(SIZE, SIZE).unwrap(),
                        seeds.iter().copied(),
                        DistanceInterpolation::default(),
                        TriangulationOptionsBuilder::default().seed(seed).build().unwrap(),
                        RefinementOptionsBuilder::default()
                            .cutoff(AreaCutoff::FractionOfBounds(fraction))
                            .progress_interval(0_usize)
                            .build()
                            .unwrap(),
                    );
                    black_box(result.map(|(_, report)| report.final_triangles))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_insert_points,
    benchmark_subdivide_largest,
    benchmark_refine
);
criterion_main!(benches);
