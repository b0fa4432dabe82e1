//! Benchmarks for the K-Means hot loop, sequential and pooled.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use shoal::cluster::KMeans;
use shoal::initializer::KMeansPlusPlus;
use shoal::parallel::ThreadPool;

/// Seeded uniform tabular data.
fn tabular(cardinality: usize, dimension: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..cardinality)
        .map(|_| (0..dimension).map(|_| rng.random_range(-10.0..10.0)).collect())
        .collect()
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    let pool = ThreadPool::new();

    for &cardinality in &[1_000_usize, 10_000] {
        let data = tabular(cardinality, 8, 42);
        let centers = KMeansPlusPlus::new(16, 42)
            .initialize(&data)
            .map_or_else(|e| unreachable!("{e}"), |c| c);

        group.bench_with_input(BenchmarkId::new("sequential", cardinality), &data, |b, data| {
            b.iter(|| {
                KMeans::new(centers.clone(), 0.001)
                    .process(data)
                    .map_or_else(|e| unreachable!("{e}"), |r| r)
            });
        });
        group.bench_with_input(BenchmarkId::new("pooled", cardinality), &data, |b, data| {
            b.iter(|| {
                KMeans::new(centers.clone(), 0.001)
                    .par_process(data, &pool)
                    .map_or_else(|e| unreachable!("{e}"), |r| r)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kmeans);
criterion_main!(benches);
