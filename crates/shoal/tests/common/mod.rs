//! Shared fixtures and invariant checks for the integration tests.
#![allow(dead_code)]

use rand::{Rng, SeedableRng};

/// The 1-D tri-modal dataset: three tight groups around 1.1, 3.1, and 8.1.
pub fn tri_modal() -> Vec<Vec<f64>> {
    vec![
        vec![1.0],
        vec![1.2],
        vec![1.1],
        vec![3.0],
        vec![3.2],
        vec![3.1],
        vec![8.0],
        vec![8.2],
        vec![8.1],
    ]
}

/// The partition the tri-modal dataset should resolve to.
pub fn tri_modal_partition() -> Vec<Vec<usize>> {
    vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]
}

/// Two 1-D chains of three points each, far apart.
pub fn two_chains() -> Vec<Vec<f64>> {
    vec![vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0], vec![12.0]]
}

/// Seeded uniform tabular data.
pub fn random_tabular(cardinality: usize, dimension: usize, min: f64, max: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..cardinality)
        .map(|_| (0..dimension).map(|_| rng.random_range(min..max)).collect())
        .collect()
}

/// Two seeded 2-D blobs of `per_blob` points each, centered far apart,
/// followed by any extra points appended by the caller.
pub fn two_blobs(per_blob: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(2 * per_blob);
    for center in [0.0, 10.0] {
        for _ in 0..per_blob {
            data.push(vec![
                center + rng.random_range(0.0..0.3),
                center + rng.random_range(0.0..0.3),
            ]);
        }
    }
    data
}

/// Checks the universal partition invariants: member indices are valid and
/// unique, and clusters plus noise cover `0..size` exactly.
pub fn assert_partition(clusters: &[Vec<usize>], noise: &[usize], size: usize) {
    let mut seen = vec![false; size];
    for cluster in clusters {
        assert!(!cluster.is_empty(), "empty cluster in {clusters:?}");
        for &member in cluster {
            assert!(member < size, "member {member} out of range {size}");
            assert!(!seen[member], "member {member} appears twice");
            seen[member] = true;
        }
    }
    for &member in noise {
        assert!(member < size, "noise member {member} out of range {size}");
        assert!(!seen[member], "noise member {member} also clustered");
        seen[member] = true;
    }
    assert!(seen.iter().all(|&covered| covered), "coverage hole in {clusters:?} + {noise:?}");
}

/// Normalizes a partition for order-insensitive comparison: members sorted
/// within clusters, clusters sorted by first member.
pub fn normalized(clusters: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut normalized = clusters
        .iter()
        .map(|cluster| {
            let mut cluster = cluster.clone();
            cluster.sort_unstable();
            cluster
        })
        .collect::<Vec<_>>();
    normalized.sort();
    normalized
}
