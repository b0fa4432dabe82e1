//! The k-means++ center initializer.

use rand::{Rng, SeedableRng};

use crate::dataset::{self, Point};
use crate::{Error, Metric, Result};

/// Chooses centers by the k-means++ rule: the first center uniformly from a
/// seeded generator, every following center as the point with the largest
/// *squared shortest distance* to the centers chosen so far.
///
/// The maximum-D² rule replaces the classical weighted sampling, so a fixed
/// seed yields fully repeatable centers.
#[derive(Debug, Clone)]
pub struct KMeansPlusPlus {
    /// The number of centers to choose.
    amount: usize,
    /// The seed for the first-center draw.
    seed: u64,
    /// The metric for the shortest-distance computation.
    metric: Metric,
}

impl KMeansPlusPlus {
    /// An initializer for `amount` centers using the squared Euclidean
    /// metric.
    #[must_use]
    pub fn new(amount: usize, seed: u64) -> Self {
        Self {
            amount,
            seed,
            metric: Metric::EuclideanSquare,
        }
    }

    /// Replaces the metric used for the shortest-distance computation.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Chooses centers from the whole dataset.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`] if `data` is empty.
    /// - [`Error::InvalidClusterCount`] if fewer points than centers.
    /// - [`Error::DimensionMismatch`] if the points disagree on arity.
    pub fn initialize(&self, data: &[Point]) -> Result<Vec<Point>> {
        Ok(self
            .initialize_indices(data)?
            .into_iter()
            .map(|index| data[index].clone())
            .collect())
    }

    /// Chooses centers from the points named by `indices`.
    ///
    /// # Errors
    ///
    /// - See [`initialize`](Self::initialize); the cluster-count check is
    ///   against `indices.len()`.
    pub fn initialize_subset(&self, data: &[Point], indices: &[usize]) -> Result<Vec<Point>> {
        if self.amount == 0 {
            return Ok(Vec::new());
        }
        dataset::dimension(data)?;
        let chosen = self.choose(data, indices)?;
        Ok(chosen.into_iter().map(|index| data[index].clone()).collect())
    }

    /// Chooses center *indices* from the whole dataset; the indexed form is
    /// what seeding medoids requires.
    ///
    /// # Errors
    ///
    /// - See [`initialize`](Self::initialize).
    pub fn initialize_indices(&self, data: &[Point]) -> Result<Vec<usize>> {
        if self.amount == 0 {
            return Ok(Vec::new());
        }
        dataset::dimension(data)?;
        let candidates = (0..data.len()).collect::<Vec<_>>();
        self.choose(data, &candidates)
    }

    /// The max-D² selection loop over a candidate index set.
    fn choose(&self, data: &[Point], candidates: &[usize]) -> Result<Vec<usize>> {
        if candidates.len() < self.amount {
            return Err(Error::InvalidClusterCount {
                amount: self.amount,
                size: candidates.len(),
            });
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        let first = candidates[rng.random_range(0..candidates.len())];
        let mut centers = vec![first];

        while centers.len() < self.amount {
            let mut best = candidates[0];
            let mut best_distance = f64::NEG_INFINITY;
            for &candidate in candidates {
                let shortest = centers
                    .iter()
                    .map(|&center| self.metric.distance(&data[candidate], &data[center]))
                    .fold(f64::INFINITY, f64::min);
                let squared = shortest * shortest;
                if squared > best_distance {
                    best_distance = squared;
                    best = candidate;
                }
            }
            centers.push(best);
        }
        Ok(centers)
    }
}

#[cfg(test)]
mod tests {
    use super::KMeansPlusPlus;
    use crate::Error;

    #[test]
    fn farthest_point_rule() {
        let data = vec![vec![0.0], vec![0.1], vec![5.0], vec![10.0]];
        for seed in 0..8 {
            let centers = KMeansPlusPlus::new(2, seed).initialize(&data).map_or_else(|_| unreachable!(), |c| c);
            // Whatever the first draw, the second center is an extreme point.
            assert!(centers[1] == vec![10.0] || centers[1] == vec![0.0]);
        }
    }

    #[test]
    fn too_many_centers() {
        let data = vec![vec![0.0], vec![1.0]];
        assert!(matches!(
            KMeansPlusPlus::new(3, 0).initialize(&data),
            Err(Error::InvalidClusterCount { amount: 3, size: 2 })
        ));
    }
}
