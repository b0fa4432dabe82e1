//! Silhouette scoring of a finished partition.

use serde::{Deserialize, Serialize};

use super::ClusterSequence;
use crate::dataset::{self, DistanceMatrix, Point};
use crate::parallel::{SharedCells, ThreadPool};
use crate::{Error, Metric, Result};

/// Computes the silhouette score of every clustered point:
/// `s = (b - a) / max(a, b)`, where `a` is the mean dissimilarity to the
/// point's own cluster and `b` the best mean dissimilarity to any other
/// cluster. Scores always land in `[-1, 1]`.
///
/// Input modes: points with a metric, or a precomputed distance matrix.
#[derive(Debug, Clone, Default)]
pub struct Silhouette {
    /// The dissimilarity for the points mode.
    metric: Metric,
}

impl Silhouette {
    /// A scorer under the default (squared Euclidean) dissimilarity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dissimilarity used in the points mode.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Scores a partition of `data`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidArgument`] for an empty cluster sequence or an
    ///   out-of-range member index.
    pub fn process(&self, data: &[Point], clusters: &ClusterSequence) -> Result<SilhouetteResult> {
        dataset::dimension(data)?;
        Self::check_clusters(clusters, data.len())?;
        let scores = self.run(data.len(), clusters, None, &|i, j| self.metric.distance(&data[i], &data[j]));
        Ok(SilhouetteResult { scores })
    }

    /// Scores a partition of the points behind a distance matrix.
    ///
    /// # Errors
    ///
    /// - See [`process`](Self::process), minus the dataset checks.
    pub fn process_matrix(&self, matrix: &DistanceMatrix, clusters: &ClusterSequence) -> Result<SilhouetteResult> {
        Self::check_clusters(clusters, matrix.size())?;
        let scores = self.run(matrix.size(), clusters, None, &|i, j| matrix.get(i, j));
        Ok(SilhouetteResult { scores })
    }

    /// As [`process`](Self::process), scoring points in parallel chunks.
    /// Produces the same scores as the sequential run.
    ///
    /// # Errors
    ///
    /// - See [`process`](Self::process).
    pub fn par_process(&self, data: &[Point], clusters: &ClusterSequence, pool: &ThreadPool) -> Result<SilhouetteResult> {
        dataset::dimension(data)?;
        Self::check_clusters(clusters, data.len())?;
        let scores = self.run(data.len(), clusters, Some(pool), &|i, j| {
            self.metric.distance(&data[i], &data[j])
        });
        Ok(SilhouetteResult { scores })
    }

    /// Rejects empty sequences and out-of-range members.
    fn check_clusters(clusters: &ClusterSequence, size: usize) -> Result<()> {
        if clusters.is_empty() {
            return Err(Error::InvalidArgument("no clusters to score".to_string()));
        }
        for cluster in clusters {
            if let Some(&member) = cluster.iter().find(|&&member| member >= size) {
                return Err(Error::InvalidArgument(format!(
                    "member index {member} is out of range for {size} points"
                )));
            }
        }
        Ok(())
    }

    /// Scores every clustered point; unclustered points keep a zero score.
    fn run(
        &self,
        n: usize,
        clusters: &ClusterSequence,
        pool: Option<&ThreadPool>,
        dissimilarity: &(dyn Fn(usize, usize) -> f64 + Sync),
    ) -> Vec<f64> {
        let mut owner = vec![usize::MAX; n];
        for (position, cluster) in clusters.iter().enumerate() {
            for &member in cluster {
                owner[member] = position;
            }
        }

        let mut scores = vec![0.0; n];
        match pool {
            None => {
                for index in 0..n {
                    if owner[index] != usize::MAX {
                        scores[index] = Self::score_point(index, owner[index], clusters, dissimilarity);
                    }
                }
            }
            Some(pool) => {
                let cells = SharedCells::new(&mut scores);
                pool.parallel_for(0..n, |range| {
                    for index in range {
                        if owner[index] != usize::MAX {
                            let score = Self::score_point(index, owner[index], clusters, dissimilarity);
                            // SAFETY: `parallel_for` hands out disjoint
                            // ranges, so each slot is written once.
                            #[allow(unsafe_code)]
                            unsafe {
                                cells.write(index, score);
                            }
                        }
                    }
                });
            }
        }
        scores
    }

    /// One point's silhouette from its cluster position.
    #[allow(clippy::cast_precision_loss)]
    fn score_point(
        index: usize,
        position: usize,
        clusters: &ClusterSequence,
        dissimilarity: &(dyn Fn(usize, usize) -> f64 + Sync),
    ) -> f64 {
        let own = &clusters[position];
        let within = if own.len() < 2 {
            0.0
        } else {
            own.iter()
                .filter(|&&member| member != index)
                .map(|&member| dissimilarity(index, member))
                .sum::<f64>()
                / (own.len() - 1) as f64
        };

        let mut neighbor = f64::INFINITY;
        for (other_position, other) in clusters.iter().enumerate() {
            if other_position == position || other.is_empty() {
                continue;
            }
            let mean = other.iter().map(|&member| dissimilarity(index, member)).sum::<f64>() / other.len() as f64;
            neighbor = neighbor.min(mean);
        }
        if !neighbor.is_finite() {
            return 0.0;
        }

        let widest = within.max(neighbor);
        if widest > 0.0 {
            (neighbor - within) / widest
        } else {
            0.0
        }
    }
}

/// The outcome of a silhouette scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilhouetteResult {
    /// One score per point, zero for points outside every cluster.
    scores: Vec<f64>,
}

impl SilhouetteResult {
    /// One score per point, zero for points outside every cluster.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// The mean score; meaningful when the partition covers every point.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_score(&self) -> f64 {
        if self.scores.is_empty() {
            0.0
        } else {
            self.scores.iter().sum::<f64>() / self.scores.len() as f64
        }
    }
}
