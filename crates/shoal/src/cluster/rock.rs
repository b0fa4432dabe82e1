//! ROCK hierarchical clustering by links.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::container::Adjacency;
use crate::dataset::{self, Point};
use crate::{Error, Result};

/// ROCK: agglomerates by *links* (shared neighbors) instead of raw
/// distances, which suits data where closeness is better captured by
/// common company than by geometry.
///
/// A neighbor bit-matrix is built once: `i ~ j` iff `d(i, j) < radius`.
/// The link count of two clusters sums, over all cross pairs, the number
/// of common neighbors of the pair. The merge loop takes the pair with the
/// highest goodness (links normalized by the expected cross-link mass
/// under the exponent `1 + 2 f(t)` with `f(t) = (1 - t) / (1 + t)`), and
/// stops at the target count or as soon as no pair shares a link.
#[derive(Debug, Clone)]
pub struct Rock {
    /// Neighborhood radius for the adjacency matrix.
    radius: f64,
    /// The target cluster count.
    amount_clusters: usize,
    /// The normalization parameter `t` of the goodness exponent.
    threshold: f64,
}

impl Rock {
    /// A ROCK run with the given neighborhood radius, target count, and
    /// normalization parameter.
    #[must_use]
    pub const fn new(radius: f64, amount_clusters: usize, threshold: f64) -> Self {
        Self {
            radius,
            amount_clusters,
            threshold,
        }
    }

    /// Runs the merge loop.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if the target is zero or exceeds
    ///   the dataset.
    /// - [`Error::InvalidArgument`] if the radius is negative or the
    ///   normalization parameter leaves `[0, 1)`.
    pub fn process(&self, data: &[Point]) -> Result<RockResult> {
        dataset::dimension(data)?;
        if self.amount_clusters == 0 || self.amount_clusters > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.amount_clusters,
                size: data.len(),
            });
        }
        if self.radius < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "radius must be non-negative, got {}",
                self.radius
            )));
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(Error::InvalidArgument(format!(
                "normalization parameter must be in [0, 1), got {}",
                self.threshold
            )));
        }

        let adjacency = self.create_adjacency(data);
        let exponent = 1.0 + 2.0 * ((1.0 - self.threshold) / (1.0 + self.threshold));

        let mut clusters: ClusterSequence = (0..data.len()).map(|index| vec![index]).collect();
        while clusters.len() > self.amount_clusters {
            match Self::best_pair(&clusters, &adjacency, exponent) {
                Some((a, b)) => {
                    let merged = clusters.remove(b);
                    clusters[a].extend(merged);
                    clusters[a].sort_unstable();
                }
                None => {
                    log::debug!("rock stopped early at {} clusters: no linked pair remains", clusters.len());
                    break;
                }
            }
        }

        Ok(RockResult { clusters })
    }

    /// The neighbor matrix: strict-radius Euclidean balls, symmetric.
    /// Every point is its own neighbor, so adjacent points always share at
    /// least their own company.
    fn create_adjacency(&self, data: &[Point]) -> Adjacency {
        let mut adjacency = Adjacency::bit_matrix(data.len());
        for i in 0..data.len() {
            adjacency.connect(i, i);
            for j in 0..i {
                if shoal_metrics::euclidean(&data[i], &data[j]) < self.radius {
                    adjacency.connect_undirected(i, j);
                }
            }
        }
        adjacency
    }

    /// The pair of cluster positions with maximum goodness among pairs with
    /// a positive link count; `None` when no pair shares a link.
    fn best_pair(clusters: &ClusterSequence, adjacency: &Adjacency, exponent: f64) -> Option<(usize, usize)> {
        let mut best = None::<(f64, usize, usize)>;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let links = Self::links(&clusters[a], &clusters[b], adjacency);
                if links == 0 {
                    continue;
                }
                let goodness = Self::goodness(links, clusters[a].len(), clusters[b].len(), exponent);
                if best.map_or(true, |(g, _, _)| goodness > g) {
                    best = Some((goodness, a, b));
                }
            }
        }
        best.map(|(_, a, b)| (a, b))
    }

    /// Links between two clusters: common neighbors summed over all cross
    /// pairs.
    fn links(a: &Cluster, b: &Cluster, adjacency: &Adjacency) -> usize {
        let mut links = 0;
        for &i in a {
            for &j in b {
                links += (0..adjacency.size())
                    .filter(|&k| adjacency.has_connection(i, k) && adjacency.has_connection(j, k))
                    .count();
            }
        }
        links
    }

    /// The merge criterion: links over the size-dependent normalization.
    #[allow(clippy::cast_precision_loss)]
    fn goodness(links: usize, size_a: usize, size_b: usize, exponent: f64) -> f64 {
        let (na, nb) = (size_a as f64, size_b as f64);
        let divisor = libm::pow(na + nb, exponent) - libm::pow(na, exponent) - libm::pow(nb, exponent);
        links as f64 / divisor
    }
}

/// The outcome of a ROCK run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RockResult {
    /// The surviving clusters, members sorted.
    clusters: ClusterSequence,
}

impl RockResult {
    /// The surviving clusters, members sorted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }
}
