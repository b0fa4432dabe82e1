//! CURE hierarchical clustering with shrunken representatives.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, Point};
use crate::{Error, Result};

/// A live cluster of the merge loop.
struct CureCluster {
    /// Member point indices, kept sorted.
    points: Vec<usize>,
    /// The mean of the members.
    mean: Point,
    /// Up to `representatives` points, shrunk toward the mean.
    representatives: Vec<Point>,
    /// Position of the nearest other cluster.
    closest: usize,
    /// Distance to the nearest other cluster.
    closest_distance: f64,
}

/// CURE: agglomerates clusters represented by a handful of well-scattered
/// points shrunk toward the cluster mean.
///
/// The merge loop pops the globally nearest pair (distance between two
/// clusters is the minimum distance over their representative pairs),
/// merges it, rebuilds the merged cluster's representatives greedily by the
/// max-min rule, and repairs every cached nearest-cluster entry that
/// referenced either input. It stops when `amount_clusters` remain.
#[derive(Debug, Clone)]
pub struct Cure {
    /// The target cluster count.
    amount_clusters: usize,
    /// Representatives kept per cluster.
    representatives: usize,
    /// Shrink coefficient toward the mean, in `[0, 1]`.
    compression: f64,
}

impl Cure {
    /// A CURE run merging down to `amount_clusters`, with the given
    /// representative budget and shrink coefficient.
    #[must_use]
    pub const fn new(amount_clusters: usize, representatives: usize, compression: f64) -> Self {
        Self {
            amount_clusters,
            representatives,
            compression,
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
    /// - [`Error::InvalidArgument`] if the representative budget is zero or
    ///   the shrink coefficient leaves `[0, 1]`.
    pub fn process(&self, data: &[Point]) -> Result<CureResult> {
        dataset::dimension(data)?;
        if self.amount_clusters == 0 || self.amount_clusters > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.amount_clusters,
                size: data.len(),
            });
        }
        if self.representatives == 0 {
            return Err(Error::InvalidArgument("representative budget must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.compression) {
            return Err(Error::InvalidArgument(format!(
                "shrink coefficient must be in [0, 1], got {}",
                self.compression
            )));
        }

        let mut clusters = data
            .iter()
            .enumerate()
            .map(|(index, point)| CureCluster {
                points: vec![index],
                mean: point.clone(),
                representatives: vec![point.clone()],
                closest: 0,
                closest_distance: f64::INFINITY,
            })
            .collect::<Vec<_>>();
        for position in 0..clusters.len() {
            Self::repair_closest(&mut clusters, position);
        }

        while clusters.len() > self.amount_clusters {
            let first = Self::nearest_pair(&clusters);
            let second = clusters[first].closest;
            let (a, b) = (first.min(second), first.max(second));

            let merged = self.merge(data, &clusters[a], &clusters[b]);
            let removed_distance = clusters[first].closest_distance;
            clusters.remove(b);
            clusters.remove(a);
            clusters.push(merged);
            log::trace!(
                "cure merged two clusters at distance {removed_distance}; {} remain",
                clusters.len()
            );

            // Repair caches: positions after the removals shift down, and
            // entries that referenced either input are stale.
            let merged_position = clusters.len() - 1;
            for position in 0..merged_position {
                let closest = clusters[position].closest;
                if closest == a || closest == b {
                    Self::repair_closest(&mut clusters, position);
                } else {
                    let shifted = closest - usize::from(closest > a) - usize::from(closest > b);
                    clusters[position].closest = shifted;
                    let to_merged = Self::cluster_distance(&clusters[position], &clusters[merged_position]);
                    if to_merged < clusters[position].closest_distance {
                        clusters[position].closest = merged_position;
                        clusters[position].closest_distance = to_merged;
                    }
                }
            }
            Self::repair_closest(&mut clusters, merged_position);
        }

        Ok(CureResult {
            clusters: clusters.iter().map(|c| c.points.clone()).collect(),
            representors: clusters.iter().map(|c| c.representatives.clone()).collect(),
            means: clusters.iter().map(|c| c.mean.clone()).collect(),
        })
    }

    /// The position holding the smallest cached nearest distance; ties
    /// break on position.
    fn nearest_pair(clusters: &[CureCluster]) -> usize {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (position, cluster) in clusters.iter().enumerate() {
            if cluster.closest_distance < best_distance {
                best_distance = cluster.closest_distance;
                best = position;
            }
        }
        best
    }

    /// Rebuilds one cluster's nearest-cluster cache by a full scan.
    fn repair_closest(clusters: &mut [CureCluster], position: usize) {
        let mut closest = position;
        let mut closest_distance = f64::INFINITY;
        for other in 0..clusters.len() {
            if other == position {
                continue;
            }
            let distance = Self::cluster_distance(&clusters[position], &clusters[other]);
            if distance < closest_distance {
                closest_distance = distance;
                closest = other;
            }
        }
        clusters[position].closest = closest;
        clusters[position].closest_distance = closest_distance;
    }

    /// The minimum Euclidean distance over the representative pairs.
    fn cluster_distance(a: &CureCluster, b: &CureCluster) -> f64 {
        let mut distance = f64::INFINITY;
        for ra in &a.representatives {
            for rb in &b.representatives {
                distance = distance.min(shoal_metrics::euclidean(ra, rb));
            }
        }
        distance
    }

    /// Builds the merged cluster: size-weighted mean, max-min scattered
    /// representatives, shrink toward the mean.
    #[allow(clippy::cast_precision_loss)]
    fn merge(&self, data: &[Point], a: &CureCluster, b: &CureCluster) -> CureCluster {
        let mut points = a.points.clone();
        points.extend(b.points.iter().copied());
        points.sort_unstable();

        let (na, nb) = (a.points.len() as f64, b.points.len() as f64);
        let mean = a
            .mean
            .iter()
            .zip(b.mean.iter())
            .map(|(ma, mb)| (na * ma + nb * mb) / (na + nb))
            .collect::<Vec<_>>();

        // Greedy max-min scatter over the merged members: the first pick is
        // the member farthest from the mean, each following pick maximizes
        // its distance to the picks so far.
        let budget = self.representatives.min(points.len());
        let mut chosen: Vec<usize> = Vec::with_capacity(budget);
        for round in 0..budget {
            let mut best = None::<(usize, f64)>;
            for &candidate in &points {
                if chosen.contains(&candidate) {
                    continue;
                }
                let score = if round == 0 {
                    shoal_metrics::euclidean(&data[candidate], &mean)
                } else {
                    chosen
                        .iter()
                        .map(|&pick| shoal_metrics::euclidean(&data[candidate], &data[pick]))
                        .fold(f64::INFINITY, f64::min)
                };
                if best.map_or(true, |(_, b)| score > b) {
                    best = Some((candidate, score));
                }
            }
            if let Some((candidate, _)) = best {
                chosen.push(candidate);
            }
        }

        let representatives = chosen
            .into_iter()
            .map(|candidate| {
                data[candidate]
                    .iter()
                    .zip(mean.iter())
                    .map(|(x, m)| x + self.compression * (m - x))
                    .collect()
            })
            .collect();

        CureCluster {
            points,
            mean,
            representatives,
            closest: 0,
            closest_distance: f64::INFINITY,
        }
    }
}

/// The outcome of a CURE run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CureResult {
    /// The surviving clusters, members sorted.
    clusters: ClusterSequence,
    /// Per cluster, its shrunken representative points.
    representors: Vec<Vec<Point>>,
    /// Per cluster, the mean of its members.
    means: Vec<Point>,
}

impl CureResult {
    /// The surviving clusters, members sorted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Per cluster, its shrunken representative points.
    #[must_use]
    pub fn representors(&self) -> &[Vec<Point>] {
        &self.representors
    }

    /// Per cluster, the mean of its members.
    #[must_use]
    pub fn means(&self) -> &[Point] {
        &self.means
    }
}
