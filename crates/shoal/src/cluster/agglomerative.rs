//! Agglomerative hierarchical clustering.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, Point};
use crate::{Error, Result};

/// How the distance between two clusters is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// The minimum pairwise member distance.
    Single,
    /// The maximum pairwise member distance.
    Complete,
    /// The mean of all pairwise member distances.
    Average,
    /// The distance between the cluster centroids.
    Centroid,
}

/// Agglomerative clustering: every point starts as a singleton; each step
/// merges the pair of live clusters at minimum distance under the chosen
/// linkage, until the target count remains. Distances are Euclidean.
#[derive(Debug, Clone)]
pub struct Agglomerative {
    /// The target cluster count.
    amount_clusters: usize,
    /// The inter-cluster distance rule.
    linkage: Linkage,
}

impl Agglomerative {
    /// An agglomerative run merging down to `amount_clusters` under the
    /// given linkage.
    #[must_use]
    pub const fn new(amount_clusters: usize, linkage: Linkage) -> Self {
        Self {
            amount_clusters,
            linkage,
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
    pub fn process(&self, data: &[Point]) -> Result<AgglomerativeResult> {
        dataset::dimension(data)?;
        if self.amount_clusters == 0 || self.amount_clusters > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.amount_clusters,
                size: data.len(),
            });
        }

        let mut clusters: ClusterSequence = (0..data.len()).map(|index| vec![index]).collect();
        let mut centroids = data.to_vec();

        while clusters.len() > self.amount_clusters {
            let (a, b) = self.nearest_pair(data, &clusters, &centroids);
            let merged = clusters.remove(b);
            let merged_centroid = centroids.remove(b);
            clusters[a].extend(merged);
            clusters[a].sort_unstable();
            if self.linkage == Linkage::Centroid {
                centroids[a] = Self::centroid_of(data, &clusters[a]);
            } else {
                drop(merged_centroid);
            }
        }

        Ok(AgglomerativeResult { clusters })
    }

    /// The pair of positions at minimum linkage distance; ties break on
    /// the first pair in scan order.
    fn nearest_pair(&self, data: &[Point], clusters: &ClusterSequence, centroids: &[Point]) -> (usize, usize) {
        let mut best = (0, 1);
        let mut best_distance = f64::INFINITY;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let distance = match self.linkage {
                    Linkage::Centroid => shoal_metrics::euclidean(&centroids[a], &centroids[b]),
                    _ => self.member_linkage(data, &clusters[a], &clusters[b]),
                };
                if distance < best_distance {
                    best_distance = distance;
                    best = (a, b);
                }
            }
        }
        best
    }

    /// Single, complete, or average linkage over member pairs.
    #[allow(clippy::cast_precision_loss)]
    fn member_linkage(&self, data: &[Point], a: &Cluster, b: &Cluster) -> f64 {
        let pairs = a.iter().flat_map(|&i| b.iter().map(move |&j| shoal_metrics::euclidean(&data[i], &data[j])));
        match self.linkage {
            Linkage::Single => pairs.fold(f64::INFINITY, f64::min),
            Linkage::Complete => pairs.fold(f64::NEG_INFINITY, f64::max),
            Linkage::Average => pairs.sum::<f64>() / (a.len() * b.len()) as f64,
            Linkage::Centroid => unreachable!("centroid linkage is dispatched separately"),
        }
    }

    /// The mean of a cluster's members.
    #[allow(clippy::cast_precision_loss)]
    fn centroid_of(data: &[Point], members: &Cluster) -> Point {
        let dimension = data[members[0]].len();
        let mut centroid = vec![0.0; dimension];
        for &member in members {
            for (slot, x) in centroid.iter_mut().zip(data[member].iter()) {
                *slot += x;
            }
        }
        for slot in &mut centroid {
            *slot /= members.len() as f64;
        }
        centroid
    }
}

/// The outcome of an agglomerative run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgglomerativeResult {
    /// The surviving clusters, members sorted.
    clusters: ClusterSequence,
}

impl AgglomerativeResult {
    /// The surviving clusters, members sorted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }
}
