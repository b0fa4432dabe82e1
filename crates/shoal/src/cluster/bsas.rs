//! BSAS (basic sequential algorithmic scheme) clustering.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, Point};
use crate::{Error, Metric, Result};

/// BSAS: a single pass over the dataset. The first point seeds cluster
/// zero; every following point either joins the cluster with the nearest
/// representative or, if that distance exceeds the threshold and the
/// cluster budget allows, opens a new cluster with itself as
/// representative.
#[derive(Debug, Clone)]
pub struct Bsas {
    /// Upper bound on the number of clusters.
    amount: usize,
    /// Dissimilarity threshold for opening a new cluster.
    threshold: f64,
    /// The metric against cluster representatives.
    metric: Metric,
}

impl Bsas {
    /// A BSAS run allowing up to `amount` clusters at the given threshold.
    /// The threshold is compared against Euclidean distances by default.
    #[must_use]
    pub const fn new(amount: usize, threshold: f64) -> Self {
        Self {
            amount,
            threshold,
            metric: Metric::Euclidean,
        }
    }

    /// Replaces the metric used against representatives.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Runs the single pass.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if the cluster budget is zero.
    /// - [`Error::InvalidArgument`] if the threshold is negative.
    pub fn process(&self, data: &[Point]) -> Result<BsasResult> {
        dataset::dimension(data)?;
        if self.amount == 0 {
            return Err(Error::InvalidClusterCount {
                amount: 0,
                size: data.len(),
            });
        }
        if self.threshold < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "threshold must be non-negative, got {}",
                self.threshold
            )));
        }

        let mut clusters: ClusterSequence = vec![vec![0]];
        let mut representatives = vec![data[0].clone()];

        for (index, point) in data.iter().enumerate().skip(1) {
            let (nearest, distance) = find_nearest_cluster(&self.metric, point, &representatives);
            if distance > self.threshold && clusters.len() < self.amount {
                clusters.push(vec![index]);
                representatives.push(point.clone());
            } else {
                clusters[nearest].push(index);
                update_representative(&mut representatives[nearest], point, clusters.len());
            }
        }

        Ok(BsasResult {
            clusters,
            representatives,
        })
    }
}

/// The index and distance of the cluster whose representative is nearest to
/// `point`. Requires at least one representative.
pub(super) fn find_nearest_cluster(metric: &Metric, point: &[f64], representatives: &[Point]) -> (usize, f64) {
    let mut nearest = 0;
    let mut nearest_distance = f64::INFINITY;
    for (index, representative) in representatives.iter().enumerate() {
        let distance = metric.distance(point, representative);
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = index;
        }
    }
    (nearest, nearest_distance)
}

/// Folds `point` into a representative by a running mean.
///
/// The mean is weighted by `clusters - 1` and divided by `clusters`, the
/// *number of clusters currently open*, independent of the receiving
/// cluster's own cardinality. Callers relying on a per-cluster running mean
/// should note this; the behavior is pinned by tests and discussed in
/// DESIGN.md.
pub(super) fn update_representative(representative: &mut Point, point: &[f64], clusters: usize) {
    #[allow(clippy::cast_precision_loss)]
    let weight = clusters as f64;
    for (slot, x) in representative.iter_mut().zip(point.iter()) {
        *slot = ((weight - 1.0) * *slot + x) / weight;
    }
}

/// The outcome of a BSAS, MBSAS, or TTSAS run: the clusters and one
/// representative point per cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BsasResult {
    /// The clusters, in the order they were opened.
    clusters: ClusterSequence,
    /// One representative per cluster, kept as a running mean.
    representatives: Vec<Point>,
}

impl BsasResult {
    /// Assembles a result; shared by the whole sequential family.
    pub(super) const fn new(clusters: ClusterSequence, representatives: Vec<Point>) -> Self {
        Self {
            clusters,
            representatives,
        }
    }

    /// The clusters, in the order they were opened.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// One representative per cluster.
    #[must_use]
    pub fn representatives(&self) -> &[Point] {
        &self.representatives
    }
}
