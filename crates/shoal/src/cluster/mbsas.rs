//! MBSAS (modified basic sequential algorithmic scheme) clustering.

use super::bsas::{find_nearest_cluster, update_representative, BsasResult};
use super::ClusterSequence;
use crate::dataset::{self, Point};
use crate::{Error, Metric, Result};

/// MBSAS: the two-pass variant of BSAS. The first pass only *opens*
/// clusters (by the BSAS rule, without assigning to existing ones); the
/// second pass assigns every non-seed point to the cluster with the nearest
/// representative, updating the representatives as it goes.
///
/// Splitting the passes removes BSAS's sensitivity to the interleaving of
/// far-apart points early in the sequence.
#[derive(Debug, Clone)]
pub struct Mbsas {
    /// Upper bound on the number of clusters.
    amount: usize,
    /// Dissimilarity threshold for opening a new cluster.
    threshold: f64,
    /// The metric against cluster representatives.
    metric: Metric,
}

impl Mbsas {
    /// An MBSAS run allowing up to `amount` clusters at the given
    /// threshold. The threshold is compared against Euclidean distances by
    /// default.
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

    /// Runs both passes.
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
        let mut representatives: Vec<Point> = vec![data[0].clone()];
        let mut seed = vec![false; data.len()];
        seed[0] = true;

        for (index, point) in data.iter().enumerate().skip(1) {
            let (_, distance) = find_nearest_cluster(&self.metric, point, &representatives);
            if distance > self.threshold && clusters.len() < self.amount {
                clusters.push(vec![index]);
                representatives.push(point.clone());
                seed[index] = true;
            }
        }

        for (index, point) in data.iter().enumerate() {
            if seed[index] {
                continue;
            }
            let (nearest, _) = find_nearest_cluster(&self.metric, point, &representatives);
            clusters[nearest].push(index);
            update_representative(&mut representatives[nearest], point, clusters.len());
        }

        Ok(BsasResult::new(clusters, representatives))
    }
}
