//! K-Medians clustering.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, Point};
use crate::utils::stats;
use crate::{Error, Metric, Result};

/// K-Medians: as K-Means, but each center moves to the component-wise
/// median of its members, which makes the centers robust to outliers.
///
/// Assignment is a brute-force nearest-median scan under the configured
/// metric. Clusters that empty out are dropped from the output.
#[derive(Debug, Clone)]
pub struct KMedians {
    /// The starting medians; their count is the `k` of the run.
    initial_medians: Vec<Point>,
    /// Convergence bound on the largest median displacement.
    tolerance: f64,
    /// Hard cap on the number of iterations.
    itermax: usize,
    /// The metric for assignment and displacement.
    metric: Metric,
}

impl KMedians {
    /// The default iteration cap.
    pub const DEFAULT_ITERMAX: usize = 100;

    /// A K-Medians run from the given medians with the given tolerance.
    #[must_use]
    pub fn new(initial_medians: Vec<Point>, tolerance: f64) -> Self {
        Self {
            initial_medians,
            tolerance,
            itermax: Self::DEFAULT_ITERMAX,
            metric: Metric::default(),
        }
    }

    /// Replaces the metric used for assignment and displacement.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Replaces the iteration cap.
    #[must_use]
    pub const fn with_itermax(mut self, itermax: usize) -> Self {
        self.itermax = itermax;
        self
    }

    /// Runs the iteration.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if there are no medians or more
    ///   medians than points.
    /// - [`Error::InvalidArgument`] if the tolerance is not positive.
    pub fn process(&self, data: &[Point]) -> Result<KMediansResult> {
        let dimension = dataset::dimension(data)?;
        if self.initial_medians.is_empty() || self.initial_medians.len() > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.initial_medians.len(),
                size: data.len(),
            });
        }
        for (index, median) in self.initial_medians.iter().enumerate() {
            if median.len() != dimension {
                return Err(Error::DimensionMismatch {
                    index,
                    found: median.len(),
                    expected: dimension,
                });
            }
        }
        if self.tolerance <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }

        let mut medians = self.initial_medians.clone();
        let mut clusters = Vec::new();
        let mut change = f64::INFINITY;
        let mut iteration = 0;
        while change > self.tolerance && iteration < self.itermax {
            clusters = self.update_clusters(data, &medians);
            change = self.update_medians(data, &clusters, &mut medians, dimension);
            iteration += 1;
            log::trace!("kmedians iteration {iteration}: maximum median change {change}");
        }

        Ok(KMediansResult {
            clusters: clusters.into_iter().filter(|c| !c.is_empty()).collect(),
            medians,
        })
    }

    /// Assigns every point to the nearest median, keeping empty groups.
    fn update_clusters(&self, data: &[Point], medians: &[Point]) -> ClusterSequence {
        let mut clusters = vec![Vec::new(); medians.len()];
        for (index, point) in data.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (m, median) in medians.iter().enumerate() {
                let distance = self.metric.distance(point, median);
                if distance < best_distance {
                    best_distance = distance;
                    best = m;
                }
            }
            clusters[best].push(index);
        }
        clusters
    }

    /// Moves every median to the component-wise median of its members,
    /// returning the largest displacement.
    fn update_medians(&self, data: &[Point], clusters: &ClusterSequence, medians: &mut [Point], dimension: usize) -> f64 {
        let mut change: f64 = 0.0;
        for (index, members) in clusters.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let mut median = Vec::with_capacity(dimension);
            let mut column = Vec::with_capacity(members.len());
            for j in 0..dimension {
                column.clear();
                column.extend(members.iter().map(|&member| data[member][j]));
                median.push(stats::median(&column));
            }
            change = change.max(self.metric.distance(&medians[index], &median));
            medians[index] = median;
        }
        change
    }
}

/// The outcome of a K-Medians run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMediansResult {
    /// The clusters in median order, empty clusters omitted.
    clusters: ClusterSequence,
    /// The final medians.
    medians: Vec<Point>,
}

impl KMediansResult {
    /// The clusters in median order, empty clusters omitted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The final medians.
    #[must_use]
    pub fn medians(&self) -> &[Point] {
        &self.medians
    }
}
