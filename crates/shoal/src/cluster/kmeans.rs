//! K-Means clustering (Lloyd iteration).

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::container::KdTree;
use crate::dataset::{self, Point};
use crate::parallel::{SharedCells, ThreadPool};
use crate::{Error, Metric, Result};

/// K-Means: alternates nearest-center assignment and mean updates until the
/// largest center displacement falls within the tolerance or the iteration
/// cap is hit.
///
/// Assignment runs as a `k = 1` nearest-neighbor query against a k-d tree
/// rebuilt over the current centers each iteration. An empty cluster keeps
/// its previous center; it is reported in the log but never split.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// The starting centers; their count is the `k` of the run.
    initial_centers: Vec<Point>,
    /// Convergence bound on the largest center displacement.
    tolerance: f64,
    /// Hard cap on the number of iterations.
    itermax: usize,
    /// The metric for displacement and the final error sum.
    metric: Metric,
    /// Whether to record the per-iteration evolution in the result.
    observe: bool,
}

impl KMeans {
    /// The default iteration cap.
    pub const DEFAULT_ITERMAX: usize = 100;

    /// A K-Means run from the given centers with the given tolerance.
    #[must_use]
    pub fn new(initial_centers: Vec<Point>, tolerance: f64) -> Self {
        Self {
            initial_centers,
            tolerance,
            itermax: Self::DEFAULT_ITERMAX,
            metric: Metric::default(),
            observe: false,
        }
    }

    /// Replaces the metric used for displacement and error sums.
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

    /// Enables recording of per-iteration centers and clusters.
    #[must_use]
    pub const fn with_observer(mut self, observe: bool) -> Self {
        self.observe = observe;
        self
    }

    /// Runs the iteration on the calling thread.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if there are no centers or more
    ///   centers than points.
    /// - [`Error::InvalidArgument`] if the tolerance is not positive.
    pub fn process(&self, data: &[Point]) -> Result<KMeansResult> {
        self.run(data, None)
    }

    /// As [`process`](Self::process), with per-point assignment fanned out
    /// over the pool. Produces the same result as the sequential run.
    ///
    /// # Errors
    ///
    /// - See [`process`](Self::process).
    pub fn par_process(&self, data: &[Point], pool: &ThreadPool) -> Result<KMeansResult> {
        self.run(data, Some(pool))
    }

    /// The Lloyd loop.
    fn run(&self, data: &[Point], pool: Option<&ThreadPool>) -> Result<KMeansResult> {
        let dimension = self.validate(data)?;

        let mut centers = self.initial_centers.clone();
        let mut assignments = vec![0_usize; data.len()];
        let mut clusters = Vec::new();
        let mut evolution_centers = Vec::new();
        let mut evolution_clusters = Vec::new();

        let mut change = f64::INFINITY;
        let mut iteration = 0;
        while change > self.tolerance && iteration < self.itermax {
            Self::assign(data, &centers, dimension, pool, &mut assignments)?;
            clusters = Self::group(&assignments, centers.len());
            change = self.update_centers(data, &clusters, &mut centers, iteration);
            if self.observe {
                evolution_centers.push(centers.clone());
                evolution_clusters.push(Self::occupied(&clusters));
            }
            iteration += 1;
            log::trace!("kmeans iteration {iteration}: maximum center change {change}");
        }
        log::debug!("kmeans converged after {iteration} iterations (change {change})");

        let wce = self.total_wce(data, &clusters, &centers);
        Ok(KMeansResult {
            clusters: Self::occupied(&clusters),
            centers,
            wce,
            evolution_centers,
            evolution_clusters,
        })
    }

    /// Validates the dataset against the configured centers and tolerance,
    /// returning the shared arity.
    fn validate(&self, data: &[Point]) -> Result<usize> {
        let dimension = dataset::dimension(data)?;
        if self.initial_centers.is_empty() || self.initial_centers.len() > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.initial_centers.len(),
                size: data.len(),
            });
        }
        for (index, center) in self.initial_centers.iter().enumerate() {
            if center.len() != dimension {
                return Err(Error::DimensionMismatch {
                    index,
                    found: center.len(),
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
        Ok(dimension)
    }

    /// Assigns every point to its nearest center via the center tree.
    fn assign(
        data: &[Point],
        centers: &[Point],
        dimension: usize,
        pool: Option<&ThreadPool>,
        assignments: &mut [usize],
    ) -> Result<()> {
        debug_assert_eq!(data.len(), assignments.len());
        let payloads = (0..centers.len()).collect::<Vec<_>>();
        let tree = KdTree::new(centers.to_vec(), payloads)?;
        debug_assert_eq!(tree.dimension(), dimension);

        match pool {
            None => {
                for (point, slot) in data.iter().zip(assignments.iter_mut()) {
                    *slot = Self::nearest_center(&tree, point);
                }
            }
            Some(pool) => {
                let cells = SharedCells::new(assignments);
                pool.parallel_for(0..data.len(), |range| {
                    for index in range {
                        let nearest = Self::nearest_center(&tree, &data[index]);
                        // SAFETY: `parallel_for` hands out disjoint ranges,
                        // so each slot is written by exactly one task.
                        #[allow(unsafe_code)]
                        unsafe {
                            cells.write(index, nearest);
                        }
                    }
                });
            }
        }
        Ok(())
    }

    /// The payload (center index) of the nearest tree node.
    fn nearest_center(tree: &KdTree<usize>, point: &[f64]) -> usize {
        tree.find_k_nearest(point, 1)
            .first()
            .map_or(0, |(_, node)| *node.payload())
    }

    /// Groups point indices by assigned center, keeping empty groups.
    fn group(assignments: &[usize], k: usize) -> ClusterSequence {
        let mut clusters = vec![Vec::new(); k];
        for (index, &center) in assignments.iter().enumerate() {
            clusters[center].push(index);
        }
        clusters
    }

    /// Drops empty groups, preserving center order.
    fn occupied(clusters: &ClusterSequence) -> ClusterSequence {
        clusters.iter().filter(|c| !c.is_empty()).cloned().collect()
    }

    /// Moves every center to the mean of its members, returning the largest
    /// displacement. Empty clusters keep their previous center.
    #[allow(clippy::cast_precision_loss)]
    fn update_centers(&self, data: &[Point], clusters: &ClusterSequence, centers: &mut [Point], iteration: usize) -> f64 {
        let mut change: f64 = 0.0;
        for (index, members) in clusters.iter().enumerate() {
            if members.is_empty() {
                log::debug!("kmeans cluster {index} is empty at iteration {iteration}; center retained");
                continue;
            }
            let mut mean = vec![0.0; centers[index].len()];
            for &member in members {
                for (m, x) in mean.iter_mut().zip(data[member].iter()) {
                    *m += x;
                }
            }
            for m in &mut mean {
                *m /= members.len() as f64;
            }
            change = change.max(self.metric.distance(&centers[index], &mean));
            centers[index] = mean;
        }
        change
    }

    /// The within-cluster sum of errors under the configured metric.
    fn total_wce(&self, data: &[Point], clusters: &ClusterSequence, centers: &[Point]) -> f64 {
        clusters
            .iter()
            .enumerate()
            .map(|(index, members)| {
                members
                    .iter()
                    .map(|&member| self.metric.distance(&data[member], &centers[index]))
                    .sum::<f64>()
            })
            .sum()
    }
}

/// The outcome of a K-Means run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansResult {
    /// The clusters in center order, empty clusters omitted.
    clusters: ClusterSequence,
    /// The final centers, one per initial center; the center of a cluster
    /// that emptied out is its last non-empty position.
    centers: Vec<Point>,
    /// The final within-cluster sum of errors.
    wce: f64,
    /// Per-iteration centers, recorded only under the observer flag.
    evolution_centers: Vec<Vec<Point>>,
    /// Per-iteration clusters, recorded only under the observer flag.
    evolution_clusters: Vec<ClusterSequence>,
}

impl KMeansResult {
    /// The clusters in center order, empty clusters omitted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The final centers.
    #[must_use]
    pub fn centers(&self) -> &[Point] {
        &self.centers
    }

    /// The final within-cluster sum of errors.
    #[must_use]
    pub const fn wce(&self) -> f64 {
        self.wce
    }

    /// Per-iteration centers; empty unless the observer flag was set.
    #[must_use]
    pub fn evolution_centers(&self) -> &[Vec<Point>] {
        &self.evolution_centers
    }

    /// Per-iteration clusters; empty unless the observer flag was set.
    #[must_use]
    pub fn evolution_clusters(&self) -> &[ClusterSequence] {
        &self.evolution_clusters
    }
}
