//! G-Means clustering: K-Means with normality-gated center splitting.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence, KMeans, KMeansResult};
use crate::dataset::{self, Point};
use crate::initializer::KMeansPlusPlus;
use crate::utils::stats;
use crate::{Error, Result};

/// G-Means: repeatedly runs K-Means and tries to split every cluster in
/// two; a split is accepted when the Anderson-Darling statistic of the
/// cluster's points, projected onto the line through the two child centers,
/// rejects the null hypothesis of normality.
///
/// The critical value is adjusted for sample size by
/// `c' = c / (1 + 4/n - 25/n^2)`; samples too small for the adjustment
/// (the divisor is not positive below five points) are never split.
#[derive(Debug, Clone)]
pub struct GMeans {
    /// How many centers to start from.
    k_init: usize,
    /// An optional center budget.
    kmax: Option<usize>,
    /// Convergence tolerance of the inner K-Means runs.
    tolerance: f64,
    /// How many times each candidate split is re-run from different seeds,
    /// keeping the best error sum.
    repeat: usize,
    /// The base seed for initial and split seeding.
    seed: u64,
}

impl GMeans {
    /// Critical values of the Anderson-Darling normality test at the 15%,
    /// 10%, 5%, 2.5%, and 1% significance levels, before size adjustment.
    const CRITICAL_VALUES: [f64; 5] = [0.576, 0.656, 0.787, 0.918, 1.092];

    /// The default number of seeding attempts per candidate split.
    pub const DEFAULT_REPEAT: usize = 3;
    /// The default convergence tolerance of the inner K-Means runs.
    pub const DEFAULT_TOLERANCE: f64 = 0.001;

    /// A G-Means run starting from `k_init` centers chosen by k-means++
    /// under the given seed.
    #[must_use]
    pub const fn new(k_init: usize, seed: u64) -> Self {
        Self {
            k_init,
            kmax: None,
            tolerance: Self::DEFAULT_TOLERANCE,
            repeat: Self::DEFAULT_REPEAT,
            seed,
        }
    }

    /// Caps the number of centers.
    #[must_use]
    pub const fn with_kmax(mut self, kmax: usize) -> Self {
        self.kmax = Some(kmax);
        self
    }

    /// Replaces the number of seeding attempts per candidate split.
    #[must_use]
    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    /// Replaces the inner K-Means tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Runs the split loop.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if `k_init` is zero or exceeds the
    ///   dataset.
    pub fn process(&self, data: &[Point]) -> Result<GMeansResult> {
        dataset::dimension(data)?;
        if self.k_init == 0 || self.k_init > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.k_init,
                size: data.len(),
            });
        }
        let kmax = self.kmax.unwrap_or(usize::MAX);

        let mut centers = KMeansPlusPlus::new(self.k_init, self.seed).initialize(data)?;
        let final_run: KMeansResult;
        loop {
            let refined = KMeans::new(centers.clone(), self.tolerance).process(data)?;
            centers = refined.centers().to_vec();
            if centers.len() >= kmax {
                final_run = refined;
                break;
            }

            let clusters = Self::group(data, &centers);
            let allocated = self.statistical_optimization(data, &clusters, &centers, kmax);
            if allocated.len() == centers.len() {
                final_run = refined;
                break;
            }
            log::debug!("gmeans accepted splits: {} -> {} centers", centers.len(), allocated.len());
            centers = allocated;
        }

        Ok(GMeansResult {
            clusters: final_run.clusters().to_vec(),
            centers: final_run.centers().to_vec(),
            wce: final_run.wce(),
        })
    }

    /// Tries to split every cluster, keeping the parent center whenever
    /// normality cannot be rejected or the budget refuses.
    fn statistical_optimization(
        &self,
        data: &[Point],
        clusters: &ClusterSequence,
        centers: &[Point],
        kmax: usize,
    ) -> Vec<Point> {
        let mut allocated: Vec<Point> = Vec::with_capacity(centers.len());
        for (position, members) in clusters.iter().enumerate() {
            let parent = centers[position].clone();
            let budget_left = kmax.saturating_sub(allocated.len() + (clusters.len() - position));
            if members.len() < 2 || budget_left == 0 {
                allocated.push(parent);
                continue;
            }

            let region = members.iter().map(|&member| data[member].clone()).collect::<Vec<_>>();
            match self.best_two_split(&region, position) {
                Some(children) if children.len() == 2 && Self::rejects_normality(&region, &children) => {
                    allocated.extend(children);
                }
                _ => allocated.push(parent),
            }
        }
        allocated
    }

    /// The centers of the best of `repeat` seeded 2-means runs on a
    /// region, by error sum; `None` when the region cannot be split.
    fn best_two_split(&self, region: &[Point], position: usize) -> Option<Vec<Point>> {
        let mut best: Option<(f64, Vec<Point>, usize)> = None;
        for attempt in 0..self.repeat {
            let seed = self
                .seed
                .wrapping_add((attempt as u64) << 8)
                .wrapping_add(position as u64);
            let Ok(seeds) = KMeansPlusPlus::new(2, seed).initialize(region) else {
                return None;
            };
            let Ok(result) = KMeans::new(seeds, self.tolerance).process(region) else {
                return None;
            };
            if best.as_ref().map_or(true, |(wce, _, _)| result.wce() < *wce) {
                best = Some((result.wce(), result.centers().to_vec(), result.clusters().len()));
            }
        }
        best.and_then(|(_, centers, produced)| (produced == 2).then_some(centers))
    }

    /// Projects the region onto the line through the child centers and
    /// tests the projection for normality.
    fn rejects_normality(region: &[Point], children: &[Point]) -> bool {
        let direction = children[0]
            .iter()
            .zip(children[1].iter())
            .map(|(a, b)| a - b)
            .collect::<Vec<_>>();
        let norm_sq = direction.iter().map(|v| v * v).sum::<f64>();
        if norm_sq == 0.0 {
            return false;
        }

        let projection = region
            .iter()
            .map(|point| point.iter().zip(direction.iter()).map(|(x, v)| x * v).sum::<f64>() / norm_sq)
            .collect::<Vec<_>>();

        #[allow(clippy::cast_precision_loss)]
        let n = projection.len() as f64;
        let divisor = 1.0 + 4.0 / n - 25.0 / (n * n);
        if divisor <= 0.0 {
            return false;
        }
        let critical = Self::CRITICAL_VALUES[0] / divisor;
        let statistic = stats::anderson_darling(&projection);
        log::trace!("gmeans split gate: statistic {statistic} against critical {critical}");
        statistic >= critical
    }

    /// Groups points by nearest center, keeping empty groups aligned with
    /// the center order.
    fn group(data: &[Point], centers: &[Point]) -> ClusterSequence {
        let mut clusters = vec![Vec::new(); centers.len()];
        for (index, point) in data.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (position, center) in centers.iter().enumerate() {
                let distance = shoal_metrics::euclidean_sq(point, center);
                if distance < best_distance {
                    best_distance = distance;
                    best = position;
                }
            }
            clusters[best].push(index);
        }
        clusters
    }
}

/// The outcome of a G-Means run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GMeansResult {
    /// The clusters in center order, empty clusters omitted.
    clusters: ClusterSequence,
    /// The final centers.
    centers: Vec<Point>,
    /// The final within-cluster sum of errors.
    wce: f64,
}

impl GMeansResult {
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
}
