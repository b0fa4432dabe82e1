//! X-Means clustering: K-Means with BIC-gated center splitting.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence, KMeans};
use crate::dataset::{self, Point};
use crate::initializer::KMeansPlusPlus;
use crate::{Error, Result};

/// X-Means: starting from the initial centers, repeatedly runs K-Means and
/// then tries to split every cluster in two; a split is accepted only when
/// the Bayesian Information Criterion of the two-center model beats the
/// one-center model on that cluster's points. Stops when no split is
/// accepted or the center budget `kmax` is reached.
///
/// The BIC uses a spherical-Gaussian likelihood with a pooled variance
/// estimate over the scored model's clusters.
#[derive(Debug, Clone)]
pub struct XMeans {
    /// The starting centers.
    initial_centers: Vec<Point>,
    /// The center budget.
    kmax: usize,
    /// Convergence tolerance of the inner K-Means runs.
    tolerance: f64,
    /// How many times each candidate split is re-run from different seeds,
    /// keeping the best error sum.
    repeat: usize,
    /// The base seed for the split seeding.
    seed: u64,
}

impl XMeans {
    /// An X-Means run from the given centers, with a center budget and
    /// inner tolerance.
    #[must_use]
    pub fn new(initial_centers: Vec<Point>, kmax: usize, tolerance: f64) -> Self {
        Self {
            initial_centers,
            kmax,
            tolerance,
            repeat: 1,
            seed: 0,
        }
    }

    /// Replaces the number of seeding attempts per candidate split.
    #[must_use]
    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    /// Replaces the base seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Runs the split loop.
    ///
    /// When the initial centers already exhaust `kmax`, the input center
    /// set is returned unchanged, with the points assigned to it.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if there are no centers or more
    ///   centers than points.
    /// - [`Error::InvalidArgument`] if `kmax` is below the initial center
    ///   count or the tolerance is not positive.
    pub fn process(&self, data: &[Point]) -> Result<XMeansResult> {
        dataset::dimension(data)?;
        if self.initial_centers.is_empty() || self.initial_centers.len() > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.initial_centers.len(),
                size: data.len(),
            });
        }
        if self.kmax < self.initial_centers.len() {
            return Err(Error::InvalidArgument(format!(
                "kmax {} is below the initial center count {}",
                self.kmax,
                self.initial_centers.len()
            )));
        }

        let mut centers = self.initial_centers.clone();
        loop {
            if centers.len() >= self.kmax {
                // The budget is exhausted before any refinement; report the
                // centers as given.
                let clusters = Self::group(data, &centers);
                let wce = Self::wce(data, &clusters, &centers);
                return Ok(XMeansResult {
                    clusters: clusters.into_iter().filter(|c| !c.is_empty()).collect(),
                    centers,
                    wce,
                });
            }

            let refined = KMeans::new(centers.clone(), self.tolerance).process(data)?;
            centers = refined.centers().to_vec();
            let clusters = Self::group(data, &centers);

            let allocated = self.improve_structure(data, &clusters, &centers);
            if allocated.len() == centers.len() {
                return Ok(XMeansResult {
                    clusters: clusters.into_iter().filter(|c| !c.is_empty()).collect(),
                    centers,
                    wce: refined.wce(),
                });
            }
            log::debug!("xmeans accepted splits: {} -> {} centers", centers.len(), allocated.len());
            centers = allocated;
        }
    }

    /// Tries to split every cluster, keeping the parent center whenever the
    /// BIC gate or the center budget refuses.
    fn improve_structure(&self, data: &[Point], clusters: &ClusterSequence, centers: &[Point]) -> Vec<Point> {
        let mut allocated: Vec<Point> = Vec::with_capacity(centers.len());
        for (position, members) in clusters.iter().enumerate() {
            let parent = centers[position].clone();
            let budget_left = self.kmax - (allocated.len() + (clusters.len() - position));
            if members.len() < 2 || budget_left == 0 {
                allocated.push(parent);
                continue;
            }

            let region = members.iter().map(|&member| data[member].clone()).collect::<Vec<_>>();
            let split = self.best_two_split(&region, position);
            match split {
                Some((child_centers, child_clusters)) if child_clusters.len() == 2 => {
                    let parent_bic =
                        Self::bayesian_information_criterion(&region, &[(0..region.len()).collect()], &[parent.clone()]);
                    let child_bic = Self::bayesian_information_criterion(&region, &child_clusters, &child_centers);
                    if child_bic > parent_bic {
                        allocated.extend(child_centers);
                    } else {
                        allocated.push(parent);
                    }
                }
                _ => allocated.push(parent),
            }
        }
        allocated
    }

    /// The best of `repeat` seeded 2-means runs on a region, by error sum.
    fn best_two_split(&self, region: &[Point], position: usize) -> Option<(Vec<Point>, ClusterSequence)> {
        let mut best: Option<(f64, Vec<Point>, ClusterSequence)> = None;
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
                best = Some((result.wce(), result.centers().to_vec(), result.clusters().to_vec()));
            }
        }
        best.map(|(_, centers, clusters)| (centers, clusters))
    }

    /// The BIC of a model over `data`: a spherical-Gaussian log-likelihood
    /// per cluster with a pooled variance, minus the parameter-count
    /// penalty. Degenerate models (no free variance) score `f64::MIN` so
    /// they never win a comparison.
    #[allow(clippy::cast_precision_loss)]
    fn bayesian_information_criterion(data: &[Point], clusters: &[Cluster], centers: &[Point]) -> f64 {
        let k = clusters.len();
        let n: usize = clusters.iter().map(Vec::len).sum();
        let dimension = centers.first().map_or(0, Vec::len) as f64;
        if n <= k {
            return f64::MIN;
        }

        let mut sigma = 0.0;
        for (position, members) in clusters.iter().enumerate() {
            for &member in members {
                sigma += shoal_metrics::euclidean_sq(&data[member], &centers[position]);
            }
        }
        sigma /= (n - k) as f64;
        if sigma <= 0.0 {
            return f64::MIN;
        }

        let sigma_multiplier = dimension * 0.5 * sigma.ln();
        let parameters = (k as f64 - 1.0) + dimension * k as f64 + 1.0;
        let n = n as f64;
        let k = k as f64;

        let likelihood = clusters
            .iter()
            .map(|members| {
                let m = members.len() as f64;
                m.mul_add(m.ln(), -(m * n.ln()))
                    - m * 0.5 * (2.0 * core::f64::consts::PI).ln()
                    - m * sigma_multiplier
                    - (m - k) * 0.5
            })
            .sum::<f64>();
        likelihood - parameters * 0.5 * n.ln()
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

    /// The within-cluster sum of squared errors of an assignment.
    fn wce(data: &[Point], clusters: &ClusterSequence, centers: &[Point]) -> f64 {
        clusters
            .iter()
            .enumerate()
            .map(|(position, members)| {
                members
                    .iter()
                    .map(|&member| shoal_metrics::euclidean_sq(&data[member], &centers[position]))
                    .sum::<f64>()
            })
            .sum()
    }
}

/// The outcome of an X-Means run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XMeansResult {
    /// The clusters in center order, empty clusters omitted.
    clusters: ClusterSequence,
    /// The final centers.
    centers: Vec<Point>,
    /// The final within-cluster sum of errors.
    wce: f64,
}

impl XMeansResult {
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
