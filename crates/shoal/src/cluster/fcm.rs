//! Fuzzy C-Means clustering.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, Point};
use crate::{Error, Metric, Result};

/// Fuzzy C-Means: alternating optimization of an N x k membership matrix
/// and k centers, under a fuzzifier `m > 1`.
///
/// Membership of a point in a center falls off with the ratio of squared
/// distances; a point coinciding with a center gets full membership there
/// and zero everywhere else, which keeps the update free of division by
/// zero. Every point's hard label is its maximum-membership column.
#[derive(Debug, Clone)]
pub struct FuzzyCMeans {
    /// The starting centers; their count is the `k` of the run.
    initial_centers: Vec<Point>,
    /// The fuzzifier; larger values blur the membership rows.
    fuzziness: f64,
    /// Convergence bound on the largest center displacement.
    tolerance: f64,
    /// Hard cap on the number of iterations.
    itermax: usize,
}

impl FuzzyCMeans {
    /// The default fuzzifier.
    pub const DEFAULT_FUZZINESS: f64 = 2.0;
    /// The default convergence tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 0.001;
    /// The default iteration cap.
    pub const DEFAULT_ITERMAX: usize = 100;

    /// A run from the given centers with the default fuzzifier, tolerance,
    /// and iteration cap.
    #[must_use]
    pub fn new(initial_centers: Vec<Point>) -> Self {
        Self {
            initial_centers,
            fuzziness: Self::DEFAULT_FUZZINESS,
            tolerance: Self::DEFAULT_TOLERANCE,
            itermax: Self::DEFAULT_ITERMAX,
        }
    }

    /// Replaces the fuzzifier; must be greater than one.
    #[must_use]
    pub const fn with_fuzziness(mut self, fuzziness: f64) -> Self {
        self.fuzziness = fuzziness;
        self
    }

    /// Replaces the convergence tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replaces the iteration cap.
    #[must_use]
    pub const fn with_itermax(mut self, itermax: usize) -> Self {
        self.itermax = itermax;
        self
    }

    /// Runs the alternating optimization.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if there are no centers or more
    ///   centers than points.
    /// - [`Error::InvalidArgument`] if the fuzzifier is not greater than
    ///   one or the tolerance is not positive.
    pub fn process(&self, data: &[Point]) -> Result<FuzzyCMeansResult> {
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
        if self.fuzziness <= 1.0 {
            return Err(Error::InvalidArgument(format!(
                "fuzzifier must be greater than 1, got {}",
                self.fuzziness
            )));
        }
        if self.tolerance <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }

        let n = data.len();
        let k = self.initial_centers.len();
        let mut centers = self.initial_centers.clone();
        let mut membership = Array2::zeros((n, k));

        let mut iteration = 0;
        loop {
            self.update_membership(data, &centers, &mut membership);
            let change = Self::update_centers(data, &membership, &mut centers, self.fuzziness);
            iteration += 1;
            log::trace!("fcm iteration {iteration}: maximum center change {change}");
            if change <= self.tolerance || iteration >= self.itermax {
                break;
            }
        }

        let clusters = Self::extract_clusters(&membership);
        Ok(FuzzyCMeansResult {
            clusters,
            centers,
            membership,
        })
    }

    /// Recomputes every membership row from the current centers.
    fn update_membership(&self, data: &[Point], centers: &[Point], membership: &mut Array2<f64>) {
        let exponent = 1.0 / (self.fuzziness - 1.0);
        for (i, point) in data.iter().enumerate() {
            let distances = centers
                .iter()
                .map(|center| shoal_metrics::euclidean_sq(point, center))
                .collect::<Vec<_>>();

            // The coincidence rule: a point sitting on a center belongs to
            // it entirely.
            if let Some(coincident) = distances.iter().position(|&d| d == 0.0) {
                for j in 0..centers.len() {
                    membership[[i, j]] = f64::from(u8::from(j == coincident));
                }
                continue;
            }

            for j in 0..centers.len() {
                let divisor = distances
                    .iter()
                    .map(|&d| libm::pow(distances[j] / d, exponent))
                    .sum::<f64>();
                membership[[i, j]] = 1.0 / divisor;
            }
        }
    }

    /// Recomputes every center as the membership-weighted mean, returning
    /// the largest displacement.
    fn update_centers(data: &[Point], membership: &Array2<f64>, centers: &mut [Point], fuzziness: f64) -> f64 {
        let mut change: f64 = 0.0;
        for (j, center) in centers.iter_mut().enumerate() {
            let mut numerator = vec![0.0; center.len()];
            let mut denominator = 0.0;
            for (i, point) in data.iter().enumerate() {
                let weight = libm::pow(membership[[i, j]], fuzziness);
                denominator += weight;
                for (slot, x) in numerator.iter_mut().zip(point.iter()) {
                    *slot += weight * x;
                }
            }
            if denominator > 0.0 {
                for slot in &mut numerator {
                    *slot /= denominator;
                }
                change = change.max(shoal_metrics::euclidean(center, &numerator));
                *center = numerator;
            }
        }
        change
    }

    /// Hard labels: each point joins the cluster of its maximum-membership
    /// column; empty clusters are dropped.
    fn extract_clusters(membership: &Array2<f64>) -> ClusterSequence {
        let (n, k) = membership.dim();
        let mut clusters = vec![Vec::new(); k];
        for i in 0..n {
            let mut best = 0;
            let mut best_value = f64::NEG_INFINITY;
            for j in 0..k {
                if membership[[i, j]] > best_value {
                    best_value = membership[[i, j]];
                    best = j;
                }
            }
            clusters[best].push(i);
        }
        clusters.into_iter().filter(|c| !c.is_empty()).collect()
    }
}

/// The outcome of a Fuzzy C-Means run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyCMeansResult {
    /// The hard clusters in center order, empty clusters omitted.
    clusters: ClusterSequence,
    /// The final centers.
    centers: Vec<Point>,
    /// The N x k membership matrix; rows are points and sum to one.
    membership: Array2<f64>,
}

impl FuzzyCMeansResult {
    /// The hard clusters in center order, empty clusters omitted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The final centers.
    #[must_use]
    pub fn centers(&self) -> &[Point] {
        &self.centers
    }

    /// The N x k membership matrix.
    #[must_use]
    pub const fn membership(&self) -> &Array2<f64> {
        &self.membership
    }
}
