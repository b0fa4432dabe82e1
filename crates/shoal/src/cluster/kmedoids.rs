//! K-Medoids clustering (classical PAM) and the PAM BUILD seeding rule.

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, DistanceMatrix, Point};
use crate::{Error, Metric, Result};

/// A dissimilarity oracle over either coordinates or a precomputed matrix,
/// so the swap loop never needs to know which mode it runs in.
enum Dissimilarity<'a> {
    /// Points with a metric.
    Points {
        /// The dataset.
        data: &'a [Point],
        /// The metric to evaluate on demand.
        metric: &'a Metric,
    },
    /// A precomputed distance matrix.
    Matrix(&'a DistanceMatrix),
}

impl Dissimilarity<'_> {
    /// The number of points.
    fn len(&self) -> usize {
        match self {
            Self::Points { data, .. } => data.len(),
            Self::Matrix(matrix) => matrix.size(),
        }
    }

    /// The dissimilarity between points `i` and `j`.
    fn get(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::Points { data, metric } => metric.distance(&data[i], &data[j]),
            Self::Matrix(matrix) => matrix.get(i, j),
        }
    }
}

/// K-Medoids by the classical PAM SWAP loop.
///
/// Medoids are actual dataset points. Each round caches, per point, the
/// nearest and second-nearest medoid distances; the change in total
/// dissimilarity for a candidate swap is then a single O(N) pass instead of
/// a full re-assignment. The swap with the most negative change is applied
/// until no swap improves by more than the tolerance.
#[derive(Debug, Clone)]
pub struct KMedoids {
    /// The starting medoids, as point indices.
    initial_medoids: Vec<usize>,
    /// Minimum improvement a swap must bring to be applied.
    tolerance: f64,
    /// Hard cap on the number of applied swaps.
    itermax: usize,
    /// The metric for the points mode.
    metric: Metric,
}

impl KMedoids {
    /// The default cap on applied swaps.
    pub const DEFAULT_ITERMAX: usize = 200;

    /// A PAM run from the given medoid indices with the given tolerance.
    #[must_use]
    pub fn new(initial_medoids: Vec<usize>, tolerance: f64) -> Self {
        Self {
            initial_medoids,
            tolerance,
            itermax: Self::DEFAULT_ITERMAX,
            metric: Metric::default(),
        }
    }

    /// Replaces the metric used in the points mode.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Replaces the cap on applied swaps.
    #[must_use]
    pub const fn with_itermax(mut self, itermax: usize) -> Self {
        self.itermax = itermax;
        self
    }

    /// Runs PAM over coordinates.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] for no medoids or more medoids than
    ///   points.
    /// - [`Error::InvalidArgument`] for an out-of-range medoid index, a
    ///   repeated medoid, or a negative tolerance.
    pub fn process(&self, data: &[Point]) -> Result<KMedoidsResult> {
        dataset::dimension(data)?;
        self.run(&Dissimilarity::Points {
            data,
            metric: &self.metric,
        })
    }

    /// Runs PAM over a precomputed distance matrix.
    ///
    /// # Errors
    ///
    /// - See [`process`](Self::process), minus the dataset checks.
    pub fn process_matrix(&self, matrix: &DistanceMatrix) -> Result<KMedoidsResult> {
        self.run(&Dissimilarity::Matrix(matrix))
    }

    /// The SWAP loop over a dissimilarity oracle.
    fn run(&self, dissimilarity: &Dissimilarity<'_>) -> Result<KMedoidsResult> {
        let n = dissimilarity.len();
        self.validate(n)?;

        let mut medoids = self.initial_medoids.clone();
        let mut is_medoid = vec![false; n];
        for &medoid in &medoids {
            is_medoid[medoid] = true;
        }

        for swap in 0..self.itermax {
            let (nearest, d_first, d_second) = Self::nearest_tables(dissimilarity, &medoids);

            let mut best: Option<(f64, usize, usize)> = None;
            for (position, &medoid) in medoids.iter().enumerate() {
                for candidate in 0..n {
                    if is_medoid[candidate] {
                        continue;
                    }
                    let delta = Self::swap_delta(dissimilarity, medoid, candidate, &nearest, &d_first, &d_second);
                    if best.map_or(true, |(b, _, _)| delta < b) {
                        best = Some((delta, position, candidate));
                    }
                }
            }

            match best {
                Some((delta, position, candidate)) if delta < -self.tolerance => {
                    is_medoid[medoids[position]] = false;
                    is_medoid[candidate] = true;
                    medoids[position] = candidate;
                    log::trace!("pam swap {swap}: medoid slot {position} -> point {candidate} (delta {delta})");
                }
                _ => break,
            }
        }

        let clusters = Self::allocate(dissimilarity, &medoids);
        Ok(KMedoidsResult { clusters, medoids })
    }

    /// Per-point nearest medoid, nearest distance, and second-nearest
    /// distance.
    fn nearest_tables(dissimilarity: &Dissimilarity<'_>, medoids: &[usize]) -> (Vec<usize>, Vec<f64>, Vec<f64>) {
        let n = dissimilarity.len();
        let mut nearest = vec![0_usize; n];
        let mut d_first = vec![f64::INFINITY; n];
        let mut d_second = vec![f64::INFINITY; n];
        for i in 0..n {
            for &medoid in medoids {
                let d = dissimilarity.get(i, medoid);
                if d < d_first[i] {
                    d_second[i] = d_first[i];
                    d_first[i] = d;
                    nearest[i] = medoid;
                } else if d < d_second[i] {
                    d_second[i] = d;
                }
            }
        }
        (nearest, d_first, d_second)
    }

    /// The change in total dissimilarity if `medoid` were replaced by
    /// `candidate`, from the cached tables, in one O(N) pass.
    fn swap_delta(
        dissimilarity: &Dissimilarity<'_>,
        medoid: usize,
        candidate: usize,
        nearest: &[usize],
        d_first: &[f64],
        d_second: &[f64],
    ) -> f64 {
        let mut delta = 0.0;
        for i in 0..d_first.len() {
            if i == candidate {
                delta -= d_first[i];
                continue;
            }
            let d_ih = dissimilarity.get(i, candidate);
            if nearest[i] == medoid {
                delta += d_ih.min(d_second[i]) - d_first[i];
            } else if d_ih < d_first[i] {
                delta += d_ih - d_first[i];
            }
        }
        delta
    }

    /// Assigns every point to its nearest medoid, in medoid order.
    fn allocate(dissimilarity: &Dissimilarity<'_>, medoids: &[usize]) -> ClusterSequence {
        let mut clusters = vec![Vec::new(); medoids.len()];
        for i in 0..dissimilarity.len() {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (position, &medoid) in medoids.iter().enumerate() {
                let d = dissimilarity.get(i, medoid);
                if d < best_distance {
                    best_distance = d;
                    best = position;
                }
            }
            clusters[best].push(i);
        }
        clusters
    }

    /// Validates the medoid set against the input size.
    fn validate(&self, n: usize) -> Result<()> {
        if self.initial_medoids.is_empty() || self.initial_medoids.len() > n {
            return Err(Error::InvalidClusterCount {
                amount: self.initial_medoids.len(),
                size: n,
            });
        }
        let mut seen = vec![false; n];
        for &medoid in &self.initial_medoids {
            if medoid >= n {
                return Err(Error::InvalidArgument(format!(
                    "medoid index {medoid} is out of range for {n} points"
                )));
            }
            if seen[medoid] {
                return Err(Error::InvalidArgument(format!("medoid index {medoid} repeats")));
            }
            seen[medoid] = true;
        }
        if self.tolerance < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// The outcome of a K-Medoids run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMedoidsResult {
    /// The clusters in medoid order.
    clusters: ClusterSequence,
    /// The final medoids, as point indices.
    medoids: Vec<usize>,
}

impl KMedoidsResult {
    /// The clusters in medoid order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The final medoids, as point indices.
    #[must_use]
    pub fn medoids(&self) -> &[usize] {
        &self.medoids
    }
}

/// The PAM BUILD greedy seeding rule.
///
/// The first medoid is the point minimizing total dissimilarity to all
/// others; each following medoid maximizes the sum of positive gains
/// against the current nearest-medoid distances.
#[derive(Debug, Clone)]
pub struct PamBuild {
    /// The number of medoids to seed.
    amount: usize,
    /// The metric for the points mode.
    metric: Metric,
}

impl PamBuild {
    /// A BUILD seeding of `amount` medoids.
    #[must_use]
    pub fn new(amount: usize) -> Self {
        Self {
            amount,
            metric: Metric::default(),
        }
    }

    /// Replaces the metric used in the points mode.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Seeds medoid indices over coordinates.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidClusterCount`] if the amount is zero or exceeds
    ///   the dataset.
    pub fn initialize(&self, data: &[Point]) -> Result<Vec<usize>> {
        dataset::dimension(data)?;
        self.run(&Dissimilarity::Points {
            data,
            metric: &self.metric,
        })
    }

    /// Seeds medoid indices over a precomputed distance matrix.
    ///
    /// # Errors
    ///
    /// - See [`initialize`](Self::initialize).
    pub fn initialize_matrix(&self, matrix: &DistanceMatrix) -> Result<Vec<usize>> {
        self.run(&Dissimilarity::Matrix(matrix))
    }

    /// The greedy BUILD loop.
    fn run(&self, dissimilarity: &Dissimilarity<'_>) -> Result<Vec<usize>> {
        let n = dissimilarity.len();
        if self.amount == 0 || self.amount > n {
            return Err(Error::InvalidClusterCount {
                amount: self.amount,
                size: n,
            });
        }

        let first = (0..n)
            .map(|i| (i, (0..n).map(|j| dissimilarity.get(i, j)).sum::<f64>()))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(core::cmp::Ordering::Equal))
            .map_or(0, |(i, _)| i);

        let mut medoids = vec![first];
        let mut d_nearest = (0..n).map(|i| dissimilarity.get(i, first)).collect::<Vec<_>>();

        while medoids.len() < self.amount {
            let mut best = None::<(usize, f64)>;
            for candidate in 0..n {
                if medoids.contains(&candidate) {
                    continue;
                }
                let gain = (0..n)
                    .map(|i| (d_nearest[i] - dissimilarity.get(i, candidate)).max(0.0))
                    .sum::<f64>();
                if best.map_or(true, |(_, b)| gain > b) {
                    best = Some((candidate, gain));
                }
            }
            let (chosen, _) = best.map_or_else(|| unreachable!("amount <= n leaves a candidate"), |b| b);
            for i in 0..n {
                d_nearest[i] = d_nearest[i].min(dissimilarity.get(i, chosen));
            }
            medoids.push(chosen);
        }
        Ok(medoids)
    }
}
