//! Cluster-count search by mean silhouette score.

use serde::{Deserialize, Serialize};

use super::{ClusterSequence, KMeans, KMedians, KMedoids, Silhouette};
use crate::dataset::Point;
use crate::initializer::KMeansPlusPlus;
use crate::{Error, Result};

/// Which clusterer the search runs for each candidate `k`. Every variant
/// is seeded with k-means++ centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SilhouetteAllocator {
    /// Score K-Means partitions.
    KMeans,
    /// Score K-Medians partitions.
    KMedians,
    /// Score K-Medoids (PAM) partitions.
    KMedoids,
}

/// Searches `k` in `[kmin, kmax)` for the best mean silhouette score.
///
/// A candidate whose clusterer produced fewer than `k` clusters is scored
/// `NaN` and never wins.
#[derive(Debug, Clone)]
pub struct SilhouetteKSearch {
    /// The inclusive lower bound of the search.
    kmin: usize,
    /// The exclusive upper bound of the search.
    kmax: usize,
    /// The clusterer run for each candidate.
    allocator: SilhouetteAllocator,
    /// The base seed; each candidate `k` derives its own from it.
    seed: u64,
}

impl SilhouetteKSearch {
    /// Convergence tolerance of the inner clusterers.
    const TOLERANCE: f64 = 0.001;

    /// A search over `[kmin, kmax)` with the given allocator and seed.
    #[must_use]
    pub const fn new(kmin: usize, kmax: usize, allocator: SilhouetteAllocator, seed: u64) -> Self {
        Self {
            kmin,
            kmax,
            allocator,
            seed,
        }
    }

    /// Runs the search.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `kmin <= 1` (one cluster has no
    ///   silhouette).
    /// - [`Error::InvalidClusterCount`] if `kmax` exceeds the dataset.
    /// - Dataset errors from the inner clusterers.
    pub fn process(&self, data: &[Point]) -> Result<SilhouetteKSearchResult> {
        if self.kmin <= 1 {
            return Err(Error::InvalidArgument(format!(
                "kmin must be greater than 1, got {}",
                self.kmin
            )));
        }
        if self.kmax > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.kmax,
                size: data.len(),
            });
        }

        let mut scores = Vec::with_capacity(self.kmax.saturating_sub(self.kmin));
        let mut amount = 0;
        let mut best = f64::NEG_INFINITY;
        for k in self.kmin..self.kmax {
            let clusters = self.allocate(k, data)?;
            if clusters.len() != k {
                log::debug!("k-search skipped k = {k}: allocator produced {} clusters", clusters.len());
                scores.push(f64::NAN);
                continue;
            }
            let score = Silhouette::new().process(data, &clusters)?.mean_score();
            scores.push(score);
            if score > best {
                best = score;
                amount = k;
            }
        }

        let score = if amount == 0 { f64::NAN } else { best };
        Ok(SilhouetteKSearchResult { amount, score, scores })
    }

    /// One candidate clustering with k-means++ seeding derived from `k`.
    fn allocate(&self, k: usize, data: &[Point]) -> Result<ClusterSequence> {
        let seed = self.seed.wrapping_add(k as u64);
        let clusters = match self.allocator {
            SilhouetteAllocator::KMeans => {
                let centers = KMeansPlusPlus::new(k, seed).initialize(data)?;
                KMeans::new(centers, Self::TOLERANCE).process(data)?.clusters().to_vec()
            }
            SilhouetteAllocator::KMedians => {
                let medians = KMeansPlusPlus::new(k, seed).initialize(data)?;
                KMedians::new(medians, Self::TOLERANCE).process(data)?.clusters().to_vec()
            }
            SilhouetteAllocator::KMedoids => {
                let medoids = KMeansPlusPlus::new(k, seed).initialize_indices(data)?;
                KMedoids::new(medoids, Self::TOLERANCE).process(data)?.clusters().to_vec()
            }
        };
        Ok(clusters)
    }
}

/// The outcome of a silhouette k-search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilhouetteKSearchResult {
    /// The best-scoring cluster count; zero when every candidate failed.
    amount: usize,
    /// The best mean score; `NaN` when every candidate failed.
    score: f64,
    /// The mean score per candidate `k`, in search order; `NaN` entries
    /// mark failed candidates.
    scores: Vec<f64>,
}

impl SilhouetteKSearchResult {
    /// The best-scoring cluster count; zero when every candidate failed.
    #[must_use]
    pub const fn amount(&self) -> usize {
        self.amount
    }

    /// The best mean score; `NaN` when every candidate failed.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// The mean score per candidate `k`, in search order.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }
}
