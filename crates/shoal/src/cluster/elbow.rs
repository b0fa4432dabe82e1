//! Elbow search for a cluster count.

use serde::{Deserialize, Serialize};

use super::KMeans;
use crate::dataset::{self, Point};
use crate::initializer::KMeansPlusPlus;
use crate::{Error, Result};

/// Elbow: runs K-Means for every `k` in `[kmin, kmax]`, records the error
/// sum, and picks the `k` whose curve point lies farthest from the chord
/// connecting the curve's endpoints.
#[derive(Debug, Clone)]
pub struct Elbow {
    /// The inclusive lower bound of the search.
    kmin: usize,
    /// The inclusive upper bound of the search.
    kmax: usize,
    /// The base seed; each candidate `k` derives its own from it.
    seed: u64,
}

impl Elbow {
    /// Convergence tolerance of the inner K-Means runs.
    const TOLERANCE: f64 = 0.001;

    /// An elbow search over `[kmin, kmax]` with the given seed.
    #[must_use]
    pub const fn new(kmin: usize, kmax: usize, seed: u64) -> Self {
        Self { kmin, kmax, seed }
    }

    /// Runs the search.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `kmin` is zero or the range holds
    ///   fewer than three candidates (a two-point curve has no elbow).
    /// - [`Error::InvalidClusterCount`] if `kmax` exceeds the dataset.
    /// - Dataset errors from the inner K-Means runs.
    pub fn process(&self, data: &[Point]) -> Result<ElbowResult> {
        dataset::dimension(data)?;
        if self.kmin == 0 || self.kmax < self.kmin + 2 {
            return Err(Error::InvalidArgument(format!(
                "the search range [{}, {}] must hold at least three candidates",
                self.kmin, self.kmax
            )));
        }
        if self.kmax > data.len() {
            return Err(Error::InvalidClusterCount {
                amount: self.kmax,
                size: data.len(),
            });
        }

        let mut wce = Vec::with_capacity(self.kmax - self.kmin + 1);
        for k in self.kmin..=self.kmax {
            let centers = KMeansPlusPlus::new(k, self.seed.wrapping_add(k as u64)).initialize(data)?;
            let result = KMeans::new(centers, Self::TOLERANCE).process(data)?;
            wce.push(result.wce());
        }

        let amount = self.kmin + Self::farthest_from_chord(&wce);
        log::debug!("elbow chose k = {amount} over [{}, {}]", self.kmin, self.kmax);
        Ok(ElbowResult { amount, wce })
    }

    /// The index of the curve point with maximum distance to the straight
    /// line through the first and last curve points.
    #[allow(clippy::cast_precision_loss)]
    fn farthest_from_chord(wce: &[f64]) -> usize {
        let (x1, y1) = (0.0, wce[0]);
        let (x2, y2) = ((wce.len() - 1) as f64, wce[wce.len() - 1]);
        let length = ((y2 - y1) * (y2 - y1) + (x2 - x1) * (x2 - x1)).sqrt();

        let mut elbow = 0;
        let mut farthest = f64::NEG_INFINITY;
        for (index, &y0) in wce.iter().enumerate() {
            let x0 = index as f64;
            let distance = ((y2 - y1) * x0 - (x2 - x1) * y0 + x2 * y1 - y2 * x1).abs() / length;
            if distance > farthest {
                farthest = distance;
                elbow = index;
            }
        }
        elbow
    }
}

/// The outcome of an elbow search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElbowResult {
    /// The chosen cluster count.
    amount: usize,
    /// The error sum per candidate `k`, in search order.
    wce: Vec<f64>,
}

impl ElbowResult {
    /// The chosen cluster count.
    #[must_use]
    pub const fn amount(&self) -> usize {
        self.amount
    }

    /// The error sum per candidate `k`, in search order.
    #[must_use]
    pub fn wce(&self) -> &[f64] {
        &self.wce
    }
}
