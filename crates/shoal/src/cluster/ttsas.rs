//! TTSAS (two-threshold sequential algorithmic scheme) clustering.

use super::bsas::{find_nearest_cluster, update_representative, BsasResult};
use super::ClusterSequence;
use crate::dataset::{self, Point};
use crate::{Error, Metric, Result};

/// TTSAS: sequential clustering with a gray zone between two thresholds.
///
/// Points whose nearest representative is within the lower threshold are
/// assigned; points beyond the upper threshold open a new cluster; points
/// in between stay in a "skipped" bitmap and are revisited on the next
/// pass. A pass that changes nothing force-opens a cluster at the first
/// remaining skipped point, so the loop always terminates.
#[derive(Debug, Clone)]
pub struct Ttsas {
    /// Assignment threshold: at or below it, a point joins its nearest
    /// cluster.
    threshold1: f64,
    /// Allocation threshold: above it, a point opens a new cluster.
    threshold2: f64,
    /// The metric against cluster representatives.
    metric: Metric,
}

/// Mutable state of one TTSAS run, local to the `process` call.
struct TtsasState {
    /// Clusters opened so far.
    clusters: ClusterSequence,
    /// One representative per cluster.
    representatives: Vec<Point>,
    /// Whether each point is still waiting for a verdict.
    skipped: Vec<bool>,
    /// How many points are still waiting.
    remaining: usize,
    /// Cursor to the first possibly-skipped point; only ever advances.
    start: usize,
}

impl Ttsas {
    /// A TTSAS run with the given assignment and allocation thresholds.
    /// The thresholds are compared against Euclidean distances by default.
    #[must_use]
    pub const fn new(threshold1: f64, threshold2: f64) -> Self {
        Self {
            threshold1,
            threshold2,
            metric: Metric::Euclidean,
        }
    }

    /// Replaces the metric used against representatives.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Iterates over the skipped points until none remain.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidArgument`] if a threshold is negative or the
    ///   thresholds are out of order.
    pub fn process(&self, data: &[Point]) -> Result<BsasResult> {
        dataset::dimension(data)?;
        if self.threshold1 < 0.0 || self.threshold2 < self.threshold1 {
            return Err(Error::InvalidArgument(format!(
                "thresholds must satisfy 0 <= {} <= {}",
                self.threshold1, self.threshold2
            )));
        }

        let mut state = TtsasState {
            clusters: Vec::new(),
            representatives: Vec::new(),
            skipped: vec![true; data.len()],
            remaining: data.len(),
            start: 0,
        };

        let mut changes = 0;
        while state.remaining != 0 {
            let previous = state.remaining;
            self.process_objects(data, &mut state, changes);
            changes = previous - state.remaining;
        }

        Ok(BsasResult::new(state.clusters, state.representatives))
    }

    /// One pass over the skipped points; a no-change previous pass forces a
    /// cluster open at the cursor.
    fn process_objects(&self, data: &[Point], state: &mut TtsasState, changes: usize) {
        while state.start < state.skipped.len() && !state.skipped[state.start] {
            state.start += 1;
        }

        if changes == 0 {
            Self::allocate_cluster(state, state.start, data);
            state.start += 1;
        }

        for index in state.start..state.skipped.len() {
            if state.skipped[index] {
                self.process_skipped_object(data, state, index);
            }
        }
    }

    /// Decides one skipped point: assign, allocate, or defer.
    fn process_skipped_object(&self, data: &[Point], state: &mut TtsasState, index: usize) {
        let point = &data[index];
        let (nearest, distance) = if state.representatives.is_empty() {
            (0, f64::INFINITY)
        } else {
            find_nearest_cluster(&self.metric, point, &state.representatives)
        };

        if distance <= self.threshold1 {
            state.clusters[nearest].push(index);
            update_representative(&mut state.representatives[nearest], point, state.clusters.len());
            state.skipped[index] = false;
            state.remaining -= 1;
        } else if distance > self.threshold2 {
            Self::allocate_cluster(state, index, data);
        }
    }

    /// Opens a new cluster seeded at `index`.
    fn allocate_cluster(state: &mut TtsasState, index: usize, data: &[Point]) {
        state.clusters.push(vec![index]);
        state.representatives.push(data[index].clone());
        state.skipped[index] = false;
        state.remaining -= 1;
    }
}
