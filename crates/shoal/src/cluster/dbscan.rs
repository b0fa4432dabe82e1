//! DBSCAN density-based clustering.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::container::KdTree;
use crate::dataset::{self, DistanceMatrix, Point};
use crate::{Error, Result};

/// DBSCAN: density-based expansion from core points.
///
/// A point is a core point when its `radius`-neighborhood, the point
/// itself included, holds at least `min_points` points; the same counting
/// rule is used by [`Optics`](super::Optics), so extracting clusters from
/// an OPTICS ordering at the same radius reproduces the DBSCAN partition.
/// Each unvisited core point starts a
/// cluster and expands it transitively; a non-core neighbor joins the
/// cluster as a border point but contributes no neighbors of its own.
/// Points claimed by no cluster form the noise set, so a point first seen
/// as noise and later absorbed as a border point ends up in its cluster
/// only.
///
/// In the points mode, neighborhoods are Euclidean radius queries against a
/// k-d tree over the dataset; in the distance-matrix mode they are row
/// scans.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// The connectivity radius.
    radius: f64,
    /// The core-point neighbor threshold.
    min_points: usize,
}

impl Dbscan {
    /// A DBSCAN run with the given connectivity radius and core threshold.
    #[must_use]
    pub const fn new(radius: f64, min_points: usize) -> Self {
        Self { radius, min_points }
    }

    /// Runs the expansion over coordinates.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidArgument`] if the radius is negative.
    pub fn process(&self, data: &[Point]) -> Result<DbscanResult> {
        dataset::dimension(data)?;
        self.check_radius()?;
        let payloads = (0..data.len()).collect::<Vec<_>>();
        let tree = KdTree::new(data.to_vec(), payloads)?;
        Ok(self.run(data.len(), |index| {
            tree.find_nearest_nodes(&data[index], self.radius)
                .into_iter()
                .map(|(_, node)| *node.payload())
                .filter(|&neighbor| neighbor != index)
                .collect()
        }))
    }

    /// Runs the expansion over a precomputed distance matrix.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the radius is negative.
    pub fn process_matrix(&self, matrix: &DistanceMatrix) -> Result<DbscanResult> {
        self.check_radius()?;
        Ok(self.run(matrix.size(), |index| {
            matrix
                .row(index)
                .enumerate()
                .filter(|&(neighbor, distance)| neighbor != index && distance <= self.radius)
                .map(|(neighbor, _)| neighbor)
                .collect()
        }))
    }

    /// Rejects negative radii.
    fn check_radius(&self) -> Result<()> {
        if self.radius < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "radius must be non-negative, got {}",
                self.radius
            )));
        }
        Ok(())
    }

    /// The expansion loop over an abstract neighborhood oracle.
    fn run<N: Fn(usize) -> Vec<usize>>(&self, n: usize, neighbors_of: N) -> DbscanResult {
        let mut visited = vec![false; n];
        let mut belongs = vec![false; n];
        let mut clusters: ClusterSequence = Vec::new();

        for index in 0..n {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            let neighbors = neighbors_of(index);
            if neighbors.len() + 1 < self.min_points {
                continue;
            }

            let mut cluster = vec![index];
            belongs[index] = true;
            let mut queue = VecDeque::from(neighbors);
            while let Some(neighbor) = queue.pop_front() {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    let expansion = neighbors_of(neighbor);
                    if expansion.len() + 1 >= self.min_points {
                        queue.extend(expansion);
                    }
                }
                if !belongs[neighbor] {
                    belongs[neighbor] = true;
                    cluster.push(neighbor);
                }
            }
            clusters.push(cluster);
        }

        let noise = (0..n).filter(|&index| !belongs[index]).collect::<Vec<_>>();
        log::debug!("dbscan found {} clusters and {} noise points", clusters.len(), noise.len());
        DbscanResult { clusters, noise }
    }
}

/// The outcome of a DBSCAN run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbscanResult {
    /// The clusters, each in expansion order.
    clusters: ClusterSequence,
    /// Point indices assigned to no cluster.
    noise: Vec<usize>,
}

impl DbscanResult {
    /// The clusters, each in expansion order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Point indices assigned to no cluster.
    #[must_use]
    pub fn noise(&self) -> &[usize] {
        &self.noise
    }
}
