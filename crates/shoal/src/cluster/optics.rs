//! OPTICS density-based ordering and clustering.

use serde::{Deserialize, Serialize};

use super::{ordering, Cluster, ClusterSequence};
use crate::container::KdTree;
use crate::dataset::{self, DistanceMatrix, Point};
use crate::{Error, Result};

/// Per-point OPTICS state and output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpticsDescriptor {
    /// The point this descriptor belongs to.
    index: usize,
    /// Distance to the `min_points`-th neighbor, if the point has that
    /// many within the radius.
    core_distance: Option<f64>,
    /// The reachability distance assigned while expanding, if any.
    reachability_distance: Option<f64>,
    /// Whether the point has been emitted into the ordering.
    processed: bool,
}

impl OpticsDescriptor {
    /// The point this descriptor belongs to.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Distance to the `min_points`-th neighbor, if defined.
    #[must_use]
    pub const fn core_distance(&self) -> Option<f64> {
        self.core_distance
    }

    /// The reachability distance, if one was assigned.
    #[must_use]
    pub const fn reachability_distance(&self) -> Option<f64> {
        self.reachability_distance
    }
}

/// OPTICS: produces a processing *ordering* with per-point core and
/// reachability distances instead of a hard partition, then extracts
/// clusters by cutting the ordering diagram at the radius.
///
/// With a desired cluster count configured, the run is repeated once with a
/// radius found by binary search on the ordering diagram (bounded by
/// [`ordering::DEFAULT_MAXIMUM_ITERATIONS`]). The search may fail to find
/// the requested count, in which case the first run's partition stands.
#[derive(Debug, Clone)]
pub struct Optics {
    /// The connectivity radius.
    radius: f64,
    /// The core-point neighbor threshold.
    min_points: usize,
    /// A desired cluster count for the auto-radius mode.
    amount_clusters: Option<usize>,
}

impl Optics {
    /// An OPTICS run with the given connectivity radius and core
    /// threshold.
    #[must_use]
    pub const fn new(radius: f64, min_points: usize) -> Self {
        Self {
            radius,
            min_points,
            amount_clusters: None,
        }
    }

    /// Requests a cluster count; the radius will be shrunk by binary search
    /// on the ordering diagram to try to reach it.
    #[must_use]
    pub const fn with_amount_clusters(mut self, amount: usize) -> Self {
        self.amount_clusters = Some(amount);
        self
    }

    /// Runs over coordinates.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidArgument`] if the radius is negative.
    pub fn process(&self, data: &[Point]) -> Result<OpticsResult> {
        dataset::dimension(data)?;
        self.check_radius()?;
        let payloads = (0..data.len()).collect::<Vec<_>>();
        let tree = KdTree::new(data.to_vec(), payloads)?;
        let neighbors = |index: usize, radius: f64| {
            let mut found = tree
                .find_nearest_nodes(&data[index], radius)
                .into_iter()
                .map(|(distance, node)| (*node.payload(), distance))
                .filter(|&(neighbor, _)| neighbor != index)
                .collect::<Vec<_>>();
            sort_neighbors(&mut found);
            found
        };
        Ok(self.run(data.len(), &neighbors))
    }

    /// Runs over a precomputed distance matrix.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the radius is negative.
    pub fn process_matrix(&self, matrix: &DistanceMatrix) -> Result<OpticsResult> {
        self.check_radius()?;
        let neighbors = |index: usize, radius: f64| {
            let mut found = matrix
                .row(index)
                .enumerate()
                .filter(|&(neighbor, distance)| neighbor != index && distance <= radius)
                .collect::<Vec<_>>();
            sort_neighbors(&mut found);
            found
        };
        Ok(self.run(matrix.size(), &neighbors))
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

    /// Expands once; with a desired cluster count, analyses the diagram and
    /// expands once more at the shrunken radius.
    fn run(&self, n: usize, neighbors: &dyn Fn(usize, f64) -> Vec<(usize, f64)>) -> OpticsResult {
        let mut radius = self.radius;
        let (mut descriptors, mut order) = self.expand(n, neighbors, radius);
        let mut diagram = Self::diagram(&descriptors, &order);

        if let Some(amount) = self.amount_clusters {
            let (clusters, _) = Self::extract(&descriptors, &order, radius);
            if clusters.len() != amount {
                let found = ordering::connectivity_radius(&diagram, amount, ordering::DEFAULT_MAXIMUM_ITERATIONS);
                if found >= 0.0 {
                    radius = found;
                    (descriptors, order) = self.expand(n, neighbors, radius);
                    diagram = Self::diagram(&descriptors, &order);
                } else {
                    log::warn!("optics could not find a radius yielding {amount} clusters; keeping {}", self.radius);
                }
            }
        }

        let (clusters, noise) = Self::extract(&descriptors, &order, radius);
        OpticsResult {
            clusters,
            noise,
            ordering: diagram,
            radius,
            descriptors,
        }
    }

    /// The reachability-ordered expansion, from scratch, at one radius.
    fn expand(
        &self,
        n: usize,
        neighbors: &dyn Fn(usize, f64) -> Vec<(usize, f64)>,
        radius: f64,
    ) -> (Vec<OpticsDescriptor>, Vec<usize>) {
        let mut descriptors = (0..n)
            .map(|index| OpticsDescriptor {
                index,
                core_distance: None,
                reachability_distance: None,
                processed: false,
            })
            .collect::<Vec<_>>();
        let mut order = Vec::with_capacity(n);

        for start in 0..n {
            if descriptors[start].processed {
                continue;
            }
            self.visit(start, radius, neighbors, &mut descriptors, &mut order);
        }
        (descriptors, order)
    }

    /// Processes one unvisited point and, if it is a core point, drains the
    /// reachability-ordered seed queue it opens.
    fn visit(
        &self,
        start: usize,
        radius: f64,
        neighbors: &dyn Fn(usize, f64) -> Vec<(usize, f64)>,
        descriptors: &mut [OpticsDescriptor],
        order: &mut Vec<usize>,
    ) {
        let mut seeds: Vec<usize> = Vec::new();
        let mut current = start;
        loop {
            descriptors[current].processed = true;
            order.push(current);
            let found = neighbors(current, radius);
            if let Some(core) = Self::core_distance_of(&found, self.min_points) {
                descriptors[current].core_distance = Some(core);
                for &(neighbor, distance) in &found {
                    if descriptors[neighbor].processed {
                        continue;
                    }
                    let reachability = core.max(distance);
                    let better = descriptors[neighbor]
                        .reachability_distance
                        .map_or(true, |previous| reachability < previous);
                    if better {
                        descriptors[neighbor].reachability_distance = Some(reachability);
                    }
                    if !seeds.contains(&neighbor) {
                        seeds.push(neighbor);
                    }
                }
            }

            // Dequeue the seed with the smallest reachability; ties break
            // on point index so runs are repeatable.
            let next = seeds
                .iter()
                .enumerate()
                .filter(|&(_, &seed)| !descriptors[seed].processed)
                .min_by(|&(_, &a), &(_, &b)| {
                    let ra = descriptors[a].reachability_distance.unwrap_or(f64::INFINITY);
                    let rb = descriptors[b].reachability_distance.unwrap_or(f64::INFINITY);
                    ra.partial_cmp(&rb).unwrap_or(core::cmp::Ordering::Equal).then(a.cmp(&b))
                })
                .map(|(position, &seed)| (position, seed));
            match next {
                Some((position, seed)) => {
                    seeds.swap_remove(position);
                    current = seed;
                }
                None => break,
            }
        }
    }

    /// The core distance: the distance to the `min_points`-th point of the
    /// neighborhood, counting the point itself first, or `None` when the
    /// neighborhood is too small. The counting rule matches
    /// [`Dbscan`](super::Dbscan).
    fn core_distance_of(found: &[(usize, f64)], min_points: usize) -> Option<f64> {
        if min_points <= 1 {
            Some(0.0)
        } else if found.len() + 1 >= min_points {
            Some(found[min_points - 2].1)
        } else {
            None
        }
    }

    /// The ordering diagram: reachability distances in processing order,
    /// for the points that have one.
    fn diagram(descriptors: &[OpticsDescriptor], order: &[usize]) -> Vec<f64> {
        order
            .iter()
            .filter_map(|&index| descriptors[index].reachability_distance)
            .collect()
    }

    /// Cuts the ordering at a radius: a new cluster opens at each step up
    /// past the radius by a point whose core distance is within it; points
    /// within the radius extend the open cluster; the rest are noise.
    fn extract(descriptors: &[OpticsDescriptor], order: &[usize], radius: f64) -> (ClusterSequence, Vec<usize>) {
        let mut clusters: ClusterSequence = Vec::new();
        let mut current: Option<Cluster> = None;
        let mut noise = Vec::new();

        for &index in order {
            let reachability = descriptors[index].reachability_distance;
            let within = reachability.is_some_and(|r| r <= radius);
            if within {
                match current.as_mut() {
                    Some(cluster) => cluster.push(index),
                    None => current = Some(vec![index]),
                }
            } else if descriptors[index].core_distance.is_some_and(|c| c <= radius) {
                if let Some(cluster) = current.take() {
                    clusters.push(cluster);
                }
                current = Some(vec![index]);
            } else {
                noise.push(index);
            }
        }
        if let Some(cluster) = current.take() {
            clusters.push(cluster);
        }
        (clusters, noise)
    }
}

/// Sorts neighbor lists by distance, then index, so core distances and
/// seed updates are deterministic.
fn sort_neighbors(neighbors: &mut [(usize, f64)]) {
    neighbors.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(core::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}

/// The outcome of an OPTICS run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpticsResult {
    /// Clusters extracted from the ordering at the effective radius.
    clusters: ClusterSequence,
    /// Point indices assigned to no cluster.
    noise: Vec<usize>,
    /// The ordering diagram fed to the analyser.
    ordering: Vec<f64>,
    /// The effective radius: the input radius, or the one found by the
    /// auto-radius search.
    radius: f64,
    /// Per-point descriptors, indexed by point.
    descriptors: Vec<OpticsDescriptor>,
}

impl OpticsResult {
    /// Clusters extracted from the ordering at the effective radius.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Point indices assigned to no cluster.
    #[must_use]
    pub fn noise(&self) -> &[usize] {
        &self.noise
    }

    /// The ordering diagram.
    #[must_use]
    pub fn ordering(&self) -> &[f64] {
        &self.ordering
    }

    /// The effective connectivity radius of the reported partition.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Per-point descriptors, indexed by point.
    #[must_use]
    pub fn descriptors(&self) -> &[OpticsDescriptor] {
        &self.descriptors
    }
}
