//! CLIQUE grid-based clustering.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::{Cluster, ClusterSequence};
use crate::dataset::{self, Point};
use crate::{Error, Result};

/// One cell of the CLIQUE grid: a logical coordinate, its spatial
/// hyper-rectangle, and the points it captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliqueBlock {
    /// One interval index per dimension, each in `0..intervals`.
    logical_location: Vec<usize>,
    /// The lower corner of the cell.
    min_corner: Point,
    /// The upper corner of the cell.
    max_corner: Point,
    /// Indices of the points falling in the cell.
    points: Vec<usize>,
    /// BFS bookkeeping; never set on blocks that stay noise.
    visited: bool,
}

impl CliqueBlock {
    /// One interval index per dimension.
    #[must_use]
    pub fn logical_location(&self) -> &[usize] {
        &self.logical_location
    }

    /// The lower corner of the cell.
    #[must_use]
    pub fn min_corner(&self) -> &[f64] {
        &self.min_corner
    }

    /// The upper corner of the cell.
    #[must_use]
    pub fn max_corner(&self) -> &[f64] {
        &self.max_corner
    }

    /// Indices of the points falling in the cell.
    #[must_use]
    pub fn points(&self) -> &[usize] {
        &self.points
    }

    /// Whether the point lies inside the cell's hyper-rectangle.
    #[must_use]
    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .zip(self.min_corner.iter().zip(self.max_corner.iter()))
            .all(|(x, (min, max))| x >= min && x <= max)
    }

    /// The logical coordinates adjacent to this block along one axis,
    /// staying inside `0..edge` per dimension.
    fn location_neighbors(&self, edge: usize) -> Vec<Vec<usize>> {
        let mut neighbors = Vec::new();
        for dimension in 0..self.logical_location.len() {
            if self.logical_location[dimension] + 1 < edge {
                let mut position = self.logical_location.clone();
                position[dimension] += 1;
                neighbors.push(position);
            }
            if self.logical_location[dimension] != 0 {
                let mut position = self.logical_location.clone();
                position[dimension] -= 1;
                neighbors.push(position);
            }
        }
        neighbors
    }
}

/// CLIQUE: overlays a uniform grid of `intervals` cells per dimension,
/// keeps the non-empty cells in a map keyed by their stringified logical
/// coordinate, and clusters *dense* cells (at least `density_threshold`
/// captured points) by breadth-first search over the axis-neighbor
/// relation. Points of non-dense cells are reported as noise.
#[derive(Debug, Clone)]
pub struct Clique {
    /// Cells per dimension.
    intervals: usize,
    /// Minimum captured points for a cell to count as dense.
    density_threshold: usize,
}

impl Clique {
    /// A CLIQUE run with the given grid resolution and density threshold.
    #[must_use]
    pub const fn new(intervals: usize, density_threshold: usize) -> Self {
        Self {
            intervals,
            density_threshold,
        }
    }

    /// Builds the grid and clusters its dense cells.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`], [`Error::DimensionMismatch`] for malformed
    ///   input.
    /// - [`Error::InvalidArgument`] if the interval count is zero.
    pub fn process(&self, data: &[Point]) -> Result<CliqueResult> {
        let dimension = dataset::dimension(data)?;
        if self.intervals == 0 {
            return Err(Error::InvalidArgument("interval count must be positive".to_string()));
        }

        let (min_corner, max_corner) = Self::data_corners(data, dimension);
        #[allow(clippy::cast_precision_loss)]
        let sizes = min_corner
            .iter()
            .zip(max_corner.iter())
            .map(|(min, max)| (max - min) / self.intervals as f64)
            .collect::<Vec<_>>();

        let mut blocks = self.create_grid(data, &min_corner, &sizes);
        let mut keys = blocks.keys().cloned().collect::<Vec<_>>();
        keys.sort_unstable();

        let mut clusters: ClusterSequence = Vec::new();
        let mut noise = Vec::new();
        for key in &keys {
            if blocks[key].visited {
                continue;
            }
            if blocks[key].points.len() >= self.density_threshold {
                clusters.push(self.expand_cluster(&mut blocks, key));
            } else {
                blocks.get_mut(key).map_or((), |block| {
                    noise.extend(block.points.iter().copied());
                });
            }
        }
        noise.sort_unstable();

        let mut blocks = blocks.into_values().collect::<Vec<_>>();
        blocks.sort_by(|a, b| a.logical_location.cmp(&b.logical_location));
        Ok(CliqueResult {
            clusters,
            noise,
            blocks,
        })
    }

    /// The component-wise bounding corners of the dataset.
    fn data_corners(data: &[Point], dimension: usize) -> (Point, Point) {
        let mut min_corner = vec![f64::INFINITY; dimension];
        let mut max_corner = vec![f64::NEG_INFINITY; dimension];
        for point in data {
            for j in 0..dimension {
                min_corner[j] = min_corner[j].min(point[j]);
                max_corner[j] = max_corner[j].max(point[j]);
            }
        }
        (min_corner, max_corner)
    }

    /// Assigns every point to its cell, creating non-empty cells on demand.
    fn create_grid(&self, data: &[Point], min_corner: &[f64], sizes: &[f64]) -> HashMap<String, CliqueBlock> {
        let mut blocks: HashMap<String, CliqueBlock> = HashMap::new();
        for (index, point) in data.iter().enumerate() {
            let location = self.logical_location(point, min_corner, sizes);
            let key = location_key(&location);
            let block = blocks.entry(key).or_insert_with(|| {
                let (block_min, block_max) = Self::spatial_location(&location, min_corner, sizes);
                CliqueBlock {
                    logical_location: location,
                    min_corner: block_min,
                    max_corner: block_max,
                    points: Vec::new(),
                    visited: false,
                }
            });
            block.points.push(index);
        }
        blocks
    }

    /// The cell coordinate of a point, clamped into the grid.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn logical_location(&self, point: &[f64], min_corner: &[f64], sizes: &[f64]) -> Vec<usize> {
        point
            .iter()
            .zip(min_corner.iter().zip(sizes.iter()))
            .map(|(x, (min, size))| {
                if *size == 0.0 {
                    0
                } else {
                    (((x - min) / size).floor() as usize).min(self.intervals - 1)
                }
            })
            .collect()
    }

    /// The hyper-rectangle of a cell coordinate.
    #[allow(clippy::cast_precision_loss)]
    fn spatial_location(location: &[usize], min_corner: &[f64], sizes: &[f64]) -> (Point, Point) {
        let block_min = location
            .iter()
            .zip(min_corner.iter().zip(sizes.iter()))
            .map(|(cell, (min, size))| min + *cell as f64 * size)
            .collect::<Vec<_>>();
        let block_max = block_min.iter().zip(sizes.iter()).map(|(min, size)| min + size).collect();
        (block_min, block_max)
    }

    /// Collects the dense component reachable from `start` by BFS over
    /// axis neighbors, returning its captured points.
    fn expand_cluster(&self, blocks: &mut HashMap<String, CliqueBlock>, start: &str) -> Cluster {
        let mut cluster = Vec::new();
        let mut queue = VecDeque::from([start.to_string()]);
        if let Some(block) = blocks.get_mut(start) {
            block.visited = true;
        }

        while let Some(key) = queue.pop_front() {
            let (points, neighbors) = blocks.get(&key).map_or((Vec::new(), Vec::new()), |block| {
                (block.points.clone(), block.location_neighbors(self.intervals))
            });
            cluster.extend(points);

            for location in neighbors {
                let neighbor_key = location_key(&location);
                if let Some(neighbor) = blocks.get_mut(&neighbor_key) {
                    if !neighbor.visited && neighbor.points.len() >= self.density_threshold {
                        neighbor.visited = true;
                        queue.push_back(neighbor_key);
                    }
                }
            }
        }
        cluster.sort_unstable();
        cluster
    }
}

/// The map key of a logical coordinate.
fn location_key(location: &[usize]) -> String {
    location
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

/// The outcome of a CLIQUE run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliqueResult {
    /// One cluster per connected component of dense cells.
    clusters: ClusterSequence,
    /// Points captured by non-dense cells.
    noise: Vec<usize>,
    /// Every non-empty cell of the grid, ordered by logical coordinate.
    blocks: Vec<CliqueBlock>,
}

impl CliqueResult {
    /// One cluster per connected component of dense cells.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Points captured by non-dense cells.
    #[must_use]
    pub fn noise(&self) -> &[usize] {
        &self.noise
    }

    /// Every non-empty cell of the grid, ordered by logical coordinate.
    #[must_use]
    pub fn blocks(&self) -> &[CliqueBlock] {
        &self.blocks
    }
}
