//! Spatial and graph containers shared by the algorithms.

mod adjacency;
mod kdtree;

pub use adjacency::Adjacency;
pub use kdtree::{KdNode, KdTree};
