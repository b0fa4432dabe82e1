//! Error types for the clustering engine.

use thiserror::Error;

/// A specialized `Result` whose error type is [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong when configuring or running an algorithm.
///
/// Invalid arguments fail the call before any processing happens; numerical
/// edge cases (empty clusters, coincident points) are handled locally by the
/// algorithms with well-defined fallbacks and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// The input dataset has no points.
    #[error("the dataset is empty")]
    EmptyDataset,

    /// A point does not have the arity shared by the rest of the dataset.
    #[error("point {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending point.
        index: usize,
        /// Dimension of the offending point.
        found: usize,
        /// Dimension shared by the rest of the dataset.
        expected: usize,
    },

    /// A requested cluster count cannot be satisfied by the input.
    #[error("cluster count {amount} is invalid for {size} points")]
    InvalidClusterCount {
        /// The requested number of clusters (or centers, or medoids).
        amount: usize,
        /// The number of points in the input.
        size: usize,
    },

    /// A distance matrix is not square, not symmetric, has a non-zero
    /// diagonal, or contains a negative entry.
    #[error("malformed distance matrix: {0}")]
    MalformedMatrix(String),

    /// A parameter is outside its documented domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
