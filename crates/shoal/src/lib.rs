//! Unsupervised clustering for numeric point data in Euclidean space.
//!
//! The engine consumes a dataset (a sequence of equal-length `f64` vectors)
//! or a precomputed distance matrix, and produces a partition of point
//! indices into clusters together with algorithm-specific outputs.
//!
//! ## Algorithm families
//!
//! - [`cluster::KMeans`], [`cluster::KMedians`], [`cluster::KMedoids`], and
//!   [`cluster::FuzzyCMeans`] for partitional clustering.
//! - [`cluster::Bsas`], [`cluster::Mbsas`], and [`cluster::Ttsas`] for
//!   sequential threshold clustering.
//! - [`cluster::Dbscan`] and [`cluster::Optics`] for density-based
//!   clustering.
//! - [`cluster::Clique`] for grid-based clustering.
//! - [`cluster::Agglomerative`], [`cluster::Cure`], and [`cluster::Rock`]
//!   for hierarchical clustering.
//! - [`cluster::XMeans`], [`cluster::GMeans`], [`cluster::Silhouette`],
//!   [`cluster::SilhouetteKSearch`], and [`cluster::Elbow`] for model
//!   selection.
//!
//! ## Determinism
//!
//! Every randomized component takes an explicit `u64` seed; there is no
//! ambient entropy source. Parallel variants (`par_process`) take an
//! explicit [`parallel::ThreadPool`] and produce the same partitions as
//! their sequential twins.

pub mod cluster;
pub mod container;
pub mod dataset;
pub mod differential;
pub mod error;
pub mod initializer;
pub mod metric;
pub mod parallel;
pub(crate) mod utils;

pub use dataset::{DistanceMatrix, Point};
pub use error::{Error, Result};
pub use metric::Metric;
