//! The clustering algorithms and their result containers.
//!
//! Every algorithm is a parameter struct with a blocking `process` entry
//! point that borrows its input for the duration of the call and hands the
//! caller an owned, algorithm-specific result. Algorithms that can exploit
//! the task executor also expose a `par_process` twin taking an explicit
//! [`ThreadPool`](crate::parallel::ThreadPool); sequential and parallel
//! variants produce identical partitions.

mod agglomerative;
mod bsas;
mod clique;
mod cure;
mod dbscan;
mod elbow;
mod fcm;
mod gmeans;
mod kmeans;
mod kmedians;
mod kmedoids;
mod mbsas;
mod optics;
pub mod ordering;
mod rock;
mod silhouette;
mod silhouette_ksearch;
mod ttsas;
mod xmeans;

pub use agglomerative::{Agglomerative, AgglomerativeResult, Linkage};
pub use bsas::{Bsas, BsasResult};
pub use clique::{Clique, CliqueBlock, CliqueResult};
pub use cure::{Cure, CureResult};
pub use dbscan::{Dbscan, DbscanResult};
pub use elbow::{Elbow, ElbowResult};
pub use fcm::{FuzzyCMeans, FuzzyCMeansResult};
pub use gmeans::{GMeans, GMeansResult};
pub use kmeans::{KMeans, KMeansResult};
pub use kmedians::{KMedians, KMediansResult};
pub use kmedoids::{KMedoids, KMedoidsResult, PamBuild};
pub use mbsas::Mbsas;
pub use optics::{Optics, OpticsDescriptor, OpticsResult};
pub use rock::{Rock, RockResult};
pub use silhouette::{Silhouette, SilhouetteResult};
pub use silhouette_ksearch::{SilhouetteAllocator, SilhouetteKSearch, SilhouetteKSearchResult};
pub use ttsas::Ttsas;
pub use xmeans::{XMeans, XMeansResult};

/// A non-empty ordered sequence of point indices; indices are unique within
/// a result.
pub type Cluster = Vec<usize>;

/// An ordered sequence of clusters. For partitional and density algorithms
/// the union of the clusters plus the noise set is the whole index range,
/// and clusters are pairwise disjoint.
pub type ClusterSequence = Vec<Cluster>;
