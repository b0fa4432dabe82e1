//! The metric abstraction shared by all algorithms.

use std::sync::Arc;

use crate::dataset::Point;

/// A named distance function between two points of equal arity.
///
/// Metrics are stateless apart from their fixed parameters, so an instance
/// can be shared freely between algorithms. The squared Euclidean form is
/// the default wherever only the ordering on distances matters.
#[derive(Clone, Default)]
pub enum Metric {
    /// The Euclidean (L2) distance.
    Euclidean,
    /// The squared Euclidean distance.
    #[default]
    EuclideanSquare,
    /// The Manhattan (L1) distance.
    Manhattan,
    /// The Chebyshev (L-infinity) distance.
    Chebyshev,
    /// The Minkowski (Lp) distance of the given degree.
    Minkowski {
        /// The degree of the norm; 2.0 reduces to Euclidean.
        degree: f64,
    },
    /// The Canberra distance.
    Canberra,
    /// The chi-square distance.
    ChiSquare,
    /// The Gower distance, normalized by the per-dimension value ranges of
    /// the dataset it was built for.
    Gower {
        /// The value range of each dimension over the whole dataset.
        ranges: Vec<f64>,
    },
    /// A user-supplied distance function. It must be symmetric, return a
    /// non-negative value, and return zero for identical points.
    UserDefined(Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>),
}

impl core::fmt::Debug for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl Metric {
    /// The distance between `a` and `b`.
    #[must_use]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Euclidean => shoal_metrics::euclidean(a, b),
            Self::EuclideanSquare => shoal_metrics::euclidean_sq(a, b),
            Self::Manhattan => shoal_metrics::manhattan(a, b),
            Self::Chebyshev => shoal_metrics::chebyshev(a, b),
            Self::Minkowski { degree } => shoal_metrics::minkowski(a, b, *degree),
            Self::Canberra => shoal_metrics::canberra(a, b),
            Self::ChiSquare => shoal_metrics::chi_square(a, b),
            Self::Gower { ranges } => shoal_metrics::gower(a, b, ranges),
            Self::UserDefined(function) => function(a, b),
        }
    }

    /// Builds a Gower metric whose per-dimension ranges are taken from the
    /// given dataset. Empty datasets yield empty ranges.
    #[must_use]
    pub fn gower_for(data: &[Point]) -> Self {
        let dimension = data.first().map_or(0, Vec::len);
        let ranges = (0..dimension)
            .map(|j| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for point in data {
                    min = min.min(point[j]);
                    max = max.max(point[j]);
                }
                max - min
            })
            .collect();
        Self::Gower { ranges }
    }

    /// A short name for logs and debugging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::EuclideanSquare => "euclidean-square",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
            Self::Minkowski { .. } => "minkowski",
            Self::Canberra => "canberra",
            Self::ChiSquare => "chi-square",
            Self::Gower { .. } => "gower",
            Self::UserDefined(_) => "user-defined",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Metric;

    #[test]
    fn default_is_euclidean_square() {
        let metric = Metric::default();
        assert!((metric.distance(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() <= f64::EPSILON);
    }

    #[test]
    fn user_defined_dispatch() {
        let metric = Metric::UserDefined(Arc::new(|a, b| (a[0] - b[0]).abs()));
        assert!((metric.distance(&[1.0], &[4.0]) - 3.0).abs() <= f64::EPSILON);
    }

    #[test]
    fn gower_ranges_from_data() {
        let data = vec![vec![0.0, 10.0], vec![2.0, 30.0]];
        let metric = Metric::gower_for(&data);
        assert!((metric.distance(&data[0], &data[1]) - 1.0).abs() <= f64::EPSILON);
    }
}
