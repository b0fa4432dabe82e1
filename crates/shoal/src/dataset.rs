//! Dataset and distance-matrix representations.

use ndarray::Array2;

use crate::{Error, Metric, Result};

/// A point is an ordered sequence of real coordinates. All points of a
/// dataset share the same arity.
pub type Point = Vec<f64>;

/// Checks that a dataset is non-empty and that all of its points share the
/// same arity, returning that arity.
///
/// # Errors
///
/// - [`Error::EmptyDataset`] if `data` has no points.
/// - [`Error::DimensionMismatch`] if any point disagrees on arity, or if a
///   point is empty.
pub fn dimension(data: &[Point]) -> Result<usize> {
    let first = data.first().ok_or(Error::EmptyDataset)?;
    let expected = first.len();
    if expected == 0 {
        return Err(Error::DimensionMismatch {
            index: 0,
            found: 0,
            expected: 1,
        });
    }
    for (index, point) in data.iter().enumerate().skip(1) {
        if point.len() != expected {
            return Err(Error::DimensionMismatch {
                index,
                found: point.len(),
                expected,
            });
        }
    }
    Ok(expected)
}

/// A square symmetric matrix of pairwise dissimilarities with a zero
/// diagonal. An alternative representation of a dataset for the algorithms
/// that never need coordinates.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DistanceMatrix {
    /// The validated pairwise distances.
    matrix: Array2<f64>,
}

impl DistanceMatrix {
    /// Symmetry tolerance for user-provided matrices.
    const SYMMETRY_EPSILON: f64 = 1e-10;

    /// Wraps a validated matrix of pairwise distances.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`] if the matrix has no rows.
    /// - [`Error::MalformedMatrix`] if the matrix is not square, has a
    ///   negative entry, a non-zero diagonal, or is not symmetric.
    pub fn new(matrix: Array2<f64>) -> Result<Self> {
        let (rows, columns) = matrix.dim();
        if rows == 0 {
            return Err(Error::EmptyDataset);
        }
        if rows != columns {
            return Err(Error::MalformedMatrix(format!("{rows}x{columns} matrix is not square")));
        }
        for i in 0..rows {
            if matrix[[i, i]] != 0.0 {
                return Err(Error::MalformedMatrix(format!("non-zero diagonal at {i}")));
            }
            for j in 0..i {
                let (d, t) = (matrix[[i, j]], matrix[[j, i]]);
                if d < 0.0 {
                    return Err(Error::MalformedMatrix(format!("negative distance at ({i}, {j})")));
                }
                if (d - t).abs() > Self::SYMMETRY_EPSILON {
                    return Err(Error::MalformedMatrix(format!("asymmetry at ({i}, {j})")));
                }
            }
        }
        Ok(Self { matrix })
    }

    /// Computes the pairwise distance matrix of a dataset under a metric.
    ///
    /// # Errors
    ///
    /// - See [`dimension`](crate::dataset::dimension) for dataset errors.
    pub fn from_points(data: &[Point], metric: &Metric) -> Result<Self> {
        dimension(data)?;
        let n = data.len();
        let mut matrix = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..i {
                let d = metric.distance(&data[i], &data[j]);
                matrix[[i, j]] = d;
                matrix[[j, i]] = d;
            }
        }
        Ok(Self { matrix })
    }

    /// The number of points the matrix describes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    /// The distance between points `i` and `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[[i, j]]
    }

    /// An iterator over the distances from point `i` to every point.
    pub fn row(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        self.matrix.row(i).to_vec().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::DistanceMatrix;
    use crate::Error;

    #[test]
    fn rejects_asymmetry() {
        let matrix = array![[0.0, 1.0], [2.0, 0.0]];
        assert!(matches!(DistanceMatrix::new(matrix), Err(Error::MalformedMatrix(_))));
    }

    #[test]
    fn rejects_diagonal() {
        let matrix = array![[0.5, 1.0], [1.0, 0.0]];
        assert!(matches!(DistanceMatrix::new(matrix), Err(Error::MalformedMatrix(_))));
    }

    #[test]
    fn mixed_arity_is_rejected() {
        let data = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            super::dimension(&data),
            Err(Error::DimensionMismatch { index: 1, .. })
        ));
    }
}
