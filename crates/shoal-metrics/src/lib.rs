//! Distance functions for numeric point data.
//!
//! Every function here is a pure metric (or semi-metric) over `&[f64]`
//! slices: `m(a, b) >= 0`, `m(a, a) == 0`, and `m(a, b) == m(b, a)`. The
//! caller is responsible for passing slices of equal length; trailing
//! elements of the longer slice are ignored.

use core::cmp::Ordering;

/// Euclidean distance between two points.
///
/// # Examples
///
/// ```
/// let x = [1.0, 2.0, 3.0];
/// let y = [4.0, 5.0, 6.0];
///
/// let distance = shoal_metrics::euclidean(&x, &y);
///
/// assert!((distance - 27.0_f64.sqrt()).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn euclidean(x: &[f64], y: &[f64]) -> f64 {
    euclidean_sq(x, y).sqrt()
}

/// Squared Euclidean distance between two points.
///
/// This is the default metric wherever only the ordering on distances
/// matters, because it avoids the square root.
///
/// # Examples
///
/// ```
/// let x = [1.0, 2.0, 3.0];
/// let y = [4.0, 5.0, 6.0];
///
/// let distance = shoal_metrics::euclidean_sq(&x, &y);
///
/// assert!((distance - 27.0).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn euclidean_sq(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Manhattan (L1) distance between two points.
///
/// # Examples
///
/// ```
/// let x = [1.0, 2.0, 3.0];
/// let y = [4.0, 5.0, 6.0];
///
/// let distance = shoal_metrics::manhattan(&x, &y);
///
/// assert!((distance - 9.0).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn manhattan(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs()).sum()
}

/// Chebyshev (L-infinity) distance between two points.
///
/// # Examples
///
/// ```
/// let x = [1.0, 2.0, 3.0];
/// let y = [6.0, 5.0, 4.0];
///
/// let distance = shoal_metrics::chebyshev(&x, &y);
///
/// assert!((distance - 5.0).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn chebyshev(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs())
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Less))
        .unwrap_or(0.0)
}

/// General Minkowski (Lp) distance between two points for a given degree.
///
/// Degree 1 reduces to [`manhattan`] and degree 2 to [`euclidean`].
///
/// # Examples
///
/// ```
/// let x = [1.0, 2.0, 3.0];
/// let y = [4.0, 5.0, 6.0];
///
/// let distance = shoal_metrics::minkowski(&x, &y, 3.0);
///
/// assert!((distance - 81.0_f64.cbrt()).abs() <= 1e-12);
/// ```
#[must_use]
pub fn minkowski(x: &[f64], y: &[f64], degree: f64) -> f64 {
    libm::pow(minkowski_p(x, y, degree), 1.0 / degree)
}

/// The sum of the `degree`-th powers of the absolute coordinate differences,
/// i.e. the Minkowski distance without the final root.
#[must_use]
pub fn minkowski_p(x: &[f64], y: &[f64], degree: f64) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| libm::pow((a - b).abs(), degree))
        .sum()
}

/// Canberra distance between two points.
///
/// Coordinates where both values are zero contribute nothing.
///
/// # Examples
///
/// ```
/// let x = [0.0, 1.0];
/// let y = [0.0, 3.0];
///
/// let distance = shoal_metrics::canberra(&x, &y);
///
/// assert!((distance - 0.5).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn canberra(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| {
            let divisor = a.abs() + b.abs();
            if divisor == 0.0 {
                0.0
            } else {
                (a - b).abs() / divisor
            }
        })
        .sum()
}

/// Chi-square distance between two points.
///
/// Coordinates where both values are zero contribute nothing.
///
/// # Examples
///
/// ```
/// let x = [1.0, 3.0];
/// let y = [3.0, 3.0];
///
/// let distance = shoal_metrics::chi_square(&x, &y);
///
/// assert!((distance - 1.0).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn chi_square(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| {
            let divisor = a.abs() + b.abs();
            if divisor == 0.0 {
                0.0
            } else {
                (a - b) * (a - b) / divisor
            }
        })
        .sum()
}

/// Gower distance between two points, given the value range of each
/// dimension over the whole dataset.
///
/// Each coordinate difference is normalized by the range of its dimension
/// and the result is averaged over the dimensions. Dimensions with a zero
/// range contribute nothing.
///
/// # Examples
///
/// ```
/// let x = [0.0, 0.0];
/// let y = [2.0, 4.0];
/// let ranges = [2.0, 4.0];
///
/// let distance = shoal_metrics::gower(&x, &y, &ranges);
///
/// assert!((distance - 1.0).abs() <= f64::EPSILON);
/// ```
#[must_use]
pub fn gower(x: &[f64], y: &[f64], ranges: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let dimension = x.len() as f64;
    x.iter()
        .zip(y.iter())
        .zip(ranges.iter())
        .map(|((a, b), range)| {
            if *range == 0.0 {
                0.0
            } else {
                (a - b).abs() / range
            }
        })
        .sum::<f64>()
        / dimension
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use test_case::test_case;

    #[test_case(&[0.0, 0.0], &[3.0, 4.0], 5.0 ; "three-four-five")]
    #[test_case(&[1.0], &[1.0], 0.0 ; "identity")]
    fn euclidean(x: &[f64], y: &[f64], expected: f64) {
        assert!(approx_eq!(f64, super::euclidean(x, y), expected));
        assert!(approx_eq!(f64, super::euclidean(y, x), expected));
    }

    #[test]
    fn minkowski_degenerates() {
        let x = [1.0, -2.0, 0.5];
        let y = [-4.0, 5.0, 6.0];
        assert!(approx_eq!(
            f64,
            super::minkowski(&x, &y, 1.0),
            super::manhattan(&x, &y),
            epsilon = 1e-12
        ));
        assert!(approx_eq!(
            f64,
            super::minkowski(&x, &y, 2.0),
            super::euclidean(&x, &y),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn canberra_zero_coordinates() {
        assert!(approx_eq!(f64, super::canberra(&[0.0, 0.0], &[0.0, 0.0]), 0.0));
    }

    #[test]
    fn gower_zero_range() {
        let d = super::gower(&[1.0, 0.0], &[1.0, 1.0], &[0.0, 2.0]);
        assert!(approx_eq!(f64, d, 0.25));
    }
}
