//! Statistics helpers used by the model-selection algorithms.

/// The arithmetic mean of a sample. Zero for an empty sample.
#[allow(clippy::cast_precision_loss)]
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        0.0
    } else {
        sample.iter().sum::<f64>() / sample.len() as f64
    }
}

/// The unbiased sample variance (normalized by `n - 1`). Zero for samples
/// of fewer than two values.
#[allow(clippy::cast_precision_loss)]
pub fn sample_variance(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }
    let mu = mean(sample);
    sample.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / (sample.len() - 1) as f64
}

/// The median of a sample: the middle element of the sorted sample for odd
/// counts, the mean of the two middle elements for even counts. Zero for an
/// empty sample.
pub fn median(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[middle]
    } else {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    }
}

/// The standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / core::f64::consts::SQRT_2))
}

/// The Anderson-Darling statistic of a sample against the null hypothesis
/// of normality, with mean and variance estimated from the sample.
///
/// Returns `f64::INFINITY` for degenerate samples (fewer than two values or
/// zero variance), which every finite critical value rejects.
#[allow(clippy::cast_precision_loss)]
pub fn anderson_darling(sample: &[f64]) -> f64 {
    let n = sample.len();
    if n < 2 {
        return f64::INFINITY;
    }
    let mu = mean(sample);
    let sigma = sample_variance(sample).sqrt();
    if sigma == 0.0 {
        return f64::INFINITY;
    }

    let mut z = sample.iter().map(|x| (x - mu) / sigma).collect::<Vec<_>>();
    z.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
    let w = z.iter().map(|&z| normal_cdf(z).clamp(1e-300, 1.0 - 1e-16)).collect::<Vec<_>>();

    let sum = (0..n)
        .map(|i| (2 * i + 1) as f64 * (w[i].ln() + (1.0 - w[n - 1 - i]).ln()))
        .sum::<f64>();
    -(n as f64) - sum / n as f64
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    #[test]
    fn median_even_and_odd() {
        assert!(approx_eq!(f64, super::median(&[3.0, 1.0, 2.0]), 2.0));
        assert!(approx_eq!(f64, super::median(&[4.0, 1.0, 2.0, 3.0]), 2.5));
    }

    #[test]
    fn normal_cdf_symmetry() {
        assert!(approx_eq!(f64, super::normal_cdf(0.0), 0.5));
        let tail = super::normal_cdf(-1.5) + super::normal_cdf(1.5);
        assert!(approx_eq!(f64, tail, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn anderson_darling_prefers_gaussian_shapes() {
        // A tight three-point sample standardizes to roughly [-1, 0, 1].
        let unimodal = super::anderson_darling(&[8.0, 8.1, 8.2]);
        // A two-mass sample is as far from normal as six points can be.
        let bimodal = super::anderson_darling(&[1.0, 1.1, 1.2, 3.0, 3.1, 3.2]);
        assert!(unimodal < bimodal, "unimodal {unimodal} should score below bimodal {bimodal}");
    }
}
