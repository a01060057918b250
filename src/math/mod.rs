//! Numerical kernels: order statistics, moments, return transforms and Cholesky.

pub mod correlation;
pub mod timeseries;

pub use correlation::{CorrelationFactor, FactorizationPolicy};
pub use timeseries::{
    column_means, covariance_to_correlation, log_return_matrix, log_returns, sample_covariance,
};

/// Sorts a copy of `values` ascending with a total order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Empirical quantile of an ascending-sorted sample.
///
/// Linear interpolation between order statistics at rank `p * (n - 1)`
/// (Hyndman-Fan type 7, the NumPy/Excel `PERCENTILE.INC` default). A single
/// sample is its own quantile at every `p`. Returns `NaN` for an empty sample.
pub fn empirical_quantile(sorted_sample: &[f64], p: f64) -> f64 {
    let n = sorted_sample.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_sample[0];
    }

    let rank = p.clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted_sample[lo]
    } else {
        let w = rank - lo as f64;
        let q = sorted_sample[lo] + w * (sorted_sample[hi] - sorted_sample[lo]);
        // Keep the interpolant inside its bracket despite rounding.
        q.clamp(sorted_sample[lo], sorted_sample[hi])
    }
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with `n - 1` divisor; `0.0` below two samples.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss = values.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
    (ss / (values.len() as f64 - 1.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn quantile_interpolates_linearly_between_order_statistics() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(empirical_quantile(&s, 0.0), 1.0);
        assert_eq!(empirical_quantile(&s, 0.5), 3.0);
        assert_eq!(empirical_quantile(&s, 1.0), 5.0);
        // rank = 0.95 * 4 = 3.8
        assert_relative_eq!(empirical_quantile(&s, 0.95), 4.8, epsilon = 1.0e-12);
        // rank = 0.1 * 4 = 0.4
        assert_relative_eq!(empirical_quantile(&s, 0.1), 1.4, epsilon = 1.0e-12);
    }

    #[test]
    fn quantile_of_single_sample_is_that_sample() {
        assert_eq!(empirical_quantile(&[7.5], 0.01), 7.5);
        assert_eq!(empirical_quantile(&[7.5], 0.99), 7.5);
        assert!(empirical_quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn moments_match_reference_values() {
        let x = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&x), 5.0);
        assert_relative_eq!(sample_std_dev(&x), (32.0_f64 / 7.0).sqrt(), epsilon = 1.0e-12);
        assert_eq!(sample_std_dev(&[1.0]), 0.0);
    }
}
