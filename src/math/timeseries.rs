//! Return transforms and sample moment estimators over aligned price tables.
//!
//! Layout convention: rows are time-ordered observations, columns are assets.
//! All estimators are plain sequential loops so identical inputs give
//! bit-identical outputs.

use nalgebra::{DMatrix, DVector};

use crate::core::{Result, RiskError};

/// Computes log returns from a price series.
///
/// `r_t = ln(P_t / P_{t-1})`
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.len() < 2 {
        return Err(RiskError::insufficient_data("log returns", 2, prices.len()));
    }
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

/// Column-wise log returns of a `T x N` price table, giving a `(T-1) x N` table.
pub fn log_return_matrix(prices: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let t = prices.nrows();
    if t < 2 {
        return Err(RiskError::insufficient_data("log returns", 2, t));
    }
    let mut returns = DMatrix::<f64>::zeros(t - 1, prices.ncols());
    for (j, column) in prices.column_iter().enumerate() {
        let series: Vec<f64> = column.iter().copied().collect();
        returns.set_column(j, &DVector::from_vec(log_returns(&series)?));
    }
    Ok(returns)
}

/// Arithmetic mean of every column.
pub fn column_means(samples: &DMatrix<f64>) -> DVector<f64> {
    let n = samples.nrows() as f64;
    DVector::from_fn(samples.ncols(), |j, _| {
        samples.column(j).iter().sum::<f64>() / n
    })
}

/// Unbiased (`n - 1` divisor) sample covariance of the columns of `samples`.
///
/// The result is exactly symmetric: each off-diagonal entry is computed once
/// and mirrored.
pub fn sample_covariance(samples: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n_obs = samples.nrows();
    if n_obs < 2 {
        return Err(RiskError::insufficient_data("sample covariance", 2, n_obs));
    }

    let means = column_means(samples);
    let n_assets = samples.ncols();
    let denom = (n_obs - 1) as f64;
    let mut cov = DMatrix::<f64>::zeros(n_assets, n_assets);

    for i in 0..n_assets {
        for j in i..n_assets {
            let mut acc = 0.0;
            for t in 0..n_obs {
                acc += (samples[(t, i)] - means[i]) * (samples[(t, j)] - means[j]);
            }
            let c = acc / denom;
            cov[(i, j)] = c;
            cov[(j, i)] = c;
        }
    }

    Ok(cov)
}

/// Converts a covariance matrix to a correlation matrix.
///
/// Assets with zero variance get zero correlation with everything else and a
/// unit diagonal.
pub fn covariance_to_correlation(cov: &DMatrix<f64>) -> DMatrix<f64> {
    let n = cov.nrows();
    let sd: Vec<f64> = (0..n).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();
    DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else if sd[i] > 0.0 && sd[j] > 0.0 {
            (cov[(i, j)] / (sd[i] * sd[j])).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    })
}
