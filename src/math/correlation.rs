//! Cholesky factorization of covariance matrices for correlated shock generation.
//!
//! References:
//! - Glasserman, P. (2004), *Monte Carlo Methods in Financial Engineering*, Sec. 2.3.
//! - Higham, N. (2002), *Computing the nearest correlation matrix*.
//!
//! The factor `L` (lower triangular, `L L^T = Σ`) is computed once per simulation
//! and applied as a fixed linear map to independent standard normals, so that
//! `L z ~ N(0, Σ)`. How non positive-definite input is handled is chosen
//! explicitly through [`FactorizationPolicy`]; every policy is deterministic and
//! bounded.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{Result, RiskError};

/// Relative tolerance for the symmetry check on input matrices.
const SYMMETRY_TOL: f64 = 1.0e-10;

/// Policy applied when a covariance matrix is not numerically positive definite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FactorizationPolicy {
    /// Plain Cholesky: any non-positive pivot fails.
    Strict,
    /// Pivots within `tolerance * max(diag)` of zero are treated as exact zeros
    /// and their column is left empty. Handles perfectly correlated and
    /// zero-variance assets exactly; genuinely indefinite input still fails.
    SemiDefinite {
        /// Relative pivot tolerance.
        tolerance: f64,
    },
    /// Diagonal loading: retries plain Cholesky on `Σ + k I` with
    /// `k = initial_jitter * max(diag) * growth^a`, `a = 0..max_attempts`.
    Regularize {
        /// First jitter, relative to the largest variance.
        initial_jitter: f64,
        /// Multiplicative jitter growth between attempts.
        growth: f64,
        /// Upper bound on jittered attempts.
        max_attempts: u32,
    },
}

impl Default for FactorizationPolicy {
    fn default() -> Self {
        Self::SemiDefinite { tolerance: 1.0e-12 }
    }
}

impl FactorizationPolicy {
    /// Diagonal loading starting at `1e-10 * max(diag)`, growing 10x, at most 8 attempts.
    pub fn regularize() -> Self {
        Self::Regularize {
            initial_jitter: 1.0e-10,
            growth: 10.0,
            max_attempts: 8,
        }
    }
}

/// Lower-triangular `L` with `L L^T` equal to the (possibly regularized) covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFactor {
    lower: DMatrix<f64>,
    jitter: f64,
    rank: usize,
}

/// First pivot at which factorization broke down.
#[derive(Debug, Clone, Copy)]
struct PivotFailure {
    pivot: usize,
    value: f64,
}

impl CorrelationFactor {
    /// Factors `covariance` under `policy`.
    ///
    /// A 1x1 matrix always yields `sqrt(Σ_00)` directly.
    ///
    /// # Examples
    /// ```rust
    /// use mcrisk::math::{CorrelationFactor, FactorizationPolicy};
    /// use nalgebra::DMatrix;
    ///
    /// let cov = DMatrix::from_row_slice(2, 2, &[0.04, 0.012, 0.012, 0.01]);
    /// let factor = CorrelationFactor::factorize(&cov, FactorizationPolicy::Strict).unwrap();
    /// let rebuilt = factor.implied_covariance();
    /// assert!((rebuilt - cov).abs().max() < 1.0e-15);
    /// ```
    pub fn factorize(covariance: &DMatrix<f64>, policy: FactorizationPolicy) -> Result<Self> {
        let n = validate_covariance(covariance)?;

        if n == 1 {
            let v = covariance[(0, 0)];
            if v < 0.0 {
                return Err(not_positive_definite(n, 0, 1, v));
            }
            return Ok(Self {
                lower: DMatrix::from_element(1, 1, v.sqrt()),
                jitter: 0.0,
                rank: usize::from(v > 0.0),
            });
        }

        let scale = max_diagonal(covariance);
        match policy {
            FactorizationPolicy::Strict => cholesky_lower(covariance, 0.0, 0.0)
                .map(|(lower, rank)| Self {
                    lower,
                    jitter: 0.0,
                    rank,
                })
                .map_err(|f| not_positive_definite(n, f.pivot, 1, f.value)),
            FactorizationPolicy::SemiDefinite { tolerance } => {
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(RiskError::invalid_config(
                        "semi-definite tolerance must be finite and >= 0",
                    ));
                }
                let zero_tol = tolerance * scale;
                let offdiag_tol = scale * tolerance.sqrt();
                let (lower, rank) = cholesky_lower(covariance, zero_tol, offdiag_tol)
                    .map_err(|f| not_positive_definite(n, f.pivot, 1, f.value))?;
                if rank < n {
                    warn!(
                        dimension = n,
                        rank, "covariance is rank deficient; degenerate directions carry no shock"
                    );
                }
                Ok(Self {
                    lower,
                    jitter: 0.0,
                    rank,
                })
            }
            FactorizationPolicy::Regularize {
                initial_jitter,
                growth,
                max_attempts,
            } => {
                if !(initial_jitter.is_finite() && initial_jitter > 0.0)
                    || !(growth.is_finite() && growth > 1.0)
                {
                    return Err(RiskError::invalid_config(
                        "regularization needs initial_jitter > 0 and growth > 1",
                    ));
                }

                let mut last = match cholesky_lower(covariance, 0.0, 0.0) {
                    Ok((lower, rank)) => {
                        return Ok(Self {
                            lower,
                            jitter: 0.0,
                            rank,
                        });
                    }
                    Err(f) => f,
                };

                let mut jitter = initial_jitter * scale;
                for attempt in 1..=max_attempts {
                    let mut loaded = covariance.clone();
                    for i in 0..n {
                        loaded[(i, i)] += jitter;
                    }
                    match cholesky_lower(&loaded, 0.0, 0.0) {
                        Ok((lower, rank)) => {
                            warn!(
                                dimension = n,
                                jitter,
                                attempt,
                                "covariance regularized by diagonal loading"
                            );
                            return Ok(Self {
                                lower,
                                jitter,
                                rank,
                            });
                        }
                        Err(f) => last = f,
                    }
                    jitter *= growth;
                }

                Err(not_positive_definite(
                    n,
                    last.pivot,
                    max_attempts.saturating_add(1),
                    last.value,
                ))
            }
        }
    }

    /// Lower-triangular factor.
    #[inline]
    pub fn lower(&self) -> &DMatrix<f64> {
        &self.lower
    }

    /// Number of assets.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.lower.nrows()
    }

    /// Diagonal loading added before factorization (zero unless regularized).
    #[inline]
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Number of non-degenerate pivots.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// `L L^T`.
    pub fn implied_covariance(&self) -> DMatrix<f64> {
        &self.lower * self.lower.transpose()
    }

    /// Maps one vector of independent standard normals to correlated shocks `L z`.
    pub fn correlate(&self, independent: &DVector<f64>) -> DVector<f64> {
        &self.lower * independent
    }

    /// Maps a batch of independent draws (one row per path) to correlated
    /// shocks, i.e. `Z L^T`.
    pub fn correlate_rows(&self, independent: &DMatrix<f64>) -> DMatrix<f64> {
        independent * self.lower.transpose()
    }
}

fn validate_covariance(m: &DMatrix<f64>) -> Result<usize> {
    let n = m.nrows();
    if n == 0 {
        return Err(RiskError::shape_mismatch("covariance dimension", 1, 0));
    }
    if m.ncols() != n {
        return Err(RiskError::shape_mismatch("covariance columns", n, m.ncols()));
    }
    if let Some(idx) = m.iter().position(|x| !x.is_finite()) {
        return Err(RiskError::NonPositiveDefiniteCovariance {
            dimension: n,
            pivot: idx % n,
            attempts: 0,
            reason: "matrix has non-finite entries".to_string(),
        });
    }
    let tol = SYMMETRY_TOL * max_diagonal(m);
    for i in 0..n {
        for j in (i + 1)..n {
            if (m[(i, j)] - m[(j, i)]).abs() > tol {
                return Err(RiskError::NonPositiveDefiniteCovariance {
                    dimension: n,
                    pivot: i,
                    attempts: 0,
                    reason: format!("matrix is not symmetric at ({i}, {j})"),
                });
            }
        }
    }
    Ok(n)
}

fn max_diagonal(m: &DMatrix<f64>) -> f64 {
    let d = m.diagonal().iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if d > 0.0 { d } else { 1.0 }
}

fn not_positive_definite(dimension: usize, pivot: usize, attempts: u32, value: f64) -> RiskError {
    RiskError::NonPositiveDefiniteCovariance {
        dimension,
        pivot,
        attempts,
        reason: format!("pivot value {value:e}"),
    }
}

/// Column-by-column Cholesky over the lower triangle.
///
/// Pivots `<= zero_tol` in magnitude are treated as zero (column left empty),
/// which requires the residual column below them to vanish within `offdiag_tol`.
/// With `zero_tol == 0` every pivot must be strictly positive.
fn cholesky_lower(
    m: &DMatrix<f64>,
    zero_tol: f64,
    offdiag_tol: f64,
) -> std::result::Result<(DMatrix<f64>, usize), PivotFailure> {
    let n = m.nrows();
    let mut l = DMatrix::<f64>::zeros(n, n);
    let mut rank = 0usize;

    for j in 0..n {
        let mut d = m[(j, j)];
        for k in 0..j {
            d -= l[(j, k)] * l[(j, k)];
        }

        if d > zero_tol {
            let ljj = d.sqrt();
            l[(j, j)] = ljj;
            for i in (j + 1)..n {
                let mut s = m[(i, j)];
                for k in 0..j {
                    s -= l[(i, k)] * l[(j, k)];
                }
                l[(i, j)] = s / ljj;
            }
            rank += 1;
        } else if zero_tol > 0.0 && d >= -zero_tol {
            for i in (j + 1)..n {
                let mut s = m[(i, j)];
                for k in 0..j {
                    s -= l[(i, k)] * l[(j, k)];
                }
                if s.abs() > offdiag_tol {
                    return Err(PivotFailure { pivot: j, value: d });
                }
            }
        } else {
            return Err(PivotFailure { pivot: j, value: d });
        }
    }

    Ok((l, rank))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn two_asset_cov(rho: f64) -> DMatrix<f64> {
        let (s1, s2) = (0.02, 0.015);
        DMatrix::from_row_slice(
            2,
            2,
            &[s1 * s1, rho * s1 * s2, rho * s1 * s2, s2 * s2],
        )
    }

    // Binary-exact entries so the second pivot is exactly zero.
    fn perfectly_correlated() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 2, &[0.25, 0.125, 0.125, 0.0625])
    }

    #[test]
    fn strict_factor_reproduces_covariance() {
        let cov = two_asset_cov(0.6);
        let f = CorrelationFactor::factorize(&cov, FactorizationPolicy::Strict).unwrap();

        assert_eq!(f.dimension(), 2);
        assert_eq!(f.rank(), 2);
        assert_eq!(f.lower()[(0, 1)], 0.0);
        let rebuilt = f.implied_covariance();
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(rebuilt[(i, j)], cov[(i, j)], epsilon = 1.0e-16);
            }
        }
    }

    #[test]
    fn single_asset_factor_is_the_standard_deviation() {
        let cov = DMatrix::from_element(1, 1, 0.0004);
        for policy in [
            FactorizationPolicy::Strict,
            FactorizationPolicy::default(),
            FactorizationPolicy::regularize(),
        ] {
            let f = CorrelationFactor::factorize(&cov, policy).unwrap();
            assert_relative_eq!(f.lower()[(0, 0)], 0.02, epsilon = 1.0e-15);
            assert_eq!(f.jitter(), 0.0);
        }
    }

    #[test]
    fn single_asset_with_zero_variance_has_zero_factor() {
        let cov = DMatrix::from_element(1, 1, 0.0);
        let f = CorrelationFactor::factorize(&cov, FactorizationPolicy::Strict).unwrap();
        assert_eq!(f.lower()[(0, 0)], 0.0);
        assert_eq!(f.rank(), 0);
    }

    #[test]
    fn strict_rejects_perfect_correlation() {
        let cov = perfectly_correlated();
        let err = CorrelationFactor::factorize(&cov, FactorizationPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            RiskError::NonPositiveDefiniteCovariance { pivot: 1, .. }
        ));
    }

    #[test]
    fn semidefinite_policy_factors_perfect_correlation_exactly() {
        let v = 0.0004;
        let cov = DMatrix::from_element(3, 3, v);
        let f = CorrelationFactor::factorize(&cov, FactorizationPolicy::default()).unwrap();

        assert_eq!(f.rank(), 1);
        for i in 0..3 {
            assert_relative_eq!(f.lower()[(i, 0)], 0.02, epsilon = 1.0e-15);
            for j in 1..3 {
                assert_eq!(f.lower()[(i, j)], 0.0);
            }
        }
    }

    #[test]
    fn semidefinite_policy_handles_zero_variance_asset() {
        let cov = DMatrix::from_row_slice(2, 2, &[0.0004, 0.0, 0.0, 0.0]);
        let f = CorrelationFactor::factorize(&cov, FactorizationPolicy::default()).unwrap();
        assert_eq!(f.rank(), 1);
        assert_eq!(f.lower()[(1, 1)], 0.0);
    }

    #[test]
    fn indefinite_matrix_fails_under_semidefinite_policy() {
        let bad = DMatrix::from_row_slice(
            3,
            3,
            &[1.0, 0.95, 0.95, 0.95, 1.0, -0.95, 0.95, -0.95, 1.0],
        );
        assert!(matches!(
            CorrelationFactor::factorize(&bad, FactorizationPolicy::default()),
            Err(RiskError::NonPositiveDefiniteCovariance { .. })
        ));
    }

    #[test]
    fn regularization_loads_diagonal_for_singular_matrix() {
        let cov = perfectly_correlated();
        let f = CorrelationFactor::factorize(&cov, FactorizationPolicy::regularize()).unwrap();

        assert!(f.jitter() > 0.0);
        assert_eq!(f.rank(), 2);
        let rebuilt = f.implied_covariance();
        assert_relative_eq!(rebuilt[(0, 0)], cov[(0, 0)] + f.jitter(), epsilon = 1.0e-15);
        assert_relative_eq!(rebuilt[(0, 1)], cov[(0, 1)], epsilon = 1.0e-15);
    }

    #[test]
    fn regularization_gives_up_after_bounded_attempts() {
        let bad = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        let policy = FactorizationPolicy::Regularize {
            initial_jitter: 1.0e-10,
            growth: 10.0,
            max_attempts: 3,
        };
        match CorrelationFactor::factorize(&bad, policy).unwrap_err() {
            RiskError::NonPositiveDefiniteCovariance { attempts, pivot, .. } => {
                assert_eq!(attempts, 4);
                assert_eq!(pivot, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn asymmetric_and_non_square_inputs_are_rejected() {
        let asym = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.4, 1.0]);
        assert!(matches!(
            CorrelationFactor::factorize(&asym, FactorizationPolicy::Strict),
            Err(RiskError::NonPositiveDefiniteCovariance { .. })
        ));

        let rect = DMatrix::from_row_slice(1, 2, &[1.0, 0.5]);
        assert!(matches!(
            CorrelationFactor::factorize(&rect, FactorizationPolicy::Strict),
            Err(RiskError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn batch_correlation_matches_vector_correlation() {
        let f = CorrelationFactor::factorize(&two_asset_cov(0.6), FactorizationPolicy::Strict)
            .unwrap();
        let z = DMatrix::from_row_slice(2, 2, &[0.3, -1.2, 1.5, 0.7]);
        let batch = f.correlate_rows(&z);
        for p in 0..2 {
            let single = f.correlate(&z.row(p).transpose());
            for i in 0..2 {
                assert_relative_eq!(batch[(p, i)], single[i], epsilon = 1.0e-16);
            }
        }
    }
}
