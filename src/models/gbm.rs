use nalgebra::{DMatrix, DVector};

use crate::core::{Result, RiskError};
use crate::math::{CorrelationFactor, FactorizationPolicy};
use crate::models::ReturnStatistics;

/// Multi-asset geometric Brownian motion in per-period units.
///
/// One step of the exact log-normal scheme is
/// `S_{t+1,i} = S_{t,i} exp((mu_i - 0.5 Σ_ii) + (L z)_i)`.
/// The `-0.5 Σ_ii` Itô correction uses the variance actually simulated, which
/// includes any regularization jitter carried by the factor.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedGbm {
    drift: DVector<f64>,
    corrected_drift: DVector<f64>,
    factor: CorrelationFactor,
}

impl CorrelatedGbm {
    /// Factors `covariance` once under `policy` and builds the dynamics.
    pub fn new(
        drift: &DVector<f64>,
        covariance: &DMatrix<f64>,
        policy: FactorizationPolicy,
    ) -> Result<Self> {
        let factor = CorrelationFactor::factorize(covariance, policy)?;
        Self::from_factor(drift, covariance, factor)
    }

    /// Builds dynamics from estimated return statistics.
    pub fn from_statistics(stats: &ReturnStatistics, policy: FactorizationPolicy) -> Result<Self> {
        Self::new(stats.drift(), stats.covariance(), policy)
    }

    /// Builds dynamics from a precomputed factor of `covariance`.
    pub fn from_factor(
        drift: &DVector<f64>,
        covariance: &DMatrix<f64>,
        factor: CorrelationFactor,
    ) -> Result<Self> {
        let n = factor.dimension();
        if drift.len() != n {
            return Err(RiskError::shape_mismatch("drift vector", n, drift.len()));
        }
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(RiskError::shape_mismatch(
                "covariance matrix",
                n,
                covariance.nrows(),
            ));
        }
        if let Some(i) = drift.iter().position(|m| !m.is_finite()) {
            return Err(RiskError::invalid_config(format!(
                "drift for asset {i} must be finite"
            )));
        }

        let jitter = factor.jitter();
        let corrected_drift =
            DVector::from_fn(n, |i, _| drift[i] - 0.5 * (covariance[(i, i)] + jitter));

        Ok(Self {
            drift: drift.clone(),
            corrected_drift,
            factor,
        })
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.drift.len()
    }

    /// Mean log return per period before the Itô correction.
    #[inline]
    pub fn drift(&self) -> &DVector<f64> {
        &self.drift
    }

    /// `mu_i - 0.5 Σ_ii`, the deterministic part of each log increment.
    #[inline]
    pub fn corrected_drift(&self) -> &DVector<f64> {
        &self.corrected_drift
    }

    #[inline]
    pub fn factor(&self) -> &CorrelationFactor {
        &self.factor
    }

    /// Log increments for a batch of paths: `Z L^T + 1 (mu - 0.5 diag Σ)^T`.
    ///
    /// `independent` holds one row of standard normals per path.
    pub fn log_increments(&self, independent: &DMatrix<f64>) -> DMatrix<f64> {
        let mut increments = self.factor.correlate_rows(independent);
        for (j, mut col) in increments.column_iter_mut().enumerate() {
            col.add_scalar_mut(self.corrected_drift[j]);
        }
        increments
    }

    /// Advances every path one period: `S <- S * exp(increment)` element-wise.
    pub fn step_exact(&self, prices: &DMatrix<f64>, increments: &DMatrix<f64>) -> DMatrix<f64> {
        prices.component_mul(&increments.map(f64::exp))
    }
}
