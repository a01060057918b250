//! Drift and covariance estimation from historical daily log returns.
//!
//! Estimates are per period (daily for daily closes). Nothing is annualized
//! here; the annualized accessors exist for reporting only.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Result, RiskError, TRADING_DAYS_PER_YEAR};
use crate::market::{AlignedPrices, GapPolicy, PriceHistory};
use crate::math::{column_means, covariance_to_correlation, log_return_matrix, sample_covariance};

/// Per-asset log-return statistics estimated from an aligned price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatistics {
    tickers: Vec<String>,
    returns: DMatrix<f64>,
    drift: DVector<f64>,
    covariance: DMatrix<f64>,
    last_prices: DVector<f64>,
}

impl ReturnStatistics {
    /// Estimates log returns, sample-mean drift and unbiased sample covariance.
    ///
    /// Needs at least three prices per asset (two returns) since covariance is
    /// undefined from a single return.
    pub fn estimate(prices: &AlignedPrices) -> Result<Self> {
        let returns = log_return_matrix(prices.prices())?;
        let drift = column_means(&returns);
        let covariance = sample_covariance(&returns)?;
        let last_prices = prices
            .last_prices()
            .ok_or_else(|| RiskError::insufficient_data("log returns", 2, 0))?;

        debug!(
            assets = prices.n_assets(),
            returns = returns.nrows(),
            "estimated drift and covariance"
        );

        Ok(Self {
            tickers: prices.tickers().to_vec(),
            returns,
            drift,
            covariance,
            last_prices,
        })
    }

    /// Aligns `history` under `policy` and estimates statistics from it.
    pub fn from_history(history: &PriceHistory, policy: GapPolicy) -> Result<Self> {
        Self::estimate(&history.align(policy)?)
    }

    /// Builds statistics from known parameters without a return history.
    ///
    /// The return table is left empty (`0 x N`).
    pub fn from_parts(
        tickers: Vec<String>,
        drift: DVector<f64>,
        covariance: DMatrix<f64>,
        last_prices: DVector<f64>,
    ) -> Result<Self> {
        let n = tickers.len();
        if n == 0 {
            return Err(RiskError::insufficient_data("assets", 1, 0));
        }
        if drift.len() != n {
            return Err(RiskError::shape_mismatch("drift vector", n, drift.len()));
        }
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(RiskError::shape_mismatch(
                "covariance matrix",
                n,
                covariance.nrows().max(covariance.ncols()),
            ));
        }
        if last_prices.len() != n {
            return Err(RiskError::shape_mismatch("last prices", n, last_prices.len()));
        }
        if let Some(i) = last_prices.iter().position(|p| !p.is_finite() || *p <= 0.0) {
            return Err(RiskError::invalid_series(
                tickers[i].clone(),
                "last price must be finite and > 0",
            ));
        }
        Ok(Self {
            tickers,
            returns: DMatrix::zeros(0, n),
            drift,
            covariance,
            last_prices,
        })
    }

    #[inline]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// `(T-1) x N` log-return table.
    #[inline]
    pub fn returns(&self) -> &DMatrix<f64> {
        &self.returns
    }

    /// Mean log return per period.
    #[inline]
    pub fn drift(&self) -> &DVector<f64> {
        &self.drift
    }

    /// Sample covariance of log returns per period.
    #[inline]
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Last observed price per asset.
    #[inline]
    pub fn last_prices(&self) -> &DVector<f64> {
        &self.last_prices
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Per-period log-return volatility.
    pub fn volatility(&self) -> DVector<f64> {
        self.covariance.diagonal().map(|v| v.max(0.0).sqrt())
    }

    pub fn correlation(&self) -> DMatrix<f64> {
        covariance_to_correlation(&self.covariance)
    }

    /// Drift scaled by `periods_per_year`.
    pub fn annualized_drift(&self, periods_per_year: f64) -> DVector<f64> {
        &self.drift * periods_per_year
    }

    /// Volatility scaled by `sqrt(periods_per_year)`.
    pub fn annualized_volatility(&self, periods_per_year: f64) -> DVector<f64> {
        self.volatility() * periods_per_year.sqrt()
    }

    /// Annualized drift and volatility assuming daily data.
    pub fn annualized_daily(&self) -> (DVector<f64>, DVector<f64>) {
        (
            self.annualized_drift(TRADING_DAYS_PER_YEAR),
            self.annualized_volatility(TRADING_DAYS_PER_YEAR),
        )
    }
}
