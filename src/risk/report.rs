//! Reduction of simulated portfolio values into a [`RiskReport`].
//!
//! The summarizer only reads the value table; summarizing the same ensemble
//! twice yields identical reports.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Result, RiskError, TRADING_DAYS_PER_YEAR};
use crate::math::{empirical_quantile, mean, sample_std_dev, sorted};
use crate::mc::PathEnsemble;
use crate::risk::drawdown::max_drawdowns;
use crate::risk::var::{probability_of_loss, tail_risk_sorted};

/// Location and spread of a sample.
///
/// Percentiles use the same linear interpolation as VaR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
}

impl DistributionSummary {
    pub fn from_sample(sample: &[f64]) -> Result<Self> {
        if sample.is_empty() {
            return Err(RiskError::insufficient_data("distribution summary", 1, 0));
        }
        Ok(Self::from_sorted(&sorted(sample)))
    }

    fn from_sorted(s: &[f64]) -> Self {
        Self {
            mean: mean(s),
            median: empirical_quantile(s, 0.5),
            std_dev: sample_std_dev(s),
            min: s[0],
            max: s[s.len() - 1],
            p05: empirical_quantile(s, 0.05),
            p25: empirical_quantile(s, 0.25),
            p75: empirical_quantile(s, 0.75),
            p95: empirical_quantile(s, 0.95),
        }
    }
}

/// Distributional risk statistics of one simulated horizon.
///
/// VaR and CVaR are non-negative loss magnitudes in currency units of
/// `initial_value`. Drawdowns are fractions of the running peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub n_paths: usize,
    pub horizon_days: usize,
    pub initial_value: f64,
    /// Base seed of the ensemble, when summarized from one.
    pub seed: Option<u64>,

    pub var_95: f64,
    pub cvar_95: f64,
    pub var_99: f64,
    pub cvar_99: f64,
    pub prob_loss: f64,

    /// Mean horizon P&L relative to `initial_value`.
    pub expected_return: f64,
    /// Standard deviation of horizon P&L relative to `initial_value`.
    pub return_volatility: f64,
    /// `(expected_return / return_volatility) * sqrt(252 / horizon_days)`; 0 when undefined.
    pub sharpe_ratio: f64,

    pub pnl: DistributionSummary,
    pub final_value: DistributionSummary,
    pub drawdown: DistributionSummary,
    /// Per-path maximum drawdown, in path order.
    pub max_drawdown_distribution: Vec<f64>,
}

/// Computes [`RiskReport`]s from portfolio-value tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskSummarizer;

impl RiskSummarizer {
    /// Summarizes a `paths x (horizon + 1)` portfolio-value table.
    pub fn summarize(values: &DMatrix<f64>, initial_value: f64) -> Result<RiskReport> {
        if values.ncols() == 0 {
            return Err(RiskError::insufficient_data("portfolio value steps", 1, 0));
        }
        let last = values.ncols() - 1;
        let finals: Vec<f64> = values.column(last).iter().copied().collect();
        Self::from_outcomes(&finals, max_drawdowns(values), initial_value, last)
    }

    /// Summarizes an ensemble and records its seed.
    pub fn summarize_ensemble(ensemble: &PathEnsemble) -> Result<RiskReport> {
        let mut report = Self::summarize(ensemble.portfolio_values(), ensemble.initial_value())?;
        report.seed = Some(ensemble.seed());
        Ok(report)
    }

    /// VaR/CVaR of the horizon P&L at any confidence level.
    pub fn tail_risk(
        values: &DMatrix<f64>,
        initial_value: f64,
        confidence: f64,
    ) -> Result<super::TailRisk> {
        if values.ncols() == 0 {
            return Err(RiskError::insufficient_data("portfolio value steps", 1, 0));
        }
        let pnl: Vec<f64> = values
            .column(values.ncols() - 1)
            .iter()
            .map(|v| v - initial_value)
            .collect();
        super::tail_risk(&pnl, confidence)
    }

    /// Builds the report from per-path scalars (final value, max drawdown).
    pub(crate) fn from_outcomes(
        final_values: &[f64],
        drawdowns: Vec<f64>,
        initial_value: f64,
        horizon_days: usize,
    ) -> Result<RiskReport> {
        let n = final_values.len();
        if n == 0 {
            return Err(RiskError::insufficient_data("simulated paths", 1, 0));
        }
        if drawdowns.len() != n {
            return Err(RiskError::shape_mismatch("drawdown distribution", n, drawdowns.len()));
        }

        let pnl: Vec<f64> = final_values.iter().map(|v| v - initial_value).collect();
        let losses: Vec<f64> = sorted(&pnl.iter().map(|x| -x).collect::<Vec<_>>());
        let t95 = tail_risk_sorted(&losses, 0.95)?;
        let t99 = tail_risk_sorted(&losses, 0.99)?;

        let pnl_summary = DistributionSummary::from_sample(&pnl)?;
        let expected_return = pnl_summary.mean / initial_value;
        let return_volatility = pnl_summary.std_dev / initial_value;
        let sharpe_ratio = if return_volatility > 0.0 && horizon_days > 0 {
            (expected_return / return_volatility)
                * (TRADING_DAYS_PER_YEAR / horizon_days as f64).sqrt()
        } else {
            0.0
        };

        let report = RiskReport {
            n_paths: n,
            horizon_days,
            initial_value,
            seed: None,
            var_95: t95.var,
            cvar_95: t95.cvar,
            var_99: t99.var,
            cvar_99: t99.cvar,
            prob_loss: probability_of_loss(&pnl),
            expected_return,
            return_volatility,
            sharpe_ratio,
            pnl: pnl_summary,
            final_value: DistributionSummary::from_sample(final_values)?,
            drawdown: DistributionSummary::from_sample(&drawdowns)?,
            max_drawdown_distribution: drawdowns,
        };
        debug!(
            n_paths = n,
            horizon_days,
            var_95 = report.var_95,
            var_99 = report.var_99,
            "summarized ensemble"
        );
        Ok(report)
    }
}
