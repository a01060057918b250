//! Value-at-Risk and Conditional VaR from a simulated P&L sample.
//!
//! Conventions used throughout:
//! - loss-positive: `loss = -pnl`, and both metrics are reported as non-negative
//!   loss magnitudes (a tail that is entirely gains reports `0`);
//! - VaR at confidence `c` is the empirical `c`-quantile of losses (equivalently
//!   the negated `(1 - c)`-quantile of P&L) with linear interpolation between
//!   order statistics (Hyndman-Fan type 7);
//! - CVaR at `c` is the mean of all losses at or beyond the unclamped quantile,
//!   so the tail always holds at least the worst sample.
//!
//! Confidence levels must lie in `(0, 1)`.
//!
//! References:
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2015), Sec. 2.3.
//! - Acerbi and Tasche (2002), expected shortfall as a coherent tail mean.

use serde::{Deserialize, Serialize};

use crate::core::{Result, RiskError};
use crate::math::{empirical_quantile, sorted};

/// VaR and CVaR at one confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    pub confidence: f64,
    pub var: f64,
    pub cvar: f64,
    /// Number of samples averaged into `cvar`.
    pub tail_samples: usize,
}

/// Value-at-Risk of a P&L sample, as a non-negative loss.
///
/// # Examples
/// ```rust
/// use mcrisk::risk::var::value_at_risk;
///
/// // Every outcome is a gain, so there is no loss to report.
/// assert_eq!(value_at_risk(&[1.0, 2.0, 3.0], 0.95).unwrap(), 0.0);
///
/// // Losses 3, 2, 1, 0, -1: the 0.95 quantile sits at rank 3.8.
/// let var_95 = value_at_risk(&[-3.0, -2.0, -1.0, 0.0, 1.0], 0.95).unwrap();
/// assert!((var_95 - 2.8).abs() < 1e-12);
/// ```
pub fn value_at_risk(pnl: &[f64], confidence: f64) -> Result<f64> {
    tail_risk(pnl, confidence).map(|t| t.var)
}

/// Conditional VaR (expected shortfall) of a P&L sample.
///
/// # Examples
/// ```rust
/// use mcrisk::risk::var::{conditional_value_at_risk, value_at_risk};
///
/// let pnl = [-3.0, -2.0, -1.0, 0.5, 1.0];
/// let var_95 = value_at_risk(&pnl, 0.95).unwrap();
/// let cvar_95 = conditional_value_at_risk(&pnl, 0.95).unwrap();
/// assert!(cvar_95 >= var_95);
/// ```
pub fn conditional_value_at_risk(pnl: &[f64], confidence: f64) -> Result<f64> {
    tail_risk(pnl, confidence).map(|t| t.cvar)
}

/// VaR and CVaR computed from one sort of the sample.
pub fn tail_risk(pnl: &[f64], confidence: f64) -> Result<TailRisk> {
    validate_inputs(pnl, confidence)?;
    let losses: Vec<f64> = pnl.iter().map(|x| -x).collect();
    tail_risk_sorted(&sorted(&losses), confidence)
}

/// Tail metrics from losses already sorted ascending.
pub(crate) fn tail_risk_sorted(sorted_losses: &[f64], confidence: f64) -> Result<TailRisk> {
    validate_inputs(sorted_losses, confidence)?;

    let threshold = empirical_quantile(sorted_losses, confidence);
    let start = sorted_losses.partition_point(|l| *l < threshold);
    let tail = &sorted_losses[start..];
    if tail.is_empty() {
        return Err(RiskError::EmptyTail {
            confidence,
            samples: sorted_losses.len(),
        });
    }

    let tail_mean = tail.iter().sum::<f64>() / tail.len() as f64;
    let var = threshold.max(0.0);
    // The tail mean can round below a flat tail's threshold.
    let cvar = tail_mean.max(threshold).max(0.0);

    Ok(TailRisk {
        confidence,
        var,
        cvar,
        tail_samples: tail.len(),
    })
}

/// Fraction of outcomes with strictly negative P&L.
pub fn probability_of_loss(pnl: &[f64]) -> f64 {
    if pnl.is_empty() {
        return 0.0;
    }
    pnl.iter().filter(|x| **x < 0.0).count() as f64 / pnl.len() as f64
}

pub(crate) fn validate_confidence(confidence: f64) -> Result<()> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(RiskError::invalid_config(format!(
            "confidence must be in (0, 1), got {confidence}"
        )));
    }
    Ok(())
}

fn validate_inputs(sample: &[f64], confidence: f64) -> Result<()> {
    validate_confidence(confidence)?;
    if sample.is_empty() {
        return Err(RiskError::insufficient_data("P&L sample", 1, 0));
    }
    if sample.iter().any(|x| !x.is_finite()) {
        return Err(RiskError::invalid_config("P&L sample must be finite"));
    }
    Ok(())
}
