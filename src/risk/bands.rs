//! Per-step percentile bands of the portfolio-value table (fan chart data).

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::core::{Result, RiskError};
use crate::math::{empirical_quantile, mean, sorted};

/// Percentile levels plotted by default: 5, 25, 50, 75 and 95.
pub const DEFAULT_BAND_PERCENTILES: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBands {
    /// Percentile levels in `[0, 1]`, in the order requested.
    pub percentiles: Vec<f64>,
    /// Cross-path mean value per step.
    pub mean: Vec<f64>,
    /// `bands[k][t]` is the `percentiles[k]` quantile of values at step `t`.
    pub bands: Vec<Vec<f64>>,
}

impl ValueBands {
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.mean.len()
    }

    /// Band for a requested percentile level, if present.
    pub fn band(&self, percentile: f64) -> Option<&[f64]> {
        self.percentiles
            .iter()
            .position(|p| (p - percentile).abs() < 1.0e-12)
            .map(|k| self.bands[k].as_slice())
    }
}

/// Mean path and percentile paths of a `paths x steps` value table.
pub fn value_bands(values: &DMatrix<f64>, percentiles: &[f64]) -> Result<ValueBands> {
    if values.nrows() == 0 || values.ncols() == 0 {
        return Err(RiskError::insufficient_data("value bands", 1, 0));
    }
    if let Some(p) = percentiles.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(RiskError::invalid_config(format!(
            "band percentile must be in [0, 1], got {p}"
        )));
    }

    let mut mean_path = Vec::with_capacity(values.ncols());
    let mut bands = vec![Vec::with_capacity(values.ncols()); percentiles.len()];
    for col in values.column_iter() {
        let step: Vec<f64> = col.iter().copied().collect();
        mean_path.push(mean(&step));
        let s = sorted(&step);
        for (band, &p) in bands.iter_mut().zip(percentiles) {
            band.push(empirical_quantile(&s, p));
        }
    }

    Ok(ValueBands {
        percentiles: percentiles.to_vec(),
        mean: mean_path,
        bands,
    })
}
