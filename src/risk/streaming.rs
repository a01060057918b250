//! Incremental risk reduction over batches of simulated paths.
//!
//! Each batch contributes one final value and one maximum drawdown per path;
//! the batch itself can be dropped afterwards. Finalizing yields the same
//! [`RiskReport`] a full-ensemble summary would, provided batches are pushed
//! in path order.

use nalgebra::DMatrix;

use crate::core::{Result, RiskError};
use crate::mc::PathEnsemble;
use crate::risk::drawdown::max_drawdowns;
use crate::risk::report::{RiskReport, RiskSummarizer};

#[derive(Debug, Clone)]
pub struct StreamingRiskAccumulator {
    initial_value: f64,
    n_steps: Option<usize>,
    seed: Option<u64>,
    final_values: Vec<f64>,
    drawdowns: Vec<f64>,
}

impl StreamingRiskAccumulator {
    pub fn new(initial_value: f64) -> Self {
        Self {
            initial_value,
            n_steps: None,
            seed: None,
            final_values: Vec::new(),
            drawdowns: Vec::new(),
        }
    }

    /// Pre-allocates per-path storage for `n_paths` outcomes.
    pub fn with_capacity(initial_value: f64, n_paths: usize) -> Self {
        let mut acc = Self::new(initial_value);
        acc.final_values.reserve(n_paths);
        acc.drawdowns.reserve(n_paths);
        acc
    }

    /// Number of paths absorbed so far.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.final_values.len()
    }

    /// Absorbs a `paths x steps` portfolio-value batch.
    ///
    /// Every batch must span the same number of steps.
    pub fn push_values(&mut self, values: &DMatrix<f64>) -> Result<()> {
        let n_steps = values.ncols();
        if n_steps == 0 {
            return Err(RiskError::insufficient_data("portfolio value steps", 1, 0));
        }
        match self.n_steps {
            Some(expected) if expected != n_steps => {
                return Err(RiskError::shape_mismatch(
                    "streamed batch steps",
                    expected,
                    n_steps,
                ));
            }
            _ => self.n_steps = Some(n_steps),
        }
        self.final_values
            .extend(values.column(n_steps - 1).iter().copied());
        self.drawdowns.extend(max_drawdowns(values));
        Ok(())
    }

    /// Absorbs a simulated batch and records its seed.
    pub fn push_ensemble(&mut self, batch: &PathEnsemble) -> Result<()> {
        if batch.initial_value() != self.initial_value {
            return Err(RiskError::invalid_config(format!(
                "batch initial value {} differs from accumulator initial value {}",
                batch.initial_value(),
                self.initial_value
            )));
        }
        self.push_values(batch.portfolio_values())?;
        self.seed = Some(batch.seed());
        Ok(())
    }

    /// Produces the report over every absorbed path.
    pub fn finalize(self) -> Result<RiskReport> {
        let horizon_days = self
            .n_steps
            .map(|s| s - 1)
            .ok_or_else(|| RiskError::insufficient_data("simulated paths", 1, 0))?;
        let mut report = RiskSummarizer::from_outcomes(
            &self.final_values,
            self.drawdowns,
            self.initial_value,
            horizon_days,
        )?;
        report.seed = self.seed;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DMatrix<f64> {
        DMatrix::from_fn(10, 4, |r, c| {
            100.0 + (r as f64 - 4.5) * c as f64 + if c == 2 { -(r as f64) } else { 0.0 }
        })
    }

    #[test]
    fn batched_accumulation_matches_full_summary() {
        let full = table();
        let expected = RiskSummarizer::summarize(&full, 100.0).unwrap();

        let mut acc = StreamingRiskAccumulator::with_capacity(100.0, 10);
        acc.push_values(&full.rows(0, 3).into_owned()).unwrap();
        acc.push_values(&full.rows(3, 4).into_owned()).unwrap();
        acc.push_values(&full.rows(7, 3).into_owned()).unwrap();
        assert_eq!(acc.n_paths(), 10);

        assert_eq!(acc.finalize().unwrap(), expected);
    }

    #[test]
    fn mismatched_batch_width_is_rejected() {
        let mut acc = StreamingRiskAccumulator::new(100.0);
        acc.push_values(&DMatrix::from_element(2, 3, 100.0)).unwrap();
        assert!(matches!(
            acc.push_values(&DMatrix::from_element(2, 4, 100.0)),
            Err(RiskError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn empty_accumulator_cannot_finalize() {
        assert!(matches!(
            StreamingRiskAccumulator::new(1.0).finalize(),
            Err(RiskError::InsufficientData { .. })
        ));
    }
}
