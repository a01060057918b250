use serde::{Deserialize, Serialize};

use crate::core::{Result, RiskError};

/// Tolerance applied when checking that portfolio weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1.0e-6;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Explicit parameterization of one simulation run.
///
/// `weights` are allocation fractions of `initial_value` and follow the asset
/// order of the price history the run is estimated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of forecast steps (trading days). Zero yields a single time slice.
    pub horizon_days: usize,
    /// Number of simulated paths.
    pub n_paths: usize,
    /// Seed for reproducible ensembles; `None` draws a fresh base seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Portfolio value at the start of the horizon.
    pub initial_value: f64,
    /// Non-negative allocation fractions summing to one.
    pub weights: Vec<f64>,
}

impl SimulationConfig {
    /// Returns a builder with the reference run's defaults
    /// (20 days, 20 000 paths, unit initial value).
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Equal allocation across `n_assets`.
    pub fn equal_weights(n_assets: usize) -> Vec<f64> {
        if n_assets == 0 {
            return Vec::new();
        }
        vec![1.0 / n_assets as f64; n_assets]
    }

    /// Number of assets implied by the weight vector.
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.weights.len()
    }

    /// Checks every constraint on the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_paths == 0 {
            return Err(RiskError::invalid_config("n_paths must be > 0"));
        }
        if !self.initial_value.is_finite() || self.initial_value <= 0.0 {
            return Err(RiskError::invalid_config(format!(
                "initial_value must be finite and > 0, got {}",
                self.initial_value
            )));
        }
        if self.weights.is_empty() {
            return Err(RiskError::invalid_config("weights must not be empty"));
        }
        if let Some((i, w)) = self
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(RiskError::invalid_config(format!(
                "weight {i} must be finite and >= 0, got {w}"
            )));
        }
        let total: f64 = self.weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RiskError::invalid_config(format!(
                "weights must sum to 1 (tolerance {WEIGHT_SUM_TOLERANCE}), got {total}"
            )));
        }
        Ok(())
    }

    /// Validates the configuration against the number of simulated assets.
    pub fn validate_for_assets(&self, n_assets: usize) -> Result<()> {
        self.validate()?;
        if self.weights.len() != n_assets {
            return Err(RiskError::invalid_config(format!(
                "expected {n_assets} weights (one per asset), got {}",
                self.weights.len()
            )));
        }
        Ok(())
    }
}

/// Builder for [`SimulationConfig`].
#[derive(Debug, Clone)]
pub struct SimulationConfigBuilder {
    horizon_days: usize,
    n_paths: usize,
    seed: Option<u64>,
    initial_value: f64,
    weights: Vec<f64>,
}

impl Default for SimulationConfigBuilder {
    fn default() -> Self {
        Self {
            horizon_days: 20,
            n_paths: 20_000,
            seed: None,
            initial_value: 1.0,
            weights: Vec::new(),
        }
    }
}

impl SimulationConfigBuilder {
    /// Sets the forecast horizon in trading days.
    #[inline]
    pub fn horizon_days(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    /// Sets the number of simulated paths.
    #[inline]
    pub fn n_paths(mut self, n_paths: usize) -> Self {
        self.n_paths = n_paths;
        self
    }

    /// Fixes the seed for a reproducible ensemble.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the starting portfolio value.
    #[inline]
    pub fn initial_value(mut self, initial_value: f64) -> Self {
        self.initial_value = initial_value;
        self
    }

    /// Sets allocation weights.
    pub fn weights(mut self, weights: impl Into<Vec<f64>>) -> Self {
        self.weights = weights.into();
        self
    }

    /// Uses an equal-weight allocation across `n_assets`.
    pub fn equal_weights(mut self, n_assets: usize) -> Self {
        self.weights = SimulationConfig::equal_weights(n_assets);
        self
    }

    /// Validates and builds a [`SimulationConfig`].
    pub fn build(self) -> Result<SimulationConfig> {
        let config = SimulationConfig {
            horizon_days: self.horizon_days,
            n_paths: self.n_paths,
            seed: self.seed,
            initial_value: self.initial_value,
            weights: self.weights,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_follow_reference_run() {
        let cfg = SimulationConfig::builder()
            .equal_weights(4)
            .seed(42)
            .build()
            .unwrap();
        assert_eq!(cfg.horizon_days, 20);
        assert_eq!(cfg.n_paths, 20_000);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.weights, vec![0.25; 4]);
    }

    #[test]
    fn weights_not_summing_to_one_are_rejected() {
        let err = SimulationConfig::builder()
            .weights(vec![0.3, 0.3])
            .build()
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig { .. }));
    }

    #[test]
    fn negative_weight_is_rejected_even_when_sum_is_one() {
        let err = SimulationConfig::builder()
            .weights(vec![1.5, -0.5])
            .build()
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig { .. }));
    }

    #[test]
    fn zero_paths_and_bad_initial_value_are_rejected() {
        assert!(
            SimulationConfig::builder()
                .weights(vec![1.0])
                .n_paths(0)
                .build()
                .is_err()
        );
        assert!(
            SimulationConfig::builder()
                .weights(vec![1.0])
                .initial_value(0.0)
                .build()
                .is_err()
        );
        assert!(
            SimulationConfig::builder()
                .weights(vec![1.0])
                .initial_value(f64::NAN)
                .build()
                .is_err()
        );
    }

    #[test]
    fn zero_horizon_is_a_valid_degenerate_run() {
        let cfg = SimulationConfig::builder()
            .weights(vec![1.0])
            .horizon_days(0)
            .build()
            .unwrap();
        assert_eq!(cfg.horizon_days, 0);
    }

    #[test]
    fn weight_count_must_match_assets() {
        let cfg = SimulationConfig::builder()
            .equal_weights(2)
            .build()
            .unwrap();
        assert!(cfg.validate_for_assets(2).is_ok());
        assert!(matches!(
            cfg.validate_for_assets(3),
            Err(RiskError::InvalidConfig { .. })
        ));
    }
}
