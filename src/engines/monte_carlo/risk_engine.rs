//! End-to-end Monte Carlo risk pipeline.
//!
//! price history -> return statistics -> correlated GBM -> path ensemble -> risk report.
//! The covariance is factored once per run; the configuration is validated before
//! any estimation or simulation work.

use tracing::info;

use crate::core::{Result, RiskError, SimulationConfig};
use crate::market::{GapPolicy, PriceHistory};
use crate::math::FactorizationPolicy;
use crate::mc::{DEFAULT_BATCH_PATHS, PathEnsemble, PathSimulator};
use crate::models::{CorrelatedGbm, ReturnStatistics};
use crate::risk::{RiskReport, RiskSummarizer, StreamingRiskAccumulator, ValueBands, value_bands};

/// Output of one engine run.
#[derive(Debug, Clone)]
pub struct RiskRun {
    /// Statistics the simulation was calibrated to.
    pub statistics: ReturnStatistics,
    pub report: RiskReport,
    /// Full ensemble; `None` for streaming runs.
    pub ensemble: Option<PathEnsemble>,
}

impl RiskRun {
    /// Percentile paths of portfolio value; needs a retained ensemble.
    pub fn value_bands(&self, percentiles: &[f64]) -> Result<ValueBands> {
        let ensemble = self
            .ensemble
            .as_ref()
            .ok_or_else(|| RiskError::insufficient_data("retained path ensemble", 1, 0))?;
        value_bands(ensemble.portfolio_values(), percentiles)
    }
}

/// Monte Carlo portfolio risk engine.
#[derive(Debug, Clone)]
pub struct MonteCarloRiskEngine {
    pub config: SimulationConfig,
    /// How the covariance matrix is factored.
    pub factorization: FactorizationPolicy,
    /// How misaligned price histories are resolved.
    pub gap_policy: GapPolicy,
    /// Paths generated per batch.
    pub batch_paths: usize,
}

impl MonteCarloRiskEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            factorization: FactorizationPolicy::default(),
            gap_policy: GapPolicy::default(),
            batch_paths: DEFAULT_BATCH_PATHS,
        }
    }

    pub fn with_factorization(mut self, factorization: FactorizationPolicy) -> Self {
        self.factorization = factorization;
        self
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    pub fn with_batch_paths(mut self, batch_paths: usize) -> Self {
        self.batch_paths = batch_paths.max(1);
        self
    }

    /// Estimates, simulates and summarizes, keeping the full ensemble.
    pub fn run(&self, history: &PriceHistory) -> Result<RiskRun> {
        self.config.validate_for_assets(history.n_assets())?;
        let statistics = ReturnStatistics::from_history(history, self.gap_policy)?;
        self.run_statistics(statistics)
    }

    /// Simulates and summarizes from already-estimated statistics.
    pub fn run_statistics(&self, statistics: ReturnStatistics) -> Result<RiskRun> {
        let ensemble = self.simulate(&statistics)?;
        let report = RiskSummarizer::summarize_ensemble(&ensemble)?;
        self.log_report(&report);
        Ok(RiskRun {
            statistics,
            report,
            ensemble: Some(ensemble),
        })
    }

    /// Like [`run`](Self::run), but reduces batch by batch so at most one batch
    /// of prices is held in memory. The report equals the one `run` produces.
    pub fn run_streaming(&self, history: &PriceHistory) -> Result<RiskRun> {
        self.config.validate_for_assets(history.n_assets())?;
        let statistics = ReturnStatistics::from_history(history, self.gap_policy)?;
        self.run_statistics_streaming(statistics)
    }

    pub fn run_statistics_streaming(&self, statistics: ReturnStatistics) -> Result<RiskRun> {
        let simulator = self.simulator(&statistics)?;
        let mut acc =
            StreamingRiskAccumulator::with_capacity(self.config.initial_value, self.config.n_paths);
        simulator.simulate_batches(&self.config, |batch| acc.push_ensemble(&batch))?;
        let report = acc.finalize()?;
        self.log_report(&report);
        Ok(RiskRun {
            statistics,
            report,
            ensemble: None,
        })
    }

    /// Simulates the path ensemble for `statistics` under this engine's settings.
    pub fn simulate(&self, statistics: &ReturnStatistics) -> Result<PathEnsemble> {
        self.simulator(statistics)?.simulate(&self.config)
    }

    fn simulator(&self, statistics: &ReturnStatistics) -> Result<PathSimulator> {
        self.config.validate_for_assets(statistics.n_assets())?;
        info!(
            assets = statistics.n_assets(),
            n_paths = self.config.n_paths,
            horizon_days = self.config.horizon_days,
            seed = ?self.config.seed,
            "starting Monte Carlo risk run"
        );
        let dynamics = CorrelatedGbm::from_statistics(statistics, self.factorization)?;
        Ok(PathSimulator::new(dynamics, statistics.last_prices().clone())?
            .with_batch_paths(self.batch_paths))
    }

    fn log_report(&self, report: &RiskReport) {
        info!(
            seed = ?report.seed,
            var_95 = report.var_95,
            cvar_95 = report.cvar_95,
            var_99 = report.var_99,
            cvar_99 = report.cvar_99,
            prob_loss = report.prob_loss,
            "Monte Carlo risk run finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::market::PriceSeries;

    fn history() -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        PriceHistory::from_series([
            PriceSeries::from_daily_closes("AAA", start, &[10.0, 10.2, 10.1, 10.4, 10.3, 10.6])
                .unwrap(),
            PriceSeries::from_daily_closes("BBB", start, &[20.0, 19.8, 20.3, 20.1, 20.6, 20.5])
                .unwrap(),
        ])
        .unwrap()
    }

    fn config(n_paths: usize) -> SimulationConfig {
        SimulationConfig::builder()
            .horizon_days(5)
            .n_paths(n_paths)
            .seed(7)
            .initial_value(1_000.0)
            .equal_weights(2)
            .build()
            .unwrap()
    }

    #[test]
    fn run_keeps_ensemble_and_seed() {
        let run = MonteCarloRiskEngine::new(config(500)).run(&history()).unwrap();
        let ens = run.ensemble.as_ref().unwrap();
        assert_eq!(ens.n_paths(), 500);
        assert_eq!(run.report.seed, Some(7));
        assert_eq!(run.statistics.n_assets(), 2);
        let fan = run.value_bands(&[0.05, 0.95]).unwrap();
        assert_eq!(fan.n_steps(), 6);
    }

    #[test]
    fn streaming_run_matches_batch_run() {
        let engine = MonteCarloRiskEngine::new(config(700)).with_batch_paths(128);
        let full = engine.run(&history()).unwrap();
        let streamed = engine.run_streaming(&history()).unwrap();
        assert_eq!(full.report, streamed.report);
        assert!(streamed.ensemble.is_none());
        assert!(streamed.value_bands(&[0.5]).is_err());
    }

    #[test]
    fn weight_count_is_checked_before_estimation() {
        let mut cfg = config(10);
        cfg.weights = vec![1.0];
        assert!(matches!(
            MonteCarloRiskEngine::new(cfg).run(&history()),
            Err(RiskError::InvalidConfig { .. })
        ));
    }
}
