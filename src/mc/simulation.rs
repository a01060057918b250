//! Ensemble path simulation under correlated GBM dynamics.
//!
//! References: Glasserman (2004), Sec. 3.2 (multi-dimensional GBM, exact log-normal
//! stepping) and Hull (11th ed.) Ch. 21 (Monte Carlo simulation of correlated assets).
//!
//! Paths are generated in fixed-size batches. Within a batch each step is one
//! matrix operation over all paths: draw an `n x N` block of normals, map it
//! through `L^T`, add the Itô-corrected drift and exponentiate. Batch size never
//! changes path values because every path has its own random stream.

use nalgebra::{DMatrix, DVector};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::core::{Result, RiskError, SimulationConfig};
use crate::mc::rng::{fill_standard_normals, path_rng, resolve_base_seed};
use crate::models::CorrelatedGbm;

/// Default number of paths generated per batch.
pub const DEFAULT_BATCH_PATHS: usize = 4_096;

/// Simulated per-asset prices and the derived portfolio-value table.
///
/// Prices are stored as `horizon_days + 1` time slices, each `n_paths x n_assets`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEnsemble {
    slices: Vec<DMatrix<f64>>,
    values: DMatrix<f64>,
    initial_value: f64,
    seed: u64,
}

impl PathEnsemble {
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn horizon_days(&self) -> usize {
        self.slices.len().saturating_sub(1)
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.slices.first().map_or(0, DMatrix::ncols)
    }

    /// Base seed the ensemble was drawn from; replaying it reproduces the run.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Simulated price of `asset` on `path` at `step`.
    #[inline]
    pub fn price(&self, path: usize, step: usize, asset: usize) -> f64 {
        self.slices[step][(path, asset)]
    }

    /// All path prices at `step` (`n_paths x n_assets`).
    #[inline]
    pub fn slice(&self, step: usize) -> &DMatrix<f64> {
        &self.slices[step]
    }

    /// Price trajectory of one asset along one path.
    pub fn asset_path(&self, path: usize, asset: usize) -> Vec<f64> {
        self.slices.iter().map(|s| s[(path, asset)]).collect()
    }

    /// Portfolio value per path (rows) and step (columns).
    #[inline]
    pub fn portfolio_values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Portfolio value at the horizon, per path.
    pub fn final_values(&self) -> Vec<f64> {
        let last = self.values.ncols() - 1;
        self.values.column(last).iter().copied().collect()
    }

    /// Horizon P&L per path: final value minus `initial_value`.
    pub fn pnl(&self) -> Vec<f64> {
        self.final_values()
            .into_iter()
            .map(|v| v - self.initial_value)
            .collect()
    }

    /// Stacks batches (in order) into one ensemble.
    fn concat(batches: Vec<PathEnsemble>) -> Option<PathEnsemble> {
        let first = batches.first()?;
        let n_paths: usize = batches.iter().map(PathEnsemble::n_paths).sum();
        let n_assets = first.n_assets();
        let n_steps = first.slices.len();
        let (initial_value, seed) = (first.initial_value, first.seed);

        let mut slices = vec![DMatrix::<f64>::zeros(n_paths, n_assets); n_steps];
        let mut values = DMatrix::<f64>::zeros(n_paths, n_steps);
        let mut offset = 0;
        for batch in &batches {
            let n = batch.n_paths();
            for (dst, src) in slices.iter_mut().zip(&batch.slices) {
                dst.view_mut((offset, 0), (n, n_assets)).copy_from(src);
            }
            values
                .view_mut((offset, 0), (n, n_steps))
                .copy_from(&batch.values);
            offset += n;
        }

        Some(PathEnsemble {
            slices,
            values,
            initial_value,
            seed,
        })
    }
}

/// Propagates an ensemble of price paths from the last observed prices.
#[derive(Debug, Clone)]
pub struct PathSimulator {
    dynamics: CorrelatedGbm,
    initial_prices: DVector<f64>,
    batch_paths: usize,
}

impl PathSimulator {
    pub fn new(dynamics: CorrelatedGbm, initial_prices: DVector<f64>) -> Result<Self> {
        let n = dynamics.n_assets();
        if initial_prices.len() != n {
            return Err(RiskError::shape_mismatch(
                "initial prices",
                n,
                initial_prices.len(),
            ));
        }
        if let Some(i) = initial_prices
            .iter()
            .position(|p| !p.is_finite() || *p <= 0.0)
        {
            return Err(RiskError::invalid_config(format!(
                "initial price for asset {i} must be finite and > 0"
            )));
        }
        Ok(Self {
            dynamics,
            initial_prices,
            batch_paths: DEFAULT_BATCH_PATHS,
        })
    }

    /// Overrides the number of paths generated per batch (minimum 1).
    pub fn with_batch_paths(mut self, batch_paths: usize) -> Self {
        self.batch_paths = batch_paths.max(1);
        self
    }

    #[inline]
    pub fn dynamics(&self) -> &CorrelatedGbm {
        &self.dynamics
    }

    #[inline]
    pub fn initial_prices(&self) -> &DVector<f64> {
        &self.initial_prices
    }

    #[inline]
    pub fn batch_paths(&self) -> usize {
        self.batch_paths
    }

    /// Simulates the full ensemble described by `config`.
    ///
    /// With the `parallel` feature, batches run on the rayon pool; the result is
    /// identical to the sequential run.
    pub fn simulate(&self, config: &SimulationConfig) -> Result<PathEnsemble> {
        config.validate_for_assets(self.dynamics.n_assets())?;
        let base_seed = resolve_base_seed(config.seed);
        let batches = self.batch_ranges(config.n_paths);

        #[cfg(feature = "parallel")]
        let parts: Vec<PathEnsemble> = batches
            .par_iter()
            .map(|&(first, n)| self.simulate_batch(config, base_seed, first, n))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let parts: Vec<PathEnsemble> = batches
            .iter()
            .map(|&(first, n)| self.simulate_batch(config, base_seed, first, n))
            .collect();

        PathEnsemble::concat(parts)
            .ok_or_else(|| RiskError::invalid_config("n_paths must be > 0"))
    }

    /// Simulates the ensemble batch by batch, handing each batch to `sink` and
    /// dropping it before the next is generated. Returns the base seed used.
    pub fn simulate_batches<F>(&self, config: &SimulationConfig, mut sink: F) -> Result<u64>
    where
        F: FnMut(PathEnsemble) -> Result<()>,
    {
        config.validate_for_assets(self.dynamics.n_assets())?;
        let base_seed = resolve_base_seed(config.seed);
        for (first, n) in self.batch_ranges(config.n_paths) {
            sink(self.simulate_batch(config, base_seed, first, n))?;
        }
        Ok(base_seed)
    }

    fn batch_ranges(&self, n_paths: usize) -> Vec<(usize, usize)> {
        (0..n_paths)
            .step_by(self.batch_paths)
            .map(|first| (first, self.batch_paths.min(n_paths - first)))
            .collect()
    }

    fn simulate_batch(
        &self,
        config: &SimulationConfig,
        base_seed: u64,
        first_path: usize,
        n_paths: usize,
    ) -> PathEnsemble {
        let n_assets = self.dynamics.n_assets();
        let horizon = config.horizon_days;

        let mut rngs: Vec<_> = (first_path..first_path + n_paths)
            .map(|p| path_rng(base_seed, p))
            .collect();

        let mut slices = Vec::with_capacity(horizon + 1);
        let mut current = DMatrix::from_fn(n_paths, n_assets, |_, j| self.initial_prices[j]);
        slices.push(current.clone());

        let mut z = DMatrix::<f64>::zeros(n_paths, n_assets);
        let mut draws = vec![0.0; n_assets];
        for _ in 0..horizon {
            for (p, rng) in rngs.iter_mut().enumerate() {
                fill_standard_normals(rng, &mut draws);
                for (j, d) in draws.iter().enumerate() {
                    z[(p, j)] = *d;
                }
            }
            let increments = self.dynamics.log_increments(&z);
            current = self.dynamics.step_exact(&current, &increments);
            slices.push(current.clone());
        }

        let values = self.portfolio_values(&slices, &config.weights, config.initial_value);
        debug!(first_path, n_paths, horizon, "simulated path batch");

        PathEnsemble {
            slices,
            values,
            initial_value: config.initial_value,
            seed: base_seed,
        }
    }

    /// `V_t = V_0 * sum_i w_i * S_{t,i} / S_{0,i}`; the first column is exactly `V_0`.
    fn portfolio_values(
        &self,
        slices: &[DMatrix<f64>],
        weights: &[f64],
        initial_value: f64,
    ) -> DMatrix<f64> {
        let n_paths = slices.first().map_or(0, DMatrix::nrows);
        let coef = DVector::from_fn(weights.len(), |i, _| weights[i] / self.initial_prices[i]);

        let mut values = DMatrix::<f64>::from_element(n_paths, slices.len(), initial_value);
        for (t, slice) in slices.iter().enumerate().skip(1) {
            let v = slice * &coef * initial_value;
            values.set_column(t, &v);
        }
        values
    }
}
