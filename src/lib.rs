//! `mcrisk` estimates the risk profile of a multi-asset portfolio by Monte Carlo:
//! it fits drift and covariance to historical log returns, injects cross-asset
//! correlation through a Cholesky factor, propagates an ensemble of correlated
//! geometric Brownian motion paths, and reduces the simulated portfolio values
//! into VaR, CVaR, probability of loss and drawdown statistics.
//!
//! References used across modules include:
//! - Glasserman (2004), *Monte Carlo Methods in Financial Engineering*, Ch. 2-3.
//! - McNeil, Frey, Embrechts (2015), *Quantitative Risk Management*, Ch. 2.
//! - Hyndman and Fan (1996) for sample quantile definitions.
//!
//! Numerical considerations:
//! - Estimates are per period; daily closes give daily drift and covariance.
//! - Rank-deficient covariance (perfectly correlated or constant assets) factors
//!   under the default semi-definite policy; see [`math::FactorizationPolicy`].
//! - Tail metrics are sample-size sensitive; quantiles interpolate linearly.
//!
//! # Feature Flags
//! - `parallel`: generates path batches on the Rayon pool. Results are identical
//!   to the sequential run.
//!
//! # Quick Start
//! ```rust
//! use chrono::NaiveDate;
//! use mcrisk::core::SimulationConfig;
//! use mcrisk::engines::MonteCarloRiskEngine;
//! use mcrisk::market::{PriceHistory, PriceSeries};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let history = PriceHistory::from_series([
//!     PriceSeries::from_daily_closes("BTC", start, &[100.0, 102.0, 101.0, 104.0, 103.0]).unwrap(),
//!     PriceSeries::from_daily_closes("ETH", start, &[50.0, 50.4, 49.8, 51.0, 51.5]).unwrap(),
//! ])
//! .unwrap();
//!
//! let config = SimulationConfig::builder()
//!     .horizon_days(10)
//!     .n_paths(2_000)
//!     .seed(42)
//!     .initial_value(10_000.0)
//!     .weights(vec![0.5, 0.5])
//!     .build()
//!     .unwrap();
//!
//! let run = MonteCarloRiskEngine::new(config).run(&history).unwrap();
//! assert!(run.report.var_99 >= run.report.var_95);
//! assert!(run.report.cvar_95 >= run.report.var_95);
//! assert!((0.0..=1.0).contains(&run.report.prob_loss));
//! ```
//!
//! Tail metrics of an arbitrary P&L sample:
//! ```rust
//! use mcrisk::risk::tail_risk;
//!
//! // P&L of -5, -4, ..., 14: the 0.95 loss quantile falls between 4 and 5.
//! let pnl: Vec<f64> = (0..20).map(|i| i as f64 - 5.0).collect();
//! let t = tail_risk(&pnl, 0.95).unwrap();
//! assert!((t.var - 4.05).abs() < 1e-9);
//! assert_eq!(t.cvar, 5.0);
//! assert_eq!(t.tail_samples, 1);
//! ```

pub mod core;
pub mod engines;
pub mod market;
pub mod math;
pub mod mc;
pub mod models;
pub mod risk;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engines::*;
    pub use crate::market::*;
    pub use crate::math::{CorrelationFactor, FactorizationPolicy};
    pub use crate::mc::{PathEnsemble, PathSimulator};
    pub use crate::models::*;
    pub use crate::risk::*;
}
