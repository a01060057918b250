//! Monte Carlo risk engines.

pub mod risk_engine;

pub use risk_engine::{MonteCarloRiskEngine, RiskRun};
