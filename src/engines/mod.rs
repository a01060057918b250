//! Engine implementations that compose estimation, simulation and risk reduction.

pub mod monte_carlo;

pub use monte_carlo::{MonteCarloRiskEngine, RiskRun};
