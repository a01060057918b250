//! Risk Summarizer: tail metrics, drawdowns and reports over simulated outcomes.
//!
//! This module wires and re-exports:
//! - `var`: empirical VaR/CVaR and probability of loss,
//! - `drawdown`: per-path maximum drawdown,
//! - `report`: [`RiskReport`] and the [`RiskSummarizer`] reduction,
//! - `streaming`: batch-wise reduction with bounded memory,
//! - `bands`: per-step percentile paths of portfolio value.

pub mod bands;
pub mod drawdown;
pub mod report;
pub mod streaming;
pub mod var;

pub use bands::{DEFAULT_BAND_PERCENTILES, ValueBands, value_bands};
pub use drawdown::{DrawdownTracker, max_drawdown, max_drawdowns};
pub use report::{DistributionSummary, RiskReport, RiskSummarizer};
pub use streaming::StreamingRiskAccumulator;
pub use var::{
    TailRisk, conditional_value_at_risk, probability_of_loss, tail_risk, value_at_risk,
};
