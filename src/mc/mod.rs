//! Monte Carlo path generation for correlated multi-asset GBM.

pub mod rng;
pub mod simulation;

pub use rng::{path_rng, stream_seed};
pub use simulation::{DEFAULT_BATCH_PATHS, PathEnsemble, PathSimulator};
