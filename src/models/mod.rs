//! Return estimation and the price dynamics simulated forward from it.

pub mod gbm;
pub mod returns;

pub use gbm::CorrelatedGbm;
pub use returns::ReturnStatistics;
