//! Core configuration, error and serialization types shared by every stage.

pub mod error;
pub mod serialization;
pub mod types;

pub use error::{Result, RiskError};
pub use serialization::{from_json, simulation_config_from_json, to_json_pretty};
pub use types::*;
