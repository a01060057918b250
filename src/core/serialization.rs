//! JSON payload helpers for configurations and reports.
//!
//! Collaborators that load a [`SimulationConfig`](crate::core::SimulationConfig)
//! from disk or persist a [`RiskReport`](crate::risk::RiskReport) go through these
//! helpers so every payload uses the same serde representation.
//!
//! # Examples
//! ```rust
//! use mcrisk::core::{from_json, to_json_pretty, SimulationConfig};
//!
//! let cfg = SimulationConfig::builder()
//!     .horizon_days(20)
//!     .n_paths(1_000)
//!     .seed(42)
//!     .initial_value(10_000.0)
//!     .weights(vec![0.5, 0.5])
//!     .build()
//!     .unwrap();
//!
//! let json = to_json_pretty(&cfg).unwrap();
//! let decoded: SimulationConfig = from_json(&json).unwrap();
//! assert_eq!(decoded, cfg);
//! ```

use serde::de::DeserializeOwned;

use crate::core::{Result, SimulationConfig};

/// Serialize a value to pretty JSON.
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}

/// Parses and validates a [`SimulationConfig`] from JSON.
///
/// Parse failures are reported as [`RiskError::InvalidConfig`](crate::core::RiskError::InvalidConfig).
pub fn simulation_config_from_json(payload: &str) -> Result<SimulationConfig> {
    let config: SimulationConfig = from_json(payload)
        .map_err(|e| crate::core::RiskError::invalid_config(format!("malformed JSON: {e}")))?;
    config.validate()?;
    Ok(config)
}
