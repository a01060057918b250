//! Error taxonomy for the estimation, factorization, simulation and risk stages.
//!
//! Every stage fails synchronously at the point of detection; nothing inside the
//! crate retries. Variants carry the offending input shape so callers can report
//! "what was wrong with the input" instead of a raw numerical failure.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors surfaced by the risk engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Fewer observations than required to estimate returns or covariance.
    #[error("insufficient data for {context}: need at least {required} observations, got {available}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        available: usize,
    },

    /// Input price series disagree in length or timestamp alignment.
    #[error("price series `{ticker}` is misaligned: expected {expected} observations, got {actual} ({reason})")]
    MisalignedSeries {
        ticker: String,
        expected: usize,
        actual: usize,
        reason: String,
    },

    /// Covariance matrix cannot be Cholesky-factored under the chosen policy.
    #[error("covariance matrix ({dimension}x{dimension}) is not positive definite at pivot {pivot} after {attempts} attempt(s): {reason}")]
    NonPositiveDefiniteCovariance {
        dimension: usize,
        pivot: usize,
        attempts: u32,
        reason: String,
    },

    /// Simulation configuration violates its constraints.
    #[error("invalid simulation config: {message}")]
    InvalidConfig { message: String },

    /// Tail selection for VaR/CVaR came out empty.
    #[error("empty loss tail at confidence {confidence} over {samples} sample(s)")]
    EmptyTail { confidence: f64, samples: usize },

    /// A single price series violates its own invariants.
    #[error("invalid price series `{ticker}`: {message}")]
    InvalidPriceSeries { ticker: String, message: String },

    /// Two inputs that must agree in dimension do not.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl RiskError {
    /// Create an insufficient data error.
    pub fn insufficient_data(context: &'static str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            context,
            required,
            available,
        }
    }

    /// Create a misaligned series error.
    pub fn misaligned(
        ticker: impl Into<String>,
        expected: usize,
        actual: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MisalignedSeries {
            ticker: ticker.into(),
            expected,
            actual,
            reason: reason.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid price series error.
    pub fn invalid_series(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPriceSeries {
            ticker: ticker.into(),
            message: message.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_input_shape() {
        let err = RiskError::misaligned("ETH", 250, 249, "length differs");
        let text = err.to_string();
        assert!(text.contains("ETH"));
        assert!(text.contains("250"));
        assert!(text.contains("249"));

        let err = RiskError::insufficient_data("covariance", 2, 1);
        assert!(err.to_string().contains("need at least 2"));
    }
}
