//! Error types shared by the annealing engine and the problem models.

use thiserror::Error;

/// Result type for annealing operations.
pub type Result<T> = std::result::Result<T, AnnealError>;

/// Errors that can occur while building a problem or running the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnealError {
    /// A construction or configuration parameter is out of its domain.
    ///
    /// Raised before any search work starts.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The problem's incremental delta cost disagrees with a full
    /// recomputation. Only detected when `debug_delta_cost` is enabled.
    #[error(
        "delta cost mismatch at level {level} (beta = {beta}), step {step}, move {mv}: \
         compute_delta_cost returned {reported}, full recomputation gives {expected}"
    )]
    ContractViolation {
        level: usize,
        step: usize,
        beta: f64,
        mv: String,
        reported: f64,
        expected: f64,
    },
}

impl AnnealError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        AnnealError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by bad input rather than a
    /// defective problem implementation.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, AnnealError::InvalidParameter { .. })
    }
}
