//! Engine error types.
//!
//! Per-variable evaluation problems never surface here; they are recorded in
//! [`CalculationResult::error_log`](crate::result::CalculationResult::error_log).
//! These errors cover the surrounding machinery: status transitions,
//! persistence and serialisation.

use thiserror::Error;

use crate::result::CalculationStatus;
use crate::store::StoreError;

/// Errors raised by the engine around, not inside, a calculation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Status moved along an edge the lifecycle does not allow.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: CalculationStatus,
        /// Requested status
        to: CalculationStatus,
    },

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Result could not be serialised.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
