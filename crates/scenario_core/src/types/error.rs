//! Error types for model construction and loading.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building, mutating or loading an organization model.
///
/// # Examples
/// ```
/// use scenario_core::types::ModelError;
///
/// let err = ModelError::UnknownVariable("INPUT_SKU".to_string());
/// assert_eq!(format!("{}", err), "Unknown variable: INPUT_SKU");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// INPUT variables must not carry a formula.
    #[error("INPUT variable '{0}' must not have a formula")]
    InputWithFormula(String),

    /// INPUT variables must not declare dependencies.
    #[error("INPUT variable '{0}' must not declare dependencies")]
    InputWithDependencies(String),

    /// OUTPUT variables need a non-empty formula.
    #[error("OUTPUT variable '{0}' has no formula")]
    OutputWithoutFormula(String),

    /// Values can only be stored for INPUT variables.
    #[error("Cannot store a value for OUTPUT variable '{0}'")]
    ValueForOutput(String),

    /// Variable name not defined in the model.
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Scenario id or name not defined in the model.
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// Time-series scenario without start/end bounds.
    #[error("Scenario '{0}' is time-series but has no start/end date")]
    MissingDateBounds(String),

    /// End date before start date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Range start
        start: NaiveDate,
        /// Range end
        end: NaiveDate,
    },

    /// Period string could not be parsed.
    #[error("Invalid period '{0}': expected 'single' or 'YYYY-MM-DD..YYYY-MM-DD'")]
    InvalidPeriod(String),

    /// Model file could not be read or decoded.
    #[error("Failed to load model: {0}")]
    Load(String),
}
