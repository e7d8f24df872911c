//! Formula error types.

use thiserror::Error;

/// Errors from parsing or evaluating a formula.
///
/// Every variant carries the formula text so a log entry can be read without
/// the surrounding model.
///
/// # Examples
/// ```
/// use scenario_formula::FormulaError;
///
/// let err = FormulaError::UnknownIdentifier {
///     name: "INPUT_SKU".to_string(),
///     formula: "INPUT_SKU * 2".to_string(),
/// };
/// assert_eq!(
///     format!("{}", err),
///     "Unknown identifier 'INPUT_SKU' in formula 'INPUT_SKU * 2'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed formula text.
    #[error("Parse error at offset {offset} in formula '{formula}': {message}")]
    Parse {
        /// Offending formula text
        formula: String,
        /// Byte offset of the problem
        offset: usize,
        /// What was expected or found
        message: String,
    },

    /// Identifier not present in the environment.
    #[error("Unknown identifier '{name}' in formula '{formula}'")]
    UnknownIdentifier {
        /// Missing name
        name: String,
        /// Formula referencing it
        formula: String,
    },

    /// Right-hand side of a division evaluated to zero.
    #[error("Division by zero{} in formula '{formula}'", owner_suffix(.variable))]
    DivisionByZero {
        /// Formula text
        formula: String,
        /// OUTPUT variable the formula belongs to, when known
        variable: Option<String>,
    },

    /// Arithmetic overflowed to infinity or produced NaN.
    #[error("Non-finite result{} in formula '{formula}'", owner_suffix(.variable))]
    NonFinite {
        /// Formula text
        formula: String,
        /// OUTPUT variable the formula belongs to, when known
        variable: Option<String>,
    },
}

fn owner_suffix(variable: &Option<String>) -> String {
    match variable {
        Some(name) => format!(" while computing '{}'", name),
        None => String::new(),
    }
}

impl FormulaError {
    /// Attaches the owning variable name to evaluation errors that carry one.
    pub fn for_variable(self, name: &str) -> Self {
        match self {
            FormulaError::DivisionByZero { formula, .. } => FormulaError::DivisionByZero {
                formula,
                variable: Some(name.to_string()),
            },
            FormulaError::NonFinite { formula, .. } => FormulaError::NonFinite {
                formula,
                variable: Some(name.to_string()),
            },
            other => other,
        }
    }
}
