//! Graph error types.

use thiserror::Error;

/// Whole-graph errors. Any of these makes a calculation run fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Dependencies form a cycle. `cycle` lists the path with the first
    /// member repeated at the end.
    #[error("Circular dependency: {}", .cycle.join(" -> "))]
    CircularDependency {
        /// Cycle path
        cycle: Vec<String>,
    },

    /// Two definitions share a name.
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),
}

impl GraphError {
    /// Names of the variables taking part in a cycle, without the repeated
    /// closing member. Empty for other errors.
    pub fn cycle_members(&self) -> &[String] {
        match self {
            GraphError::CircularDependency { cycle } if !cycle.is_empty() => {
                &cycle[..cycle.len() - 1]
            }
            _ => &[],
        }
    }
}
