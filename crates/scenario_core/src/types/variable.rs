//! Variable definitions.
//!
//! A variable is either an INPUT, entered per scenario and period, or an
//! OUTPUT, derived from a formula over inputs, parameters and other outputs.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ModelError;
use super::ids::VariableId;

/// Whether a variable is entered by users or derived by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    /// User-entered value, stored per scenario and period
    Input,
    /// Derived value, computed from a formula
    Output,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Input => write!(f, "INPUT"),
            VariableType::Output => write!(f, "OUTPUT"),
        }
    }
}

/// Definition of a named quantity in the model.
///
/// # Invariants
///
/// - INPUT variables carry no formula and no dependencies.
/// - OUTPUT variables carry a non-empty formula; `dependencies` lists the
///   variable names the formula reads (parameters may appear in the formula
///   without being listed).
///
/// # Examples
///
/// ```
/// use scenario_core::types::{VariableDefinition, VariableType};
///
/// let pct = VariableDefinition::output(
///     "OUTPUT_OMZET_PERCENTAGE",
///     "(INPUT_OMZET / PARAM_BASELINE_OMZET) * 100",
///     ["INPUT_OMZET"],
/// )
/// .with_unit("%")
/// .with_display_order(10);
///
/// assert_eq!(pct.variable_type, VariableType::Output);
/// assert!(pct.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Identifier; defaults to the name when omitted in model files
    #[serde(default)]
    pub id: VariableId,
    /// Unique name within the organization
    pub name: String,
    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// INPUT or OUTPUT
    pub variable_type: VariableType,
    /// Arithmetic formula, present iff OUTPUT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Variable names read by the formula
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Display unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Tie-breaker for ordering and display
    #[serde(default)]
    pub display_order: i32,
}

impl VariableDefinition {
    /// Creates an INPUT variable.
    pub fn input(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: VariableId::new(name.clone()),
            name,
            display_name: None,
            variable_type: VariableType::Input,
            formula: None,
            dependencies: Vec::new(),
            unit: None,
            display_order: 0,
        }
    }

    /// Creates an OUTPUT variable from a formula and its variable dependencies.
    pub fn output<I, S>(name: impl Into<String>, formula: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Self {
            id: VariableId::new(name.clone()),
            name,
            display_name: None,
            variable_type: VariableType::Output,
            formula: Some(formula.into()),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            unit: None,
            display_order: 0,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the display order.
    pub fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }

    /// Whether this is an INPUT variable.
    #[inline]
    pub fn is_input(&self) -> bool {
        self.variable_type == VariableType::Input
    }

    /// Whether this is an OUTPUT variable.
    #[inline]
    pub fn is_output(&self) -> bool {
        self.variable_type == VariableType::Output
    }

    /// Label for display: the display name, falling back to the name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Checks the INPUT/OUTPUT shape invariants.
    ///
    /// Formula syntax and identifier coverage are checked by the engine,
    /// which owns the formula parser.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self.variable_type {
            VariableType::Input => {
                if self.formula.is_some() {
                    return Err(ModelError::InputWithFormula(self.name.clone()));
                }
                if !self.dependencies.is_empty() {
                    return Err(ModelError::InputWithDependencies(self.name.clone()));
                }
            }
            VariableType::Output => {
                let empty = self
                    .formula
                    .as_deref()
                    .map(|f| f.trim().is_empty())
                    .unwrap_or(true);
                if empty {
                    return Err(ModelError::OutputWithoutFormula(self.name.clone()));
                }
            }
        }
        Ok(())
    }
}
