//! Organization-wide named constants.

use serde::{Deserialize, Serialize};

use super::ids::ParameterId;

/// A named constant referenced by formulas (e.g. baseline revenue).
///
/// Parameters are read-only inputs to every scenario and are never produced
/// by evaluation.
///
/// # Examples
///
/// ```
/// use scenario_core::types::Parameter;
///
/// let param = Parameter::new("PARAM_BASELINE_VOORRAAD", 10_000.0)
///     .with_unit("pallets")
///     .with_category("inventory");
/// assert_eq!(param.id.as_str(), "PARAM_BASELINE_VOORRAAD");
/// assert_eq!(param.unit.as_deref(), Some("pallets"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Identifier; defaults to the name when omitted in model files
    #[serde(default)]
    pub id: ParameterId,
    /// Unique name, used inside formulas
    pub name: String,
    /// Constant value
    pub value: f64,
    /// Display unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Grouping for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Parameter {
    /// Creates a parameter whose id equals its name.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        Self {
            id: ParameterId::new(name.clone()),
            name,
            value,
            unit: None,
            category: None,
        }
    }

    /// Sets the display unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
