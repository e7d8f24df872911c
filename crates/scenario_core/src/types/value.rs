//! Stored observations of INPUT variables.

use serde::{Deserialize, Serialize};

use super::ids::{ScenarioId, VariableId};
use super::period::Period;

/// A concrete value of one INPUT variable for one scenario and period.
///
/// There is at most one logical value per (scenario, variable, period); the
/// model container enforces last-write-wins on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    /// Owning scenario
    pub scenario_id: ScenarioId,
    /// Variable identifier, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<VariableId>,
    /// Variable name, used to populate the evaluation environment
    pub variable_name: String,
    /// Period the value applies to
    #[serde(default = "single_point")]
    pub period: Period,
    /// The observed value
    pub value: f64,
}

fn single_point() -> Period {
    Period::SinglePoint
}

impl VariableValue {
    /// Creates a value record.
    pub fn new(
        scenario_id: impl Into<ScenarioId>,
        variable_name: impl Into<String>,
        period: Period,
        value: f64,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            variable_id: None,
            variable_name: variable_name.into(),
            period,
            value,
        }
    }

    /// Whether this record occupies the same (scenario, variable, period) slot.
    pub fn same_slot(&self, scenario_id: &ScenarioId, variable_name: &str, period: &Period) -> bool {
        &self.scenario_id == scenario_id
            && self.variable_name == variable_name
            && &self.period == period
    }
}
