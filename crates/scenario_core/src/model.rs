//! Per-organization model container.
//!
//! `OrganizationModel` bundles everything one organization owns: parameters
//! and variable definitions shared by every scenario, the scenarios
//! themselves, and the stored INPUT values. Model files are TOML or JSON,
//! chosen by file extension.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{
    ModelError, OrganizationId, Parameter, ParameterId, Period, Scenario, ScenarioId,
    VariableDefinition, VariableId, VariableValue,
};

/// Parameters, variables, scenarios and input values of one organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationModel {
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Named constants
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// INPUT and OUTPUT definitions
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    /// What-if configurations
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// Stored INPUT observations
    #[serde(default)]
    pub values: Vec<VariableValue>,
}

impl OrganizationModel {
    /// Creates an empty model.
    pub fn new(organization_id: impl Into<OrganizationId>) -> Self {
        Self {
            organization_id: organization_id.into(),
            ..Default::default()
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds a variable definition.
    pub fn with_variable(mut self, variable: VariableDefinition) -> Self {
        self.variables.push(variable);
        self
    }

    /// Adds a scenario.
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Parses a TOML model.
    pub fn from_toml_str(source: &str) -> Result<Self, ModelError> {
        let model: Self = toml::from_str(source).map_err(|e| ModelError::Load(e.to_string()))?;
        Ok(model.normalized())
    }

    /// Parses a JSON model.
    pub fn from_json_str(source: &str) -> Result<Self, ModelError> {
        let model: Self =
            serde_json::from_str(source).map_err(|e| ModelError::Load(e.to_string()))?;
        Ok(model.normalized())
    }

    /// Loads a model file; `.json` is read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Fills omitted ids from names and collapses duplicate value slots
    /// (the later record wins).
    fn normalized(mut self) -> Self {
        for parameter in &mut self.parameters {
            if parameter.id.as_str().is_empty() {
                parameter.id = ParameterId::new(parameter.name.clone());
            }
        }
        for variable in &mut self.variables {
            if variable.id.as_str().is_empty() {
                variable.id = VariableId::new(variable.name.clone());
            }
        }

        let values = std::mem::take(&mut self.values);
        for value in values {
            self.upsert_value(value);
        }
        self
    }

    /// Looks up a variable definition by name.
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Looks up a scenario by id.
    pub fn scenario(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| &s.id == id)
    }

    /// Looks up a scenario by id, then by display name.
    pub fn find_scenario(&self, key: &str) -> Result<&Scenario, ModelError> {
        self.scenarios
            .iter()
            .find(|s| s.id.as_str() == key)
            .or_else(|| self.scenarios.iter().find(|s| s.name == key))
            .ok_or_else(|| ModelError::UnknownScenario(key.to_string()))
    }

    /// The comparison reference: the first scenario flagged as baseline.
    pub fn baseline_scenario(&self) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.is_baseline)
    }

    /// Parameter values keyed by name.
    pub fn parameter_values(&self) -> BTreeMap<String, f64> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value))
            .collect()
    }

    /// Stores an INPUT value, replacing any value already held for the same
    /// (scenario, variable, period). Returns the replaced value.
    pub fn set_value(
        &mut self,
        scenario_id: &ScenarioId,
        variable_name: &str,
        period: Period,
        value: f64,
    ) -> Result<Option<f64>, ModelError> {
        if self.scenario(scenario_id).is_none() {
            return Err(ModelError::UnknownScenario(scenario_id.to_string()));
        }
        let variable = self
            .variable(variable_name)
            .ok_or_else(|| ModelError::UnknownVariable(variable_name.to_string()))?;
        if variable.is_output() {
            return Err(ModelError::ValueForOutput(variable_name.to_string()));
        }

        let mut record = VariableValue::new(scenario_id.clone(), variable_name, period, value);
        record.variable_id = Some(variable.id.clone());
        Ok(self.upsert_value(record))
    }

    fn upsert_value(&mut self, record: VariableValue) -> Option<f64> {
        match self
            .values
            .iter_mut()
            .find(|v| v.same_slot(&record.scenario_id, &record.variable_name, &record.period))
        {
            Some(existing) => {
                let previous = existing.value;
                *existing = record;
                Some(previous)
            }
            None => {
                self.values.push(record);
                None
            }
        }
    }

    /// INPUT values stored for a scenario and period.
    pub fn input_values_for(&self, scenario_id: &ScenarioId, period: &Period) -> Vec<VariableValue> {
        self.values
            .iter()
            .filter(|v| &v.scenario_id == scenario_id && &v.period == period)
            .cloned()
            .collect()
    }
}
