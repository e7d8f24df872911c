//! Inputs to a calculation run.

use scenario_core::model::OrganizationModel;
use scenario_core::types::{
    OrganizationId, Parameter, Period, ScenarioId, VariableDefinition, VariableValue,
};

use crate::result::CalculationResult;

/// Everything a run reads. All fields are borrowed; a run never mutates its inputs.
#[derive(Debug, Clone, Copy)]
pub struct CalculationContext<'a> {
    /// INPUT and OUTPUT definitions
    pub variables: &'a [VariableDefinition],
    /// Named constants
    pub parameters: &'a [Parameter],
    /// Stored INPUT values; entries for other scenarios or periods are ignored
    pub input_values: &'a [VariableValue],
    /// Baseline run for the same period, when comparing
    pub baseline_results: Option<&'a CalculationResult>,
}

impl<'a> CalculationContext<'a> {
    /// Creates a context without a baseline.
    pub fn new(
        variables: &'a [VariableDefinition],
        parameters: &'a [Parameter],
        input_values: &'a [VariableValue],
    ) -> Self {
        Self {
            variables,
            parameters,
            input_values,
            baseline_results: None,
        }
    }

    /// Creates a context over a model's definitions and stored values.
    pub fn from_model(model: &'a OrganizationModel) -> Self {
        Self::new(&model.variables, &model.parameters, &model.values)
    }

    /// Attaches a baseline result for delta computation.
    pub fn with_baseline(mut self, baseline: Option<&'a CalculationResult>) -> Self {
        self.baseline_results = baseline;
        self
    }
}

/// Identifies the run and controls caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationOptions {
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Scenario to evaluate
    pub scenario_id: ScenarioId,
    /// Period to evaluate
    pub period: Period,
    /// Bypass the result cache
    pub force_recalculate: bool,
}

impl CalculationOptions {
    /// Creates options for a (scenario, period) slot.
    pub fn new(
        organization_id: impl Into<OrganizationId>,
        scenario_id: impl Into<ScenarioId>,
        period: Period,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            scenario_id: scenario_id.into(),
            period,
            force_recalculate: false,
        }
    }

    /// Requests recomputation even when a cached result matches.
    pub fn forced(mut self) -> Self {
        self.force_recalculate = true;
        self
    }
}
