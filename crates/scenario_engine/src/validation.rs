//! Static model checks.
//!
//! Finds problems that would otherwise only show up in a run's error log:
//! malformed formulas, references that are neither declared dependencies
//! nor parameters, cycles and broken scenario bounds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use scenario_core::model::OrganizationModel;
use scenario_core::types::VariableDefinition;
use scenario_formula::Formula;
use scenario_graph::{build_evaluation_order, GraphError};

/// How serious a model issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Runs will misbehave or fail
    Error,
    /// Suspicious but harmless for calculation
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One finding of [`validate_model`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIssue {
    /// Error or warning
    pub severity: Severity,
    /// Variable, scenario or value the finding is about
    pub subject: String,
    /// Description
    pub message: String,
}

impl ModelIssue {
    fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }

    fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.subject, self.message)
    }
}

/// Whether any issue is an error.
pub fn has_errors(issues: &[ModelIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

/// Checks a model and returns every finding, errors before warnings.
pub fn validate_model(model: &OrganizationModel) -> Vec<ModelIssue> {
    let mut issues = Vec::new();

    let parameters: BTreeSet<&str> = model.parameters.iter().map(|p| p.name.as_str()).collect();
    let mut variables: BTreeMap<&str, &VariableDefinition> = BTreeMap::new();
    let mut has_duplicates = false;

    for var in &model.variables {
        if variables.insert(var.name.as_str(), var).is_some() {
            has_duplicates = true;
            issues.push(ModelIssue::error(&var.name, "Duplicate variable name"));
        }
        if parameters.contains(var.name.as_str()) {
            issues.push(ModelIssue::warning(
                &var.name,
                "Variable shadows a parameter of the same name",
            ));
        }
    }

    for var in &model.variables {
        if let Err(err) = var.validate() {
            issues.push(ModelIssue::error(&var.name, err.to_string()));
            continue;
        }
        if var.is_output() {
            check_formula(var, &variables, &parameters, &mut issues);
        }
    }

    if !model.variables.iter().any(VariableDefinition::is_output) {
        issues.push(ModelIssue::warning(
            model.organization_id.as_str(),
            "Model has no OUTPUT variables",
        ));
    }

    if !has_duplicates {
        if let Err(err @ GraphError::CircularDependency { .. }) =
            build_evaluation_order(&model.variables)
        {
            let subject = err.cycle_members().first().cloned().unwrap_or_default();
            issues.push(ModelIssue::error(subject, err.to_string()));
        }
    }

    check_scenarios(model, &mut issues);
    check_values(model, &variables, &mut issues);

    issues.sort_by(|a, b| a.severity.cmp(&b.severity));
    issues
}

fn check_formula(
    var: &VariableDefinition,
    variables: &BTreeMap<&str, &VariableDefinition>,
    parameters: &BTreeSet<&str>,
    issues: &mut Vec<ModelIssue>,
) {
    let text = var.formula.as_deref().unwrap_or_default();
    let formula = match Formula::parse(text) {
        Ok(formula) => formula,
        Err(err) => {
            issues.push(ModelIssue::error(&var.name, err.to_string()));
            return;
        }
    };

    let declared: BTreeSet<&str> = var.dependencies.iter().map(String::as_str).collect();
    let referenced: BTreeSet<&str> = formula.identifiers().into_iter().collect();

    for name in &referenced {
        if !declared.contains(name) && !parameters.contains(name) {
            issues.push(ModelIssue::error(
                &var.name,
                format!(
                    "Formula references '{}', which is neither a declared dependency nor a parameter",
                    name
                ),
            ));
        }
    }

    for dep in &declared {
        if !variables.contains_key(dep) && !parameters.contains(dep) {
            issues.push(ModelIssue::error(
                &var.name,
                format!("Dependency '{}' names no variable or parameter", dep),
            ));
        } else if !referenced.contains(dep) {
            issues.push(ModelIssue::warning(
                &var.name,
                format!("Declared dependency '{}' is not used by the formula", dep),
            ));
        }
    }
}

fn check_scenarios(model: &OrganizationModel, issues: &mut Vec<ModelIssue>) {
    let mut seen = BTreeSet::new();
    for scenario in &model.scenarios {
        if !seen.insert(scenario.id.as_str()) {
            issues.push(ModelIssue::error(scenario.id.as_str(), "Duplicate scenario id"));
        }
        if let (Some(start), Some(end)) = (scenario.start_date, scenario.end_date) {
            if end < start {
                issues.push(ModelIssue::error(
                    scenario.id.as_str(),
                    format!("End date {} is before start date {}", end, start),
                ));
                continue;
            }
        }
        if let Err(err) = scenario.periods() {
            issues.push(ModelIssue::error(scenario.id.as_str(), err.to_string()));
        }
    }

    match model.scenarios.iter().filter(|s| s.is_baseline).count() {
        0 if !model.scenarios.is_empty() => issues.push(ModelIssue::warning(
            model.organization_id.as_str(),
            "No baseline scenario; deltas will not be computed",
        )),
        n if n > 1 => issues.push(ModelIssue::warning(
            model.organization_id.as_str(),
            format!("{} scenarios are flagged as baseline; the first one is used", n),
        )),
        _ => {}
    }
}

fn check_values(
    model: &OrganizationModel,
    variables: &BTreeMap<&str, &VariableDefinition>,
    issues: &mut Vec<ModelIssue>,
) {
    for value in &model.values {
        let subject = format!("{}/{}", value.scenario_id, value.variable_name);
        if model.scenario(&value.scenario_id).is_none() {
            issues.push(ModelIssue::warning(
                &subject,
                format!("Value for unknown scenario '{}'", value.scenario_id),
            ));
        }
        match variables.get(value.variable_name.as_str()) {
            None => issues.push(ModelIssue::warning(&subject, "Value for unknown variable")),
            Some(var) if var.is_output() => issues.push(ModelIssue::error(
                &subject,
                "Stored value for an OUTPUT variable",
            )),
            Some(_) => {}
        }
        if !value.value.is_finite() {
            issues.push(ModelIssue::error(&subject, "Stored value is not finite"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use scenario_core::types::{Parameter, Scenario, TimePeriodType};

    fn base() -> OrganizationModel {
        OrganizationModel::new("acme")
            .with_parameter(Parameter::new("PARAM_BASE", 100.0))
            .with_variable(VariableDefinition::input("INPUT_X"))
            .with_scenario(Scenario::single_point("base", "Baseline").as_baseline())
    }

    fn messages(issues: &[ModelIssue]) -> Vec<String> {
        issues.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_clean_model() {
        let model = base().with_variable(VariableDefinition::output(
            "OUTPUT_PCT",
            "INPUT_X / PARAM_BASE * 100",
            ["INPUT_X"],
        ));
        let issues = validate_model(&model);
        assert!(issues.is_empty(), "{:?}", messages(&issues));
    }

    #[test]
    fn test_undeclared_reference() {
        let model = base()
            .with_variable(VariableDefinition::output("A", "INPUT_X + 1", ["INPUT_X"]))
            .with_variable(VariableDefinition::output("B", "A + INPUT_X", ["INPUT_X"]));
        let issues = validate_model(&model);
        assert!(has_errors(&issues));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].subject, "B");
        assert!(issues[0].message.contains("'A'"));
    }

    #[test]
    fn test_unused_and_unknown_dependencies() {
        let model = base().with_variable(VariableDefinition::output(
            "A",
            "PARAM_BASE * 2",
            ["INPUT_X", "GHOST"],
        ));
        let issues = validate_model(&model);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(issues[0].message.contains("GHOST"));
        assert_eq!(issues[1].severity, Severity::Warning);
        assert!(issues[1].message.contains("INPUT_X"));
    }

    #[test]
    fn test_parse_error_and_shape() {
        let mut bad_input = VariableDefinition::input("INPUT_Y");
        bad_input.formula = Some("1".to_string());
        let model = base()
            .with_variable(bad_input)
            .with_variable(VariableDefinition::output("A", "INPUT_X *", ["INPUT_X"]));
        let issues = validate_model(&model);
        let subjects: Vec<&str> = issues.iter().map(|i| i.subject.as_str()).collect();
        assert_eq!(subjects, vec!["INPUT_Y", "A"]);
        assert!(issues[1].message.starts_with("Parse error"));
    }

    #[test]
    fn test_cycle_and_duplicates() {
        let cyclic = base()
            .with_variable(VariableDefinition::output("A", "B", ["B"]))
            .with_variable(VariableDefinition::output("B", "A", ["A"]));
        let issues = validate_model(&cyclic);
        assert!(issues
            .iter()
            .any(|i| i.message == "Circular dependency: A -> B -> A"));

        let duplicated = base().with_variable(VariableDefinition::input("INPUT_X"));
        let issues = validate_model(&duplicated);
        assert!(issues.iter().any(|i| i.message == "Duplicate variable name"));
    }

    #[test]
    fn test_scenario_checks() {
        let mut backwards = Scenario::time_series(
            "alt",
            "Alternative",
            TimePeriodType::Monthly,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        backwards.is_baseline = true;
        let model = base()
            .with_variable(VariableDefinition::output("A", "INPUT_X", ["INPUT_X"]))
            .with_scenario(backwards);
        let issues = validate_model(&model);
        assert!(issues
            .iter()
            .any(|i| i.subject == "alt" && i.message.contains("before start date")));
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Warning && i.message.contains("flagged as baseline")));
    }

    #[test]
    fn test_value_checks() {
        let mut model = base().with_variable(VariableDefinition::output("A", "INPUT_X", ["INPUT_X"]));
        model.values.push(scenario_core::types::VariableValue::new(
            "base",
            "A",
            scenario_core::types::Period::SinglePoint,
            1.0,
        ));
        let issues = validate_model(&model);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].subject, "base/A");
        assert_eq!(issues[0].severity, Severity::Error);
    }
}
