//! Scenario calculation orchestrator.
//!
//! # Run Algorithm
//!
//! 1. Environment = parameters plus the slot's INPUT values.
//! 2. Evaluation order from the dependency graph; graph errors fail the run.
//! 3. OUTPUTs are evaluated in order. A failing variable is logged and its
//!    downstream variables are skipped with `DependencyFailed`; unrelated
//!    variables still evaluate.
//! 4. Results are compared against the baseline run, when supplied.
//!
//! The run ends `Completed` when nothing was logged, `CompletedWithErrors`
//! when at least one OUTPUT still evaluated, and `Failed` otherwise.
//!
//! Per-variable problems never escape [`ScenarioCalculator::run_calculation`];
//! they end up in the result's error log.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{debug, info, warn};

use scenario_formula::{Formula, FormulaError};
use scenario_graph::{build_evaluation_order, EvaluationOrder, GraphError};

use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::context::{CalculationContext, CalculationOptions};
use crate::delta::apply_baseline;
use crate::error::EngineError;
use crate::fingerprint::fingerprint;
use crate::result::{
    CalculationIssue, CalculationResult, CalculationStatus, IssueKind, VariableResult,
};
use crate::store::CalculationStore;

/// Runs calculations for (scenario, period) slots.
///
/// Shareable across threads; the cache is the only mutable state.
#[derive(Debug, Default)]
pub struct ScenarioCalculator {
    config: EngineConfig,
    cache: ResultCache,
}

/// Mutable state of one run.
struct Run {
    status: CalculationStatus,
    results: BTreeMap<String, VariableResult>,
    error_log: Vec<CalculationIssue>,
}

impl Run {
    fn new() -> Self {
        Self {
            status: CalculationStatus::Pending,
            results: BTreeMap::new(),
            error_log: Vec::new(),
        }
    }

    fn advance(&mut self, next: CalculationStatus) -> Result<(), EngineError> {
        self.status = self.status.transition(next)?;
        Ok(())
    }

    fn log(&mut self, variable: &str, kind: IssueKind, message: impl Into<String>) {
        self.error_log
            .push(CalculationIssue::new(variable, kind, message));
    }

    fn fail(&mut self, variable: &str, kind: IssueKind, message: impl Into<String>) -> Result<(), EngineError> {
        self.log(variable, kind, message);
        self.advance(CalculationStatus::Failed)
    }
}

impl ScenarioCalculator {
    /// Creates a calculator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: ResultCache::new(),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Runs one calculation.
    ///
    /// Returns a cached result when caching is enabled, `force_recalculate`
    /// is off and the input fingerprint is unchanged.
    pub fn run_calculation(
        &self,
        context: &CalculationContext<'_>,
        options: &CalculationOptions,
    ) -> CalculationResult {
        let fp = fingerprint(context, options, self.config.decimal_places);

        if !self.config.cache_enabled {
            return self.compute(context, options, fp);
        }
        if options.force_recalculate {
            let result = self.compute(context, options, fp);
            self.cache.insert(result.clone());
            return result;
        }

        let mut computed = false;
        let shared = self
            .cache
            .get_or_compute(&options.scenario_id, &options.period, &fp, || {
                computed = true;
                self.compute(context, options, fp.clone())
            });
        let mut result = CalculationResult::clone(&shared);
        if !computed {
            debug!(
                scenario = %options.scenario_id,
                period = %options.period,
                "Serving cached calculation"
            );
            result.cached = true;
        }
        result
    }

    /// Runs one calculation and persists it, returning the stored revision.
    pub fn calculate_and_store<S>(
        &self,
        store: &S,
        context: &CalculationContext<'_>,
        options: &CalculationOptions,
    ) -> Result<(CalculationResult, u64), EngineError>
    where
        S: CalculationStore + ?Sized,
    {
        let result = self.run_calculation(context, options);
        let revision = store.upsert(result.clone())?;
        debug!(
            scenario = %options.scenario_id,
            period = %options.period,
            revision,
            "Stored calculation"
        );
        Ok((result, revision))
    }

    fn compute(
        &self,
        context: &CalculationContext<'_>,
        options: &CalculationOptions,
        fingerprint: String,
    ) -> CalculationResult {
        let started = Instant::now();
        let mut run = Run::new();

        if let Err(err) = self.evaluate(context, options, &mut run) {
            // Only reachable through an illegal transition.
            warn!(%err, "Calculation aborted");
            run.status = CalculationStatus::Failed;
        }

        let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        let result = CalculationResult {
            organization_id: options.organization_id.clone(),
            scenario_id: options.scenario_id.clone(),
            period: options.period,
            status: run.status,
            has_errors: !run.error_log.is_empty(),
            results: run.results,
            error_log: run.error_log,
            execution_time_ms,
            fingerprint,
            cached: false,
        };

        if result.status == CalculationStatus::Failed {
            let cause = result
                .error_log
                .iter()
                .find(|issue| issue.kind.is_fatal())
                .map_or("no OUTPUT could be evaluated", |issue| issue.message.as_str());
            warn!(
                scenario = %result.scenario_id,
                period = %result.period,
                errors = result.error_log.len(),
                cause,
                "Calculation failed"
            );
        } else {
            info!(
                scenario = %result.scenario_id,
                period = %result.period,
                status = %result.status,
                outputs = result.results.len(),
                errors = result.error_log.len(),
                elapsed_ms = execution_time_ms,
                "Calculation finished"
            );
        }
        result
    }

    fn evaluate(
        &self,
        context: &CalculationContext<'_>,
        options: &CalculationOptions,
        run: &mut Run,
    ) -> Result<(), EngineError> {
        let order = match build_evaluation_order(context.variables) {
            Ok(order) => order,
            Err(err) => {
                let (variable, kind) = match &err {
                    GraphError::CircularDependency { cycle } => (
                        cycle.first().cloned().unwrap_or_default(),
                        IssueKind::CircularDependency,
                    ),
                    GraphError::DuplicateVariable(name) => {
                        (name.clone(), IssueKind::DuplicateVariable)
                    }
                };
                return run.fail(&variable, kind, err.to_string());
            }
        };

        if order.is_empty() {
            return run.fail("", IssueKind::NoOutputs, "No OUTPUT variables to evaluate");
        }

        let mut env: BTreeMap<String, f64> = context
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.value))
            .collect();

        let input_names: BTreeSet<&str> = order.inputs().iter().map(|v| v.name.as_str()).collect();
        for value in context.input_values {
            if value.scenario_id != options.scenario_id || value.period != options.period {
                continue;
            }
            if input_names.contains(value.variable_name.as_str()) {
                env.insert(value.variable_name.clone(), value.value);
            } else {
                debug!(variable = %value.variable_name, "Ignoring value for non-INPUT variable");
            }
        }

        let missing: Vec<&str> = input_names
            .iter()
            .copied()
            .filter(|name| !env.contains_key(*name))
            .collect();
        if !input_names.is_empty() && missing.len() == input_names.len() {
            return run.fail(
                "",
                IssueKind::NoInputs,
                format!("No input values supplied for period {}", options.period),
            );
        }

        run.advance(CalculationStatus::Evaluating)?;

        let mut failed: BTreeSet<String> = BTreeSet::new();
        for name in missing {
            run.log(
                name,
                IssueKind::MissingInput,
                format!("Input '{}' has no value for period {}", name, options.period),
            );
            failed.insert(name.to_string());
        }

        self.evaluate_outputs(&order, &mut env, &mut failed, run);

        if let Some(baseline) = context.baseline_results {
            apply_baseline(&mut run.results, baseline, self.config.decimal_places);
        }

        let next = if run.error_log.is_empty() {
            CalculationStatus::Completed
        } else if run.results.is_empty() {
            CalculationStatus::Failed
        } else {
            CalculationStatus::CompletedWithErrors
        };
        run.advance(next)
    }

    fn evaluate_outputs(
        &self,
        order: &EvaluationOrder,
        env: &mut BTreeMap<String, f64>,
        failed: &mut BTreeSet<String>,
        run: &mut Run,
    ) {
        for var in order.outputs() {
            let name = var.name.as_str();

            if let Some(dep) = var.dependencies.iter().find(|d| failed.contains(*d)) {
                skip_dependent(run, failed, name, dep);
                continue;
            }

            let text = var.formula.as_deref().unwrap_or_default();
            let formula = match Formula::parse(text) {
                Ok(formula) => formula,
                Err(err) => {
                    run.log(name, IssueKind::ParseError, err.to_string());
                    failed.insert(name.to_string());
                    continue;
                }
            };

            if let Some(dep) = formula.identifiers().into_iter().find(|id| failed.contains(*id)) {
                let dep = dep.to_string();
                skip_dependent(run, failed, name, &dep);
                continue;
            }

            match formula.evaluate_for(name, &*env) {
                Ok(value) => {
                    env.insert(name.to_string(), value);
                    run.results.insert(
                        name.to_string(),
                        VariableResult::from_raw(value, self.config.decimal_places),
                    );
                }
                Err(err) => {
                    run.log(name, issue_kind(&err), err.to_string());
                    failed.insert(name.to_string());
                }
            }
        }
    }
}

fn skip_dependent(run: &mut Run, failed: &mut BTreeSet<String>, name: &str, dep: &str) {
    run.log(
        name,
        IssueKind::DependencyFailed,
        format!("Skipped '{}': dependency '{}' failed", name, dep),
    );
    failed.insert(name.to_string());
}

fn issue_kind(err: &FormulaError) -> IssueKind {
    match err {
        FormulaError::Parse { .. } => IssueKind::ParseError,
        FormulaError::UnknownIdentifier { .. } => IssueKind::UnknownIdentifier,
        FormulaError::DivisionByZero { .. } => IssueKind::DivisionByZero,
        FormulaError::NonFinite { .. } => IssueKind::NonFinite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scenario_core::types::{Parameter, Period, VariableDefinition, VariableValue};

    fn options(scenario: &str) -> CalculationOptions {
        CalculationOptions::new("acme", scenario, Period::SinglePoint)
    }

    fn value(scenario: &str, name: &str, v: f64) -> VariableValue {
        VariableValue::new(scenario, name, Period::SinglePoint, v)
    }

    #[test]
    fn test_simple_chain() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("DOUBLE", "IN * 2", ["IN"]),
            VariableDefinition::output("PLUS_K", "DOUBLE + K", ["DOUBLE"]),
        ];
        let params = vec![Parameter::new("K", 0.5)];
        let values = vec![value("s1", "IN", 3.0)];

        let calc = ScenarioCalculator::default();
        let result = calc.run_calculation(&CalculationContext::new(&vars, &params, &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::Completed);
        assert!(!result.has_errors);
        assert_eq!(result.value("DOUBLE"), Some(6.0));
        assert_eq!(result.value("PLUS_K"), Some(6.5));
        assert!(!result.results.contains_key("IN"));
    }

    #[test]
    fn test_cycle_fails_run() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("A", "B + IN", ["B", "IN"]),
            VariableDefinition::output("B", "A", ["A"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::Failed);
        assert!(result.results.is_empty());
        assert_eq!(result.error_log.len(), 1);
        assert_eq!(result.error_log[0].kind, IssueKind::CircularDependency);
        assert!(result.error_log[0].message.contains("A -> B -> A"));
    }

    #[test]
    fn test_no_outputs_fails_run() {
        let vars = vec![VariableDefinition::input("IN")];
        let values = vec![value("s1", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));
        assert_eq!(result.status, CalculationStatus::Failed);
        assert_eq!(result.error_log[0].kind, IssueKind::NoOutputs);
    }

    #[test]
    fn test_all_inputs_missing_fails_run() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("OUT", "IN", ["IN"]),
        ];
        // Value for another scenario only.
        let values = vec![value("other", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));
        assert_eq!(result.status, CalculationStatus::Failed);
        assert_eq!(result.error_log[0].kind, IssueKind::NoInputs);
    }

    #[test]
    fn test_partially_missing_input() {
        let vars = vec![
            VariableDefinition::input("A"),
            VariableDefinition::input("B"),
            VariableDefinition::output("FROM_A", "A + 1", ["A"]),
            VariableDefinition::output("FROM_B", "B + 1", ["B"]),
        ];
        let values = vec![value("s1", "A", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::CompletedWithErrors);
        assert_eq!(result.value("FROM_A"), Some(2.0));
        assert_eq!(result.value("FROM_B"), None);
        let kinds: Vec<(&str, IssueKind)> = result
            .error_log
            .iter()
            .map(|i| (i.variable_name.as_str(), i.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("B", IssueKind::MissingInput),
                ("FROM_B", IssueKind::DependencyFailed),
            ]
        );
    }

    #[test]
    fn test_undeclared_reference_to_failed_variable_is_skipped() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("BAD", "IN / 0", ["IN"]),
            // Reads BAD without declaring it.
            VariableDefinition::output("USES_BAD", "BAD + 1", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::Failed);
        assert_eq!(result.error_log.len(), 2);
        assert_eq!(result.error_log[0].kind, IssueKind::DivisionByZero);
        assert!(result.error_log[0].message.contains("while computing 'BAD'"));
        assert_eq!(result.error_log[1].variable_name, "USES_BAD");
        assert_eq!(result.error_log[1].kind, IssueKind::DependencyFailed);
    }

    #[test]
    fn test_undeclared_reference_to_later_name_resolves() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("A_USES_Z", "Z_OUT * 2", ["IN"]),
            VariableDefinition::output("Z_OUT", "IN + 1", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::Completed);
        assert_eq!(result.value("Z_OUT"), Some(2.0));
        assert_eq!(result.value("A_USES_Z"), Some(4.0));
    }

    #[test]
    fn test_parse_error_is_per_variable() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("BROKEN", "IN +", ["IN"]),
            VariableDefinition::output("FINE", "IN * 3", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 2.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::CompletedWithErrors);
        assert_eq!(result.value("FINE"), Some(6.0));
        assert_eq!(result.error_log.len(), 1);
        assert_eq!(result.error_log[0].kind, IssueKind::ParseError);
    }

    #[test]
    fn test_every_output_failing_fails_run() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("X", "IN / 0", ["IN"]),
            VariableDefinition::output("Y", "IN +", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::Failed);
        assert!(!result.is_success());
        assert!(result.results.is_empty());
        let kinds: Vec<IssueKind> = result.error_log.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::DivisionByZero, IssueKind::ParseError]);
        assert!(kinds.iter().all(|k| !k.is_fatal()));
    }

    #[test]
    fn test_deeply_nested_formula_is_per_variable() {
        let deep = format!("{}IN{}", "(".repeat(5_000), ")".repeat(5_000));
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("DEEP", deep, ["IN"]),
            VariableDefinition::output("OK", "IN + 1", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let result = ScenarioCalculator::default()
            .run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        assert_eq!(result.status, CalculationStatus::CompletedWithErrors);
        assert_eq!(result.value("OK"), Some(2.0));
        assert_eq!(result.value("DEEP"), None);
        assert_eq!(result.error_log.len(), 1);
        assert_eq!(result.error_log[0].variable_name, "DEEP");
        assert_eq!(result.error_log[0].kind, IssueKind::ParseError);
        assert!(result.error_log[0].message.contains("nested too deeply"));
    }

    #[test]
    fn test_rounding_keeps_raw_for_downstream() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("THIRD", "IN / 3", ["IN"]),
            VariableDefinition::output("BACK", "THIRD * 3", ["THIRD"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let calc = ScenarioCalculator::new(EngineConfig::default().with_decimal_places(2));
        let result = calc.run_calculation(&CalculationContext::new(&vars, &[], &values), &options("s1"));

        let third = result.results["THIRD"];
        assert_eq!(third.value, 0.33);
        assert_relative_eq!(third.raw_value.unwrap(), 1.0 / 3.0);
        assert_eq!(result.value("BACK"), Some(1.0));
    }

    #[test]
    fn test_cache_hit_and_force() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("OUT", "IN + 1", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let ctx = CalculationContext::new(&vars, &[], &values);
        let calc = ScenarioCalculator::default();

        let first = calc.run_calculation(&ctx, &options("s1"));
        assert!(!first.cached);
        let second = calc.run_calculation(&ctx, &options("s1"));
        assert!(second.cached);
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.results, second.results);

        let forced = calc.run_calculation(&ctx, &options("s1").forced());
        assert!(!forced.cached);
    }

    #[test]
    fn test_cache_disabled() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("OUT", "IN + 1", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let ctx = CalculationContext::new(&vars, &[], &values);
        let calc = ScenarioCalculator::new(EngineConfig::default().without_cache());
        calc.run_calculation(&ctx, &options("s1"));
        let again = calc.run_calculation(&ctx, &options("s1"));
        assert!(!again.cached);
        assert!(calc.cache().is_empty());
    }

    #[test]
    fn test_calculate_and_store() {
        use crate::store::InMemoryCalculationStore;

        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("OUT", "IN + 1", ["IN"]),
        ];
        let values = vec![value("s1", "IN", 1.0)];
        let ctx = CalculationContext::new(&vars, &[], &values);
        let calc = ScenarioCalculator::default();
        let store = InMemoryCalculationStore::new();

        let (_, rev1) = calc.calculate_and_store(&store, &ctx, &options("s1")).unwrap();
        let (_, rev2) = calc
            .calculate_and_store(&store, &ctx, &options("s1").forced())
            .unwrap();
        assert_eq!((rev1, rev2), (1, 2));
    }
}
