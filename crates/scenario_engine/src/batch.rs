//! Batch runs over every scenario and period of a model.
//!
//! For each period, the baseline scenario is calculated first. The other
//! scenarios covering that period then run against it, fanned out with
//! Rayon once their count reaches the configured threshold. Runs share
//! the model read-only.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scenario_core::model::OrganizationModel;
use scenario_core::types::{OrganizationId, Period, Scenario, ScenarioId};

use crate::calculator::ScenarioCalculator;
use crate::config::EngineConfig;
use crate::context::{CalculationContext, CalculationOptions};
use crate::result::{CalculationResult, CalculationStatus};

/// One (scenario, period) run within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRun {
    /// Scenario display name
    pub scenario_name: String,
    /// Whether this run is the comparison reference
    pub is_baseline: bool,
    /// The calculation outcome
    pub result: CalculationResult,
}

/// Scenario left out of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedScenario {
    /// Scenario identifier
    pub scenario_id: ScenarioId,
    /// Why it was skipped
    pub reason: String,
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total runs
    pub runs: usize,
    /// Runs with status `Completed`
    pub completed: usize,
    /// Runs with status `CompletedWithErrors`
    pub completed_with_errors: usize,
    /// Runs with status `Failed`
    pub failed: usize,
    /// Sum of run durations in milliseconds
    pub total_execution_ms: f64,
}

impl BatchSummary {
    fn from_runs(runs: &[BatchRun]) -> Self {
        runs.iter().fold(Self::default(), |mut acc, run| {
            acc.runs += 1;
            acc.total_execution_ms += run.result.execution_time_ms;
            match run.result.status {
                CalculationStatus::Completed => acc.completed += 1,
                CalculationStatus::CompletedWithErrors => acc.completed_with_errors += 1,
                CalculationStatus::Failed => acc.failed += 1,
                CalculationStatus::Pending | CalculationStatus::Evaluating => {}
            }
            acc
        })
    }

    /// Whether any run logged an error.
    pub fn has_errors(&self) -> bool {
        self.completed_with_errors > 0 || self.failed > 0
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Baseline scenario used for deltas, if any
    pub baseline: Option<ScenarioId>,
    /// Runs ordered by period, baseline first within each period
    pub runs: Vec<BatchRun>,
    /// Scenarios whose periods could not be derived
    pub skipped: Vec<SkippedScenario>,
    /// Aggregate counts
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Runs for one scenario, in period order.
    pub fn runs_for<'a>(&'a self, scenario_id: &'a ScenarioId) -> impl Iterator<Item = &'a BatchRun> + 'a {
        self.runs
            .iter()
            .filter(move |r| &r.result.scenario_id == scenario_id)
    }

    /// The run for a slot.
    pub fn run(&self, scenario_id: &ScenarioId, period: &Period) -> Option<&BatchRun> {
        self.runs
            .iter()
            .find(|r| &r.result.scenario_id == scenario_id && &r.result.period == period)
    }
}

/// Runs every scenario and period of `model` with a fresh calculator.
pub fn run_all(model: &OrganizationModel, config: &EngineConfig) -> BatchReport {
    ScenarioCalculator::new(config.clone()).run_all(model)
}

impl ScenarioCalculator {
    /// Runs every scenario and period of `model`, baseline first per period.
    pub fn run_all(&self, model: &OrganizationModel) -> BatchReport {
        let baseline = model.baseline_scenario();
        let mut skipped = Vec::new();
        let mut slots: BTreeMap<Period, (Option<&Scenario>, Vec<&Scenario>)> = BTreeMap::new();

        for scenario in &model.scenarios {
            let periods = match scenario.periods() {
                Ok(periods) => periods,
                Err(err) => {
                    warn!(scenario = %scenario.id, %err, "Skipping scenario");
                    skipped.push(SkippedScenario {
                        scenario_id: scenario.id.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let is_reference = baseline.is_some_and(|b| b.id == scenario.id);
            for period in periods {
                let slot = slots.entry(period).or_default();
                if is_reference {
                    slot.0 = Some(scenario);
                } else {
                    slot.1.push(scenario);
                }
            }
        }

        let mut runs = Vec::new();
        for (period, (reference, others)) in slots {
            let values = |s: &Scenario| model.input_values_for(&s.id, &period);

            let baseline_run = reference.map(|s| {
                let inputs = values(s);
                let context = CalculationContext::new(&model.variables, &model.parameters, &inputs);
                self.run_one(model, s, period, &context, true)
            });
            let baseline_result = baseline_run.as_ref().map(|r| &r.result);

            let run_other = |s: &&Scenario| {
                let inputs = values(*s);
                let context = CalculationContext::new(&model.variables, &model.parameters, &inputs)
                    .with_baseline(baseline_result);
                self.run_one(model, *s, period, &context, false)
            };
            let other_runs: Vec<BatchRun> = if self.config().should_parallelize(others.len()) {
                others.par_iter().map(run_other).collect()
            } else {
                others.iter().map(run_other).collect()
            };

            runs.extend(baseline_run);
            runs.extend(other_runs);
        }

        let summary = BatchSummary::from_runs(&runs);
        info!(
            organization = %model.organization_id,
            runs = summary.runs,
            failed = summary.failed,
            with_errors = summary.completed_with_errors,
            skipped = skipped.len(),
            "Batch finished"
        );

        BatchReport {
            organization_id: model.organization_id.clone(),
            baseline: baseline.map(|b| b.id.clone()),
            runs,
            skipped,
            summary,
        }
    }

    fn run_one(
        &self,
        model: &OrganizationModel,
        scenario: &Scenario,
        period: Period,
        context: &CalculationContext<'_>,
        is_baseline: bool,
    ) -> BatchRun {
        let options = CalculationOptions::new(model.organization_id.clone(), scenario.id.clone(), period);
        BatchRun {
            scenario_name: scenario.name.clone(),
            is_baseline,
            result: self.run_calculation(context, &options),
        }
    }
}
