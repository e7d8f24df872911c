//! Calculate command implementation
//!
//! Runs one scenario for one period, or for every period it covers. When
//! the scenario is not the baseline, the baseline is calculated for the
//! same period first so deltas can be reported. Results are always printed;
//! the command fails afterwards if any run ended `FAILED`.

use std::io::Write;
use std::path::Path;

use tracing::info;

use scenario_core::model::OrganizationModel;
use scenario_core::types::{Period, Scenario};
use scenario_engine::{
    CalculationContext, CalculationOptions, CalculationResult, EngineConfig, ScenarioCalculator,
};

use crate::output::{render_results, OutputFormat};
use crate::{CliError, Result};

/// Run the calculate command
pub fn run(
    model_path: &Path,
    scenario: &str,
    period: Option<&str>,
    force: bool,
    engine: &EngineConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let model = crate::commands::load_model(model_path)?;
    let target = model.find_scenario(scenario)?;

    let periods = match period {
        Some(text) => vec![text.parse::<Period>()?],
        None => target.periods()?,
    };
    info!("Calculating '{}' for {} period(s)", target.name, periods.len());

    let calculator = ScenarioCalculator::new(engine.clone());
    let results: Vec<CalculationResult> = periods
        .into_iter()
        .map(|p| calculate_period(&calculator, &model, target, p, force))
        .collect();

    render_results(out, &results, &model, format)?;

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        return Err(CliError::CalculationFailed(failed));
    }
    Ok(())
}

fn calculate_period(
    calculator: &ScenarioCalculator,
    model: &OrganizationModel,
    target: &Scenario,
    period: Period,
    force: bool,
) -> CalculationResult {
    let run = |scenario: &Scenario, baseline: Option<&CalculationResult>| {
        let values = model.input_values_for(&scenario.id, &period);
        let context = CalculationContext::new(&model.variables, &model.parameters, &values)
            .with_baseline(baseline);
        let mut options =
            CalculationOptions::new(model.organization_id.clone(), scenario.id.clone(), period);
        options.force_recalculate = force;
        calculator.run_calculation(&context, &options)
    };

    match model.baseline_scenario() {
        Some(baseline) if baseline.id != target.id => {
            let reference = run(baseline, None);
            run(target, Some(&reference))
        }
        _ => run(target, None),
    }
}
