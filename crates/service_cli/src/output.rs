//! Rendering of results as table, JSON or CSV.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use scenario_core::model::OrganizationModel;
use scenario_engine::{BatchReport, CalculationResult, ModelIssue, VariableResult};
use scenario_graph::EvaluationOrder;

use crate::error::{CliError, Result};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CliError::InvalidArgument(format!(
                "Unknown format: {}. Supported: table, json, csv",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// One flattened result row, shared by table and CSV output.
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    scenario: &'a str,
    period: String,
    status: String,
    variable: &'a str,
    value: f64,
    unit: &'a str,
    baseline_value: Option<f64>,
    delta: Option<f64>,
    percent_change: Option<f64>,
}

fn rows<'a>(result: &'a CalculationResult, model: &'a OrganizationModel) -> Vec<ResultRow<'a>> {
    // Follow model declaration order so related variables stay together.
    let mut ordered: Vec<(&'a str, &'a VariableResult)> = model
        .variables
        .iter()
        .filter_map(|v| result.results.get_key_value(&v.name))
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    for (name, value) in &result.results {
        if model.variable(name).is_none() {
            ordered.push((name.as_str(), value));
        }
    }

    ordered
        .into_iter()
        .map(|(name, r)| ResultRow {
            scenario: result.scenario_id.as_str(),
            period: result.period.to_string(),
            status: result.status.to_string(),
            variable: name,
            value: r.value,
            unit: model
                .variable(name)
                .and_then(|v| v.unit.as_deref())
                .unwrap_or(""),
            baseline_value: r.baseline_value,
            delta: r.delta,
            percent_change: r.percent_change,
        })
        .collect()
}

fn opt(x: Option<f64>) -> String {
    x.map(|v| format!("{}", v)).unwrap_or_else(|| "-".to_string())
}

fn write_table(out: &mut dyn Write, header: &[&str], body: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(header.to_vec()))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", line(rule.iter().map(String::as_str).collect()))?;
    for row in body {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

fn write_rows_table(out: &mut dyn Write, rows: &[ResultRow<'_>], with_slot: bool) -> Result<()> {
    let mut header = Vec::new();
    if with_slot {
        header.extend(["Scenario", "Period"]);
    }
    header.extend(["Variable", "Value", "Unit", "Baseline", "Delta", "Change %"]);
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let mut cells = Vec::with_capacity(8);
            if with_slot {
                cells.push(r.scenario.to_string());
                cells.push(r.period.clone());
            }
            cells.extend([
                r.variable.to_string(),
                format!("{}", r.value),
                r.unit.to_string(),
                opt(r.baseline_value),
                opt(r.delta),
                opt(r.percent_change),
            ]);
            cells
        })
        .collect();
    write_table(out, &header, &body)
}

fn write_issue_lines(out: &mut dyn Write, result: &CalculationResult) -> Result<()> {
    for issue in &result.error_log {
        let subject = if issue.variable_name.is_empty() {
            "(run)"
        } else {
            issue.variable_name.as_str()
        };
        writeln!(out, "  ! {} [{}] {}", subject, issue.kind, issue.message)?;
    }
    Ok(())
}

fn write_csv<'a>(out: &mut dyn Write, rows: impl IntoIterator<Item = ResultRow<'a>>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders the results of one scenario over one or more periods.
pub fn render_results(
    out: &mut dyn Write,
    results: &[CalculationResult],
    model: &OrganizationModel,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, results)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            write_csv(out, results.iter().flat_map(|r| rows(r, model)))?;
        }
        OutputFormat::Table => {
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(
                    out,
                    "Scenario {} | period {} | {} | {:.3} ms{}",
                    result.scenario_id,
                    result.period,
                    result.status,
                    result.execution_time_ms,
                    if result.cached { " (cached)" } else { "" }
                )?;
                write_rows_table(out, &rows(result, model), false)?;
                write_issue_lines(out, result)?;
            }
        }
    }
    Ok(())
}

/// Renders a batch report.
pub fn render_batch(
    out: &mut dyn Write,
    report: &BatchReport,
    model: &OrganizationModel,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            write_csv(out, report.runs.iter().flat_map(|r| rows(&r.result, model)))?;
        }
        OutputFormat::Table => {
            let all: Vec<ResultRow<'_>> = report
                .runs
                .iter()
                .flat_map(|r| rows(&r.result, model))
                .collect();
            write_rows_table(out, &all, true)?;
            for run in report.runs.iter().filter(|r| r.result.has_errors) {
                writeln!(out, "{} @ {} ({}):", run.scenario_name, run.result.period, run.result.status)?;
                write_issue_lines(out, &run.result)?;
            }
            for skipped in &report.skipped {
                writeln!(out, "skipped {}: {}", skipped.scenario_id, skipped.reason)?;
            }
            let s = &report.summary;
            writeln!(
                out,
                "{} runs: {} completed, {} with errors, {} failed ({:.3} ms)",
                s.runs, s.completed, s.completed_with_errors, s.failed, s.total_execution_ms
            )?;
        }
    }
    Ok(())
}

/// Renders the evaluation order grouped by level.
pub fn render_order(out: &mut dyn Write, order: &EvaluationOrder, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let levels = order.levels();
            serde_json::to_writer_pretty(
                &mut *out,
                &serde_json::json!({
                    "levels": levels,
                    "order": order.outputs().iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
                    "parameters": order.external_references(),
                }),
            )?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["level", "variable", "depends_on"])?;
            for (level, names) in order.levels().iter().enumerate() {
                for name in names {
                    writer.write_record([
                        level.to_string().as_str(),
                        *name,
                        order.dependencies_of(name).join(" ").as_str(),
                    ])?;
                }
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            for (level, names) in order.levels().iter().enumerate() {
                writeln!(out, "Level {}: {}", level, names.join(", "))?;
            }
        }
    }
    Ok(())
}

/// Renders validation findings.
pub fn render_issues(out: &mut dyn Write, issues: &[ModelIssue], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, issues)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for issue in issues {
                writer.serialize(issue)?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if issues.is_empty() {
                writeln!(out, "No issues found")?;
            }
            for issue in issues {
                writeln!(out, "{}", issue)?;
            }
        }
    }
    Ok(())
}
