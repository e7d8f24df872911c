//! Validate command implementation

use std::io::Write;
use std::path::Path;

use scenario_engine::{validate_model, Severity};

use crate::output::{render_issues, OutputFormat};
use crate::{CliError, Result};

/// Check a model file; fails when any error-level issue is found
pub fn run(model_path: &Path, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let model = crate::commands::load_model(model_path)?;
    let issues = validate_model(&model);
    render_issues(out, &issues, format)?;

    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    if errors > 0 {
        return Err(CliError::ValidationFailed(errors));
    }
    Ok(())
}
