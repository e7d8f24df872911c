//! Run-all command implementation

use std::io::Write;
use std::path::Path;

use tracing::warn;

use scenario_engine::{run_all, EngineConfig};

use crate::output::{render_batch, OutputFormat};
use crate::Result;

/// Run every scenario and period of the model
pub fn run(
    model_path: &Path,
    engine: &EngineConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let model = crate::commands::load_model(model_path)?;
    let report = run_all(&model, engine);

    if report.baseline.is_none() {
        warn!("Model has no baseline scenario; deltas are omitted");
    }
    if report.summary.failed > 0 {
        warn!("{} run(s) failed", report.summary.failed);
    }

    render_batch(out, &report, &model, format)
}
