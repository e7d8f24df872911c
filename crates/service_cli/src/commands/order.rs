//! Order command implementation
//!
//! Prints the evaluation order grouped by dependency level.

use std::io::Write;
use std::path::Path;

use scenario_graph::build_evaluation_order;

use crate::output::{render_order, OutputFormat};
use crate::Result;

/// Run the order command
pub fn run(model_path: &Path, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let model = crate::commands::load_model(model_path)?;
    let order = build_evaluation_order(&model.variables)?;
    render_order(out, &order, format)
}
