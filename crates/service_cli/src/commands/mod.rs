//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod calculate;
pub mod check;
pub mod order;
pub mod run_all;
pub mod validate;

use std::path::Path;

use tracing::info;

use scenario_core::model::OrganizationModel;

use crate::{CliError, Result};

/// Loads a model file, mapping a missing path to `FileNotFound`.
pub(crate) fn load_model(path: &Path) -> Result<OrganizationModel> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let model = OrganizationModel::load(path)?;
    info!(
        organization = %model.organization_id,
        variables = model.variables.len(),
        scenarios = model.scenarios.len(),
        values = model.values.len(),
        "Loaded model {}",
        path.display()
    );
    Ok(model)
}
