//! Check command implementation
//!
//! Prints the effective configuration after file, environment and CLI
//! overrides have been applied.

use std::io::Write;

use crate::config::CliConfig;
use crate::{CliError, Result};

/// Run the check command
pub fn run(config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "scenario {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;
    let text = toml::to_string_pretty(config)
        .map_err(|e| CliError::InvalidArgument(format!("Cannot render configuration: {}", e)))?;
    write!(out, "{}", text)?;
    Ok(())
}
