//! Input fingerprints for result caching.
//!
//! The fingerprint is a SHA-256 digest over every input that can change a
//! result: organization, slot, variable definitions, parameters, the
//! slot's input values, the baseline's fingerprint and rounding precision.
//! Variables and parameters are hashed in name order so declaration order
//! does not matter.

use sha2::{Digest, Sha256};

use crate::context::{CalculationContext, CalculationOptions};

/// Field separator; never produced by UTF-8 text.
const SEP: [u8; 1] = [0xff];

fn put_str(hasher: &mut Sha256, s: &str) {
    hasher.update(s.as_bytes());
    hasher.update(SEP);
}

fn put_f64(hasher: &mut Sha256, x: f64) {
    hasher.update(x.to_bits().to_le_bytes());
}

/// Computes the hex fingerprint of a run's inputs.
pub fn fingerprint(
    context: &CalculationContext<'_>,
    options: &CalculationOptions,
    decimal_places: Option<u32>,
) -> String {
    let mut hasher = Sha256::new();

    put_str(&mut hasher, options.organization_id.as_str());
    put_str(&mut hasher, options.scenario_id.as_str());
    put_str(&mut hasher, &options.period.to_string());

    let mut variables: Vec<_> = context.variables.iter().collect();
    variables.sort_by(|a, b| a.name.cmp(&b.name));
    for var in variables {
        put_str(&mut hasher, &var.name);
        put_str(&mut hasher, &var.variable_type.to_string());
        put_str(&mut hasher, var.formula.as_deref().unwrap_or(""));
        let mut deps: Vec<&str> = var.dependencies.iter().map(String::as_str).collect();
        deps.sort_unstable();
        for dep in deps {
            put_str(&mut hasher, dep);
        }
        hasher.update(var.display_order.to_le_bytes());
    }

    let mut parameters: Vec<_> = context.parameters.iter().collect();
    parameters.sort_by(|a, b| a.name.cmp(&b.name));
    for param in parameters {
        put_str(&mut hasher, &param.name);
        put_f64(&mut hasher, param.value);
    }

    let mut values: Vec<_> = context
        .input_values
        .iter()
        .filter(|v| v.scenario_id == options.scenario_id && v.period == options.period)
        .collect();
    values.sort_by(|a, b| a.variable_name.cmp(&b.variable_name));
    for value in values {
        put_str(&mut hasher, &value.variable_name);
        put_f64(&mut hasher, value.value);
    }

    put_str(
        &mut hasher,
        context
            .baseline_results
            .map(|b| b.fingerprint.as_str())
            .unwrap_or(""),
    );
    hasher.update(decimal_places.map_or(u64::MAX, u64::from).to_le_bytes());

    hex::encode(hasher.finalize())
}
