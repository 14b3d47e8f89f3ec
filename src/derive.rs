//! derive.rs
//! The Derived-Variable Builder: combines the series of existing ledger
//! variables year by year into rows of a new named variable. Alignment is by
//! (model, scenario, region, unit); a side missing for one scenario falls
//! back to its default, or poisons that scenario's result with NaN.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{AlgebraError, Result};
use crate::store::{Ledger, Observation};

/// Year-wise combination applied by [`create_variable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl DeriveOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            DeriveOp::Add => a + b,
            DeriveOp::Sub => a - b,
            DeriveOp::Mul => a * b,
            DeriveOp::Div => a / b,
        }
    }
}

/// Derives `new_name` rows from two source variables.
///
/// Sources align per (model, scenario, region, unit) group over the union of
/// both variables' groups; `overwrite_unit` replaces the unit before grouping. Within a group, a missing or NaN sample takes the
/// side's default when one is given; any NaN left after defaulting makes that
/// year's result NaN rather than aborting the batch. Fails with
/// [`AlgebraError::MissingSourceVariable`] only when neither variable has any
/// row at all.
///
/// With `append` the derived rows also land in the ledger.
#[allow(clippy::too_many_arguments)]
pub fn create_variable(
    ledger: &mut Ledger,
    var1: &str,
    var2: &str,
    new_name: &str,
    op: DeriveOp,
    default1: Option<f64>,
    default2: Option<f64>,
    overwrite_unit: Option<&str>,
    append: bool,
) -> Result<Vec<Observation>> {
    if !ledger.has_variable(var1) && !ledger.has_variable(var2) {
        return Err(AlgebraError::MissingSourceVariable(vec![
            var1.to_string(),
            var2.to_string(),
        ]));
    }

    let derived = {
        // Alignment key; the unit override applies before grouping, so rows
        // with mismatched units never combine unless the caller overrides.
        let mut groups: BTreeMap<(&str, &str, &str, &str), [Option<&Observation>; 2]> =
            BTreeMap::new();
        for row in ledger.rows_for_variable(var1) {
            let unit = overwrite_unit.unwrap_or(&row.unit);
            groups
                .entry((&row.model, &row.scenario, &row.region, unit))
                .or_default()[0]
                .get_or_insert(row);
        }
        for row in ledger.rows_for_variable(var2) {
            let unit = overwrite_unit.unwrap_or(&row.unit);
            groups
                .entry((&row.model, &row.scenario, &row.region, unit))
                .or_default()[1]
                .get_or_insert(row);
        }

        let width = ledger.years().len();
        let mut derived = Vec::with_capacity(groups.len());
        for ((model, scenario, region, unit), [left, right]) in groups {
            let values = (0..width)
                .map(|i| {
                    let a = operand(left, i, default1);
                    let b = operand(right, i, default2);
                    if a.is_nan() || b.is_nan() {
                        f64::NAN
                    } else {
                        op.apply(a, b)
                    }
                })
                .collect();
            derived.push(Observation::new(model, scenario, region, new_name, unit, values));
        }
        derived
    };

    if append {
        debug!(variable = new_name, rows = derived.len(), "Appending derived rows");
        ledger.append_rows(derived.iter().cloned());
    }
    Ok(derived)
}

/// Derives `new_name` as the year-wise sum of several source variables.
///
/// A shared `default` substitutes for any missing or NaN operand; without one,
/// a single gap makes that year's sum NaN. Fails only when none of the source
/// variables exist in the ledger.
pub fn sum_variables(
    ledger: &mut Ledger,
    variables: &[&str],
    new_name: &str,
    default: Option<f64>,
    overwrite_unit: Option<&str>,
    append: bool,
) -> Result<Vec<Observation>> {
    if variables.iter().all(|v| !ledger.has_variable(v)) {
        return Err(AlgebraError::MissingSourceVariable(
            variables.iter().map(|v| v.to_string()).collect(),
        ));
    }

    let derived = {
        let mut groups: BTreeMap<(&str, &str, &str, &str), Vec<Option<&Observation>>> =
            BTreeMap::new();
        for (slot, variable) in variables.iter().enumerate() {
            for row in ledger.rows_for_variable(variable) {
                let unit = overwrite_unit.unwrap_or(&row.unit);
                groups
                    .entry((&row.model, &row.scenario, &row.region, unit))
                    .or_insert_with(|| vec![None; variables.len()])[slot]
                    .get_or_insert(row);
            }
        }

        let width = ledger.years().len();
        let mut derived = Vec::with_capacity(groups.len());
        for ((model, scenario, region, unit), sources) in groups {
            let values = (0..width)
                .map(|i| {
                    let mut total = 0.0;
                    for source in &sources {
                        let v = operand(*source, i, default);
                        if v.is_nan() {
                            return f64::NAN;
                        }
                        total += v;
                    }
                    total
                })
                .collect();
            derived.push(Observation::new(model, scenario, region, new_name, unit, values));
        }
        derived
    };

    if append {
        debug!(variable = new_name, rows = derived.len(), "Appending derived rows");
        ledger.append_rows(derived.iter().cloned());
    }
    Ok(derived)
}

fn operand(row: Option<&Observation>, idx: usize, default: Option<f64>) -> f64 {
    let v = row.map_or(f64::NAN, |r| r.values[idx]);
    match default {
        Some(d) if v.is_nan() => d,
        _ => v,
    }
}
