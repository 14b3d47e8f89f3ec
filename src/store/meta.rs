//! meta.rs
//! The scenario metadata table: one row per scenario name, arbitrary named
//! scalar/categorical columns. Created once per imported dataset and only ever
//! grown by computed summary columns; rows are never deleted.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::constants::{IP_SCENARIOS, SSP_SCENARIOS};
use crate::store::ledger::Ledger;
use crate::store::types::MetaValue;

/// Reserved column names stamped from the pathway registries.
pub const IP_COLUMN: &str = "IP";
pub const SSP_COLUMN: &str = "SSP";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaTable {
    columns: Vec<String>,
    // Scenario name -> one cell per column (padded on column growth).
    rows: BTreeMap<String, Vec<Option<MetaValue>>>,
}

impl MetaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// One row per scenario name found in the ledger, with the Model and
    /// Scenario labels as the first two columns.
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut table = Self::new();
        table.ensure_column("Model");
        table.ensure_column("Scenario");
        for row in ledger.rows() {
            if !table.rows.contains_key(&row.name) {
                table.insert_row(&row.name);
                table.set(&row.name, "Model", Some(row.model.as_str().into()));
                table.set(&row.name, "Scenario", Some(row.scenario.as_str().into()));
            }
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Adds an (empty) row for a scenario name.
    pub fn insert_row(&mut self, name: &str) {
        self.rows
            .entry(name.to_string())
            .or_insert_with(|| vec![None; self.columns.len()]);
    }

    /// Adds a column if absent, returning its index.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(i) = self.columns.iter().position(|c| c == column) {
            return i;
        }
        self.columns.push(column.to_string());
        for cells in self.rows.values_mut() {
            cells.push(None);
        }
        self.columns.len() - 1
    }

    pub fn get(&self, name: &str, column: &str) -> Option<&MetaValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(name)?.get(idx)?.as_ref()
    }

    /// Numeric value of a cell, None for missing or non-numeric cells.
    pub fn number(&self, name: &str, column: &str) -> Option<f64> {
        self.get(name, column)?.as_number()
    }

    /// Sets one cell, growing the column set if needed. Ignores unknown names:
    /// the row set is fixed at import.
    pub fn set(&mut self, name: &str, column: &str, value: Option<MetaValue>) {
        let idx = self.ensure_column(column);
        if let Some(cells) = self.rows.get_mut(name) {
            cells[idx] = value;
        }
    }

    /// Retains only the rows passing the predicate (used at import to build
    /// the vetted table; never on a live table).
    pub fn filtered(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, cells)| (name.clone(), cells.clone()))
                .collect(),
        }
    }

    // --- Summary columns ---

    /// One variable's value at a fixed grid year, per scenario.
    pub fn add_variable_year(&mut self, ledger: &Ledger, column: &str, variable: &str, year: i32) {
        info!(column, variable, year, "Adding fixed-year summary column");
        let idx = match ledger.years().iter().position(|&y| y == year) {
            Some(i) => i,
            None => return,
        };
        self.ensure_column(column);
        for row in ledger.rows_for_variable(variable) {
            let v = row.values[idx];
            let cell = if v.is_nan() { None } else { Some(v.into()) };
            self.set(&row.name, column, cell);
        }
    }

    /// Clips one variable's series to bounds and a year window, then reduces
    /// it with `reduce` (typically the trapezoidal integral), per scenario.
    #[allow(clippy::too_many_arguments)]
    pub fn add_variable_range(
        &mut self,
        ledger: &Ledger,
        column: &str,
        variable: &str,
        clip_lower: Option<f64>,
        clip_upper: Option<f64>,
        year_low: i32,
        year_high: i32,
        reduce: impl Fn(&[i32], &[f64]) -> f64,
    ) {
        info!(column, variable, "Adding range-reduction summary column");
        self.ensure_column(column);
        for row in ledger.rows_for_variable(variable) {
            let mut years = Vec::new();
            let mut values = Vec::new();
            for (&y, &v) in ledger.years().iter().zip(row.values.iter()) {
                if y < year_low || y > year_high {
                    continue;
                }
                let mut v = v;
                if let Some(lo) = clip_lower {
                    v = v.max(lo);
                }
                if let Some(hi) = clip_upper {
                    v = v.min(hi);
                }
                years.push(y);
                values.push(v);
            }
            let reduced = reduce(&years, &values);
            let cell = if reduced.is_nan() { None } else { Some(reduced.into()) };
            self.set(&row.name, column, cell);
        }
    }

    /// Per-scenario net-zero crossing year of a variable.
    pub fn add_net_zero(&mut self, ledger: &Ledger, column: &str, variable: &str, limit: f64) {
        info!(column, variable, limit, "Adding net-zero summary column");
        self.ensure_column(column);
        for row in ledger.rows_for_variable(variable) {
            let year = crate::interp::net_zero_year(ledger.years(), &row.values, limit);
            self.set(&row.name, column, year.map(MetaValue::Number));
        }
    }

    /// Stamps the IP and SSP columns from the reference-pathway registries.
    pub fn tag_reference_pathways(&mut self) {
        self.ensure_column(IP_COLUMN);
        self.ensure_column(SSP_COLUMN);
        for entry in IP_SCENARIOS {
            if self.contains(entry.scenario) {
                self.set(entry.scenario, IP_COLUMN, Some(entry.code.into()));
            } else {
                debug!(code = entry.code, "IP scenario not present in metadata");
            }
        }
        for entry in SSP_SCENARIOS {
            if self.contains(entry.scenario) {
                self.set(entry.scenario, SSP_COLUMN, Some(entry.code.into()));
            } else {
                debug!(code = entry.code, "SSP scenario not present in metadata");
            }
        }
    }
}
