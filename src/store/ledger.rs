//! ledger.rs
//! The flat observation table: one row per (scenario, region, variable, unit),
//! one value per grid year. Read-mostly after ingestion; derived rows are
//! appended by the derive builder, and gap-filling runs once before that.

use std::collections::HashMap;

use crate::interp;
use crate::store::types::{Observation, OneOrMany};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    years: Vec<i32>,
    rows: Vec<Observation>,
}

impl Ledger {
    /// An empty ledger on the standard 2010..=2100 grid.
    pub fn new() -> Self {
        Self { years: crate::constants::year_grid(), rows: Vec::new() }
    }

    /// An empty ledger on a custom (ascending, step-aligned) grid.
    pub fn with_years(years: Vec<i32>) -> Self {
        Self { years, rows: Vec::new() }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends one row, padding short value vectors with NaN to the grid width.
    pub fn push(&mut self, mut row: Observation) {
        row.values.resize(self.years.len(), f64::NAN);
        self.rows.push(row);
    }

    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = Observation>) {
        for row in rows {
            self.push(row);
        }
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        self.rows.iter().any(|r| r.variable == variable)
    }

    pub fn rows_for_variable<'a>(
        &'a self,
        variable: &'a str,
    ) -> impl Iterator<Item = &'a Observation> + 'a {
        self.rows.iter().filter(move |r| r.variable == variable)
    }

    /// Rows matching a variable set, optionally narrowed by region and unit.
    pub fn filter<'a>(
        &'a self,
        variable: &'a OneOrMany,
        region: Option<&'a OneOrMany>,
        unit: Option<&'a OneOrMany>,
    ) -> impl Iterator<Item = &'a Observation> + 'a {
        self.rows.iter().filter(move |r| {
            variable.contains(&r.variable)
                && region.map_or(true, |f| f.contains(&r.region))
                && unit.map_or(true, |f| f.contains(&r.unit))
        })
    }

    /// The unique series for (scenario name, variable), if exactly one row matches.
    pub fn series(&self, name: &str, variable: &str) -> Option<&[f64]> {
        let mut matches = self
            .rows
            .iter()
            .filter(|r| r.name == name && r.variable == variable);
        let row = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(&row.values)
    }

    /// Fills every missing grid sample from its step-adjacent neighbors.
    ///
    /// Must run before variable derivation so derived rows never see gaps the
    /// raw ledger could have filled.
    pub fn fill_gaps(&mut self) {
        for row in &mut self.rows {
            interp::fill_gaps(&mut row.values);
        }
    }

    /// Per variable, the unit string occurring most often.
    ///
    /// Ties resolve to the lexicographically smaller unit so the map is
    /// deterministic across runs.
    pub fn unit_map(&self) -> HashMap<String, String> {
        let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry((&row.variable, &row.unit)).or_insert(0) += 1;
        }

        let mut best: HashMap<&str, (&str, usize)> = HashMap::new();
        for (&(variable, unit), &n) in &counts {
            match best.get(variable) {
                Some(&(u, m)) if m > n || (m == n && u <= unit) => {}
                _ => {
                    best.insert(variable, (unit, n));
                }
            }
        }
        best.into_iter()
            .map(|(v, (u, _))| (v.to_string(), u.to_string()))
            .collect()
    }

    /// Display unit for a variable filter: the most frequent unit for a single
    /// variable, or the distinct units joined with " or " for a list.
    pub fn display_unit(&self, variable: &OneOrMany) -> String {
        let map = self.unit_map();
        match variable {
            OneOrMany::One(v) => map.get(v).cloned().unwrap_or_default(),
            OneOrMany::Many(vs) => {
                let mut units: Vec<&str> = vs
                    .iter()
                    .filter_map(|v| map.get(v).map(String::as_str))
                    .collect();
                units.sort_unstable();
                units.dedup();
                units.join(" or ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(model: &str, scenario: &str, variable: &str, unit: &str, values: Vec<f64>) -> Observation {
        Observation::new(model, scenario, "World", variable, unit, values)
    }

    #[test]
    fn test_push_pads_to_grid() {
        let mut ledger = Ledger::new();
        ledger.push(obs("M", "S", "Emissions|CO2", "Gt CO2/yr", vec![1.0, 2.0]));
        let row = &ledger.rows()[0];
        assert_eq!(row.values.len(), ledger.years().len());
        assert!(row.values[2].is_nan());
    }

    #[test]
    fn test_filter_by_variable_and_region() {
        let mut ledger = Ledger::with_years(vec![2010, 2015]);
        ledger.push(obs("M", "S1", "Emissions|CO2", "Gt CO2/yr", vec![1.0, 2.0]));
        ledger.push(obs("M", "S2", "Final Energy", "EJ/yr", vec![3.0, 4.0]));

        let var = OneOrMany::one("Emissions|CO2");
        let hits: Vec<_> = ledger.filter(&var, None, None).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "M S1");

        let region = OneOrMany::one("R5ASIA");
        assert_eq!(ledger.filter(&var, Some(&region), None).count(), 0);
    }

    #[test]
    fn test_fill_gaps_runs_per_row() {
        let mut ledger = Ledger::with_years(vec![2010, 2015, 2020]);
        ledger.push(obs("M", "S", "Emissions|CO2", "Gt CO2/yr", vec![10.0, f64::NAN, 30.0]));
        ledger.fill_gaps();
        assert_eq!(ledger.rows()[0].values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_unit_map_most_frequent_wins() {
        let mut ledger = Ledger::with_years(vec![2010]);
        ledger.push(obs("M1", "S", "Emissions|CO2", "Gt CO2/yr", vec![1.0]));
        ledger.push(obs("M2", "S", "Emissions|CO2", "Gt CO2/yr", vec![1.0]));
        ledger.push(obs("M3", "S", "Emissions|CO2", "Mt CO2/yr", vec![1.0]));
        assert_eq!(ledger.unit_map()["Emissions|CO2"], "Gt CO2/yr");
    }

    #[test]
    fn test_display_unit_joins_distinct_units() {
        let mut ledger = Ledger::with_years(vec![2010]);
        ledger.push(obs("M", "S", "Emissions|CO2", "Gt CO2/yr", vec![1.0]));
        ledger.push(obs("M", "S", "Final Energy", "EJ/yr", vec![1.0]));
        let both = OneOrMany::many(["Emissions|CO2", "Final Energy"]);
        assert_eq!(ledger.display_unit(&both), "EJ/yr or Gt CO2/yr");
    }

    #[test]
    fn test_series_requires_unique_match() {
        let mut ledger = Ledger::with_years(vec![2010]);
        ledger.push(obs("M", "S", "Emissions|CO2", "Gt CO2/yr", vec![1.0]));
        assert!(ledger.series("M S", "Emissions|CO2").is_some());
        ledger.push(obs("M", "S", "Emissions|CO2", "Mt CO2/yr", vec![2.0]));
        assert!(ledger.series("M S", "Emissions|CO2").is_none());
    }
}
