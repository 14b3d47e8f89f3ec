//! The Selection Engine: filters a Var's values by metadata predicates, value
//! ranges and named reference-pathway membership, and reshapes the result into
//! the long/wide table the chart collaborator consumes.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::algebra::frame::RowKey;
use crate::algebra::var::{Dataset, Var};
use crate::constants::{self, IP_SCENARIOS, SSP_SCENARIOS};
use crate::error::{AlgebraError, Result};
use crate::store::{MetaValue, IP_COLUMN, SSP_COLUMN};

/// Reserved name of the measured-quantity column in long output.
pub const VALUE_COLUMN: &str = "Value";

/// One filter alternative: an exact value or a closed numeric range.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(MetaValue),
    Between(f64, f64),
}

impl Predicate {
    pub fn eq(value: impl Into<MetaValue>) -> Self {
        Predicate::Equals(value.into())
    }

    pub fn between(low: f64, high: f64) -> Self {
        Predicate::Between(low, high)
    }

    fn matches_cell(&self, cell: Option<&MetaValue>) -> bool {
        match (self, cell) {
            (Predicate::Equals(want), Some(have)) => want == have,
            (Predicate::Between(lo, hi), Some(have)) => {
                have.as_number().is_some_and(|v| v >= *lo && v <= *hi)
            }
            (_, None) => false,
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        matches!(self, Predicate::Equals(v) if v.as_text() == Some(text))
    }
}

/// Filter over one metadata column. `Any` keeps every scenario with a
/// non-missing cell; `Values` is the union of its alternatives.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaFilter {
    Any,
    Values(Vec<Predicate>),
}

/// Filter over a reference-pathway registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathwayFilter {
    All,
    Codes(Vec<String>),
}

impl PathwayFilter {
    pub fn codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PathwayFilter::Codes(codes.into_iter().map(Into::into).collect())
    }
}

/// The combination of filters for one [`Var::select`] call. Metadata filters
/// apply in insertion order, which is also the order of the extra descriptive
/// columns in the output.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    meta: Vec<(String, MetaFilter)>,
    value: Option<Vec<Predicate>>,
    ip: Option<PathwayFilter>,
    ssp: Option<PathwayFilter>,
    wide: bool,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta(mut self, column: impl Into<String>, filter: MetaFilter) -> Self {
        self.meta.push((column.into(), filter));
        self
    }

    pub fn value<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        self.value = Some(predicates.into_iter().collect());
        self
    }

    pub fn ip(mut self, filter: PathwayFilter) -> Self {
        self.ip = Some(filter);
        self
    }

    pub fn ssp(mut self, filter: PathwayFilter) -> Self {
        self.ssp = Some(filter);
        self
    }

    /// Wide output: one row per scenario, one column per selector.
    pub fn wide(mut self) -> Self {
        self.wide = true;
        self
    }
}

/// One output cell. `Empty` is the missing-value trace: a scenario is never
/// silently dropped, its gaps travel to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl Cell {
    fn from_value(v: f64) -> Self {
        if v.is_nan() {
            Cell::Empty
        } else {
            Cell::Number(v)
        }
    }

    fn from_meta(cell: Option<&MetaValue>) -> Self {
        match cell {
            Some(MetaValue::Number(v)) => Cell::Number(*v),
            Some(MetaValue::Text(s)) => Cell::Text(s.clone()),
            Some(MetaValue::Bool(b)) => Cell::Bool(*b),
            None => Cell::Empty,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Number(_) => 0,
            Cell::Text(_) => 1,
            Cell::Bool(_) => 2,
            Cell::Empty => 3,
        }
    }

    /// Total order for sorting: numbers, then text, then bools, missing last.
    fn cmp_cells(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// The selection output: named columns, one row per scenario (wide) or per
/// scenario and year (long).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }
}

impl Var {
    /// Filters and reshapes this Var's values.
    ///
    /// Metadata filters run against the vetted scenario table; SSP filters
    /// re-admit registry scenarios from the unvetted table, since failing a
    /// vetting criterion must not hide a named reference pathway.
    pub fn select(&self, data: &Dataset, opts: &SelectOptions) -> Result<Table> {
        let mut selection: Vec<String> = data.vetted.names().map(str::to_string).collect();
        let mut extra: Vec<String> = Vec::new();

        for (column, filter) in &opts.meta {
            if column == "Name" {
                // Filtering on the key itself: keep the named scenarios.
                if let MetaFilter::Values(preds) = filter {
                    selection.retain(|n| preds.iter().any(|p| p.matches_text(n)));
                }
                continue;
            }
            if !data.vetted.has_column(column) {
                return Err(AlgebraError::UnknownMetadataColumn(column.clone()));
            }
            match filter {
                MetaFilter::Any => {
                    selection.retain(|n| data.vetted.get(n, column).is_some());
                }
                MetaFilter::Values(preds) => {
                    selection.retain(|n| {
                        let cell = data.vetted.get(n, column);
                        preds.iter().any(|p| p.matches_cell(cell))
                    });
                }
            }
            extra.push(column.clone());
        }

        if let Some(preds) = &opts.value {
            let passing = self.names_passing_value_filter(preds);
            selection.retain(|n| passing.contains(n.as_str()));
        }

        if let Some(filter) = &opts.ip {
            let codes = resolve_codes(filter, "IP", &ip_codes())?;
            let ids: HashSet<&str> = codes
                .iter()
                .filter_map(|c| constants::ip(c).map(|e| e.scenario))
                .collect();
            selection.retain(|n| ids.contains(n.as_str()));
            extra.push(IP_COLUMN.to_string());
        }

        if let Some(filter) = &opts.ssp {
            let codes = resolve_codes(filter, "SSP", &ssp_codes())?;
            let entries: Vec<&constants::Ssp> =
                codes.iter().filter_map(|c| constants::ssp(c)).collect();
            let ids: HashSet<&str> = entries.iter().map(|e| e.scenario).collect();
            selection.retain(|n| ids.contains(n.as_str()));
            // Re-admit reference scenarios that failed vetting.
            for entry in &entries {
                if !selection.iter().any(|n| n == entry.scenario) && data.meta.contains(entry.scenario) {
                    selection.push(entry.scenario.to_string());
                }
            }
            extra.push(SSP_COLUMN.to_string());
        }

        let names: HashSet<&str> = selection.iter().map(String::as_str).collect();
        let subset = self.frame.subset_by_name(&names);

        // Attach extra descriptive columns, then sort by them (stable, so the
        // frame's key order survives inside equal groups).
        let mut out_rows: Vec<(Vec<Cell>, RowKey, Vec<f64>)> = subset
            .rows()
            .map(|(key, values)| {
                let extra_cells = extra
                    .iter()
                    .map(|c| meta_cell(data, &key.name, c))
                    .collect();
                (extra_cells, key.clone(), values.to_vec())
            })
            .collect();
        if !extra.is_empty() {
            out_rows.sort_by(|a, b| {
                a.0.iter()
                    .zip(b.0.iter())
                    .map(|(x, y)| x.cmp_cells(y))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        Ok(self.shape(&extra, out_rows, opts.wide))
    }

    /// A scenario passes when, in every selector column, it matches any
    /// discrete value exactly or falls inside any range: conjunction across
    /// columns, disjunction across alternatives. NaN cells fail every
    /// comparison, so a gap excludes the scenario rather than passing it.
    fn names_passing_value_filter(&self, preds: &[Predicate]) -> HashSet<&str> {
        let mut passing = HashSet::new();
        for (key, values) in self.frame.rows() {
            let ok = preds.iter().any(|p| match p {
                Predicate::Between(lo, hi) => values.iter().all(|v| *v >= *lo && *v <= *hi),
                Predicate::Equals(MetaValue::Number(x)) => values.iter().all(|v| v == x),
                Predicate::Equals(_) => false,
            });
            if ok {
                passing.insert(key.name.as_str());
            }
        }
        passing
    }

    fn shape(
        &self,
        extra: &[String],
        out_rows: Vec<(Vec<Cell>, RowKey, Vec<f64>)>,
        wide: bool,
    ) -> Table {
        let index_columns = self.index_columns();
        let selector_labels = self.frame.column_labels();
        let single = selector_labels.len() == 1;
        let any_meta = self.frame.columns().iter().any(|s| s.is_meta());

        let index_cells = |key: &RowKey| -> Vec<Cell> {
            let mut cells = vec![Cell::Text(key.name.clone())];
            if let Some(s) = &key.secondary {
                cells.push(Cell::Text(s.clone()));
            }
            cells
        };

        if wide || (!single && any_meta) {
            // One row per scenario, one column per selector. Long format also
            // lands here with a metadata selector present: a string-labeled
            // column cannot stack into a single Value column.
            let mut columns: Vec<String> = extra.to_vec();
            columns.extend(index_columns);
            columns.extend(selector_labels);
            let rows = out_rows
                .into_iter()
                .map(|(extra_cells, key, values)| {
                    let mut row = extra_cells;
                    row.extend(index_cells(&key));
                    row.extend(values.into_iter().map(Cell::from_value));
                    row
                })
                .collect();
            return Table { columns, rows };
        }

        if single {
            let mut columns: Vec<String> = extra.to_vec();
            columns.extend(index_columns);
            columns.push(VALUE_COLUMN.to_string());
            let rows = out_rows
                .into_iter()
                .map(|(extra_cells, key, values)| {
                    let mut row = extra_cells;
                    row.extend(index_cells(&key));
                    row.push(Cell::from_value(values[0]));
                    row
                })
                .collect();
            return Table { columns, rows };
        }

        // Long: one row per scenario and year.
        let mut columns: Vec<String> = extra.to_vec();
        columns.extend(index_columns);
        columns.push("Year".to_string());
        columns.push(VALUE_COLUMN.to_string());
        let years: Vec<f64> = self
            .frame
            .columns()
            .iter()
            .map(|s| match s {
                crate::algebra::YearSelector::Year(y) => *y,
                crate::algebra::YearSelector::Meta(_) => unreachable!("handled above"),
            })
            .collect();
        let mut rows = Vec::new();
        for (extra_cells, key, values) in out_rows {
            for (i, v) in values.into_iter().enumerate() {
                let mut row = extra_cells.clone();
                row.extend(index_cells(&key));
                row.push(Cell::Number(years[i]));
                row.push(Cell::from_value(v));
                rows.push(row);
            }
        }
        Table { columns, rows }
    }
}

/// Extra-column cells come from the vetted table first, falling back to the
/// full table for re-admitted unvetted scenarios.
fn meta_cell(data: &Dataset, name: &str, column: &str) -> Cell {
    let cell = data
        .vetted
        .get(name, column)
        .or_else(|| data.meta.get(name, column));
    Cell::from_meta(cell)
}

fn ip_codes() -> Vec<&'static str> {
    IP_SCENARIOS.iter().map(|e| e.code).collect()
}

fn ssp_codes() -> Vec<&'static str> {
    SSP_SCENARIOS.iter().map(|e| e.code).collect()
}

fn resolve_codes(
    filter: &PathwayFilter,
    registry: &'static str,
    valid: &[&'static str],
) -> Result<Vec<String>> {
    match filter {
        PathwayFilter::All => Ok(valid.iter().map(|c| c.to_string()).collect()),
        PathwayFilter::Codes(codes) => {
            for code in codes {
                if !valid.contains(&code.as_str()) {
                    return Err(AlgebraError::UnknownPathwayCode {
                        registry,
                        code: code.clone(),
                        valid: valid.join(", "),
                    });
                }
            }
            Ok(codes.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{VarQuery, YearSelector};
    use crate::store::{Ledger, MetaTable, Observation};

    /// Three vetted scenarios with categories, plus the SSP4-34 registry
    /// scenario which fails vetting.
    fn dataset() -> Dataset {
        let mut ledger = Ledger::with_years(vec![2020, 2025, 2030]);
        ledger.push(Observation::new("M1", "A", "World", "Emissions|CO2", "Gt CO2/yr", vec![10.0, 8.0, 5.0]));
        ledger.push(Observation::new("M2", "B", "World", "Emissions|CO2", "Gt CO2/yr", vec![20.0, 18.0, 15.0]));
        ledger.push(Observation::new("WITCH 5.0", "CO_Bridge", "World", "Emissions|CO2", "Gt CO2/yr", vec![30.0, 25.0, 22.0]));
        ledger.push(Observation::new("GCAM 4.2", "SSP4-34", "World", "Emissions|CO2", "Gt CO2/yr", vec![40.0, 38.0, 33.0]));

        let mut meta = MetaTable::from_ledger(&ledger);
        meta.set("M1 A", "Category", Some("C1".into()));
        meta.set("M2 B", "Category", Some("C5".into()));
        meta.set("WITCH 5.0 CO_Bridge", "Category", Some("C3".into()));
        meta.set("GCAM 4.2 SSP4-34", "Category", Some("C6".into()));
        meta.tag_reference_pathways();

        // SSP4-34 fails vetting
        let vetted = meta.filtered(|name| name != "GCAM 4.2 SSP4-34");
        Dataset::new(ledger, meta, vetted)
    }

    fn co2_at_2020(data: &Dataset) -> Var {
        data.var(VarQuery::variable("Emissions|CO2").year(2020)).unwrap()
    }

    #[test]
    fn test_meta_filter_discrete_values() {
        let data = dataset();
        let var = co2_at_2020(&data);
        let table = var
            .select(
                &data,
                &SelectOptions::new().meta(
                    "Category",
                    MetaFilter::Values(vec![Predicate::eq("C1"), Predicate::eq("C3")]),
                ),
            )
            .unwrap();
        assert_eq!(table.columns, vec!["Category", "Name", "Value"]);
        let names: Vec<_> = table.column("Name").unwrap();
        assert_eq!(
            names,
            vec![&Cell::Text("M1 A".into()), &Cell::Text("WITCH 5.0 CO_Bridge".into())]
        );
    }

    #[test]
    fn test_name_filter_selects_by_scenario_name() {
        let data = dataset();
        let var = co2_at_2020(&data);
        let table = var
            .select(
                &data,
                &SelectOptions::new()
                    .meta("Name", MetaFilter::Values(vec![Predicate::eq("M2 B")])),
            )
            .unwrap();
        // The key column filters without adding an extra output column
        assert_eq!(table.columns, vec!["Name", "Value"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Text("M2 B".into()));
    }

    #[test]
    fn test_unknown_meta_column_fails() {
        let data = dataset();
        let var = co2_at_2020(&data);
        let err = var
            .select(&data, &SelectOptions::new().meta("Kategory", MetaFilter::Any))
            .unwrap_err();
        assert_eq!(err, AlgebraError::UnknownMetadataColumn("Kategory".into()));
    }

    #[test]
    fn test_meta_and_value_filter_conjunction() {
        let data = dataset();
        let var = co2_at_2020(&data);
        // Category in {C1, C5} AND value in [0, 15]: only M1 A passes both
        let table = var
            .select(
                &data,
                &SelectOptions::new()
                    .meta(
                        "Category",
                        MetaFilter::Values(vec![Predicate::eq("C1"), Predicate::eq("C5")]),
                    )
                    .value([Predicate::between(0.0, 15.0)]),
            )
            .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], Cell::Text("M1 A".into()));
    }

    #[test]
    fn test_value_filter_all_columns_must_pass() {
        let data = dataset();
        // Full series: conjunction across the three years
        let var = data.var(VarQuery::variable("Emissions|CO2")).unwrap();
        let table = var
            .select(&data, &SelectOptions::new().value([Predicate::between(0.0, 19.0)]).wide())
            .unwrap();
        // M2 B has 20.0 in 2020 and is excluded even though later years pass
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Text("M1 A".into()));
    }

    #[test]
    fn test_ip_round_trip() {
        let data = dataset();
        let var = co2_at_2020(&data);
        let table = var
            .select(&data, &SelectOptions::new().ip(PathwayFilter::codes(["GS"])))
            .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], Cell::Text("WITCH 5.0 CO_Bridge".into()));
        assert_eq!(table.rows[0][0], Cell::Text("GS".into()));
    }

    #[test]
    fn test_unknown_ip_code_fails() {
        let data = dataset();
        let var = co2_at_2020(&data);
        let err = var
            .select(&data, &SelectOptions::new().ip(PathwayFilter::codes(["IMP-XX"])))
            .unwrap_err();
        match err {
            AlgebraError::UnknownPathwayCode { registry, code, valid } => {
                assert_eq!(registry, "IP");
                assert_eq!(code, "IMP-XX");
                assert!(valid.contains("CurPol"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ssp_readmits_unvetted_reference_scenario() {
        let data = dataset();
        let var = co2_at_2020(&data);
        // SSP4-34 fails vetting but must still be selectable by code
        let table = var
            .select(&data, &SelectOptions::new().ssp(PathwayFilter::codes(["SSP4-34"])))
            .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], Cell::Text("GCAM 4.2 SSP4-34".into()));
        assert_eq!(table.rows[0][0], Cell::Text("SSP4-34".into()));
    }

    #[test]
    fn test_long_format_stacks_years() {
        let data = dataset();
        let var = data
            .var(VarQuery::variable("Emissions|CO2").years([2020, 2025]))
            .unwrap();
        let table = var
            .select(
                &data,
                &SelectOptions::new().meta("Category", MetaFilter::Values(vec![Predicate::eq("C1")])),
            )
            .unwrap();
        assert_eq!(table.columns, vec!["Category", "Name", "Year", "Value"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], Cell::Number(2020.0));
        assert_eq!(table.rows[0][3], Cell::Number(10.0));
        assert_eq!(table.rows[1][2], Cell::Number(2025.0));
    }

    #[test]
    fn test_wide_format_one_column_per_selector() {
        let data = dataset();
        let var = data
            .var(VarQuery::variable("Emissions|CO2").years([2020, 2025]))
            .unwrap();
        let table = var.select(&data, &SelectOptions::new().wide()).unwrap();
        assert_eq!(table.columns, vec!["Name", "2020", "2025"]);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_meta_selector_forces_unstacked_long() {
        let data = {
            let mut d = dataset();
            d.meta.set("M1 A", "Net zero CO2", Some(2027.5.into()));
            d.vetted.set("M1 A", "Net zero CO2", Some(2027.5.into()));
            d
        };
        let var = data
            .var(
                VarQuery::variable("Emissions|CO2")
                    .year(2020)
                    .year(YearSelector::meta("Net zero CO2")),
            )
            .unwrap();
        let table = var.select(&data, &SelectOptions::new()).unwrap();
        // String-labeled selector column cannot stack into a Value column
        assert_eq!(table.columns, vec!["Name", "2020", "Net zero CO2"]);
    }

    #[test]
    fn test_sorted_by_extra_columns() {
        let data = dataset();
        let var = co2_at_2020(&data);
        let table = var
            .select(&data, &SelectOptions::new().meta("Category", MetaFilter::Any))
            .unwrap();
        let categories: Vec<_> = table.column("Category").unwrap();
        assert_eq!(
            categories,
            vec![&Cell::Text("C1".into()), &Cell::Text("C3".into()), &Cell::Text("C5".into())]
        );
    }

    #[test]
    fn test_missing_value_leaves_empty_trace() {
        let mut ledger = Ledger::with_years(vec![2020, 2025]);
        ledger.push(Observation::new("M", "S", "World", "Emissions|CO2", "Gt CO2/yr", vec![1.0, f64::NAN]));
        let data = Dataset::unvetted(ledger);
        let var = data.var(VarQuery::variable("Emissions|CO2")).unwrap();
        let table = var.select(&data, &SelectOptions::new()).unwrap();
        assert_eq!(table.columns, vec!["Name", "Year", "Value"]);
        assert_eq!(table.rows[1][2], Cell::Empty);
    }

    #[test]
    fn test_table_json_round_trip() {
        let table = Table {
            columns: vec!["Name".into(), "Value".into()],
            rows: vec![vec![Cell::Text("M S".into()), Cell::Number(1.5)]],
        };
        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
