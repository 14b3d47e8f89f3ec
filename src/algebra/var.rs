//! var.rs
//! Var construction: a typed, unit-aware view over the ledger filtered to one
//! or more variables, indexed by scenario (and at most one secondary
//! dimension), holding values at one or more year selectors.

use crate::algebra::frame::{RowKey, ValueFrame, YearSelector};
use crate::constants::END_YEAR;
use crate::error::{AlgebraError, Result};
use crate::interp;
use crate::store::{Ledger, MetaTable, Observation, OneOrMany};

/// Index dimensions of a Var, fixed at construction.
///
/// A list-valued filter argument adds the matching secondary dimension; a
/// scalar filter narrows the view without adding one. At most one secondary
/// dimension is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDims {
    ScenarioOnly,
    ScenarioByRegion,
    ScenarioByVariable,
    ScenarioByUnit,
}

impl VarDims {
    /// Name of the secondary index dimension, if any.
    pub fn secondary(&self) -> Option<&'static str> {
        match self {
            VarDims::ScenarioOnly => None,
            VarDims::ScenarioByRegion => Some("Region"),
            VarDims::ScenarioByVariable => Some("Variable"),
            VarDims::ScenarioByUnit => Some("Unit"),
        }
    }

    /// Ordered index column names, scenario name first.
    pub fn index_columns(&self) -> Vec<String> {
        let mut cols = vec!["Name".to_string()];
        if let Some(s) = self.secondary() {
            cols.push(s.to_string());
        }
        cols
    }
}

/// An immutable scenario-indexed value view. Built by [`Dataset::var`] or by
/// arithmetic on existing Vars.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub dims: VarDims,
    pub frame: ValueFrame,
    /// Display unit; synthesized for composite Vars.
    pub unit: String,
    /// Fill value for missing entries, also used by arithmetic NaN-filling.
    pub default: Option<f64>,
}

impl Var {
    /// A Var over fixed, already-assembled values.
    pub fn from_values(dims: VarDims, frame: ValueFrame, unit: impl Into<String>) -> Self {
        Self { dims, frame, unit: unit.into(), default: None }
    }

    pub fn index_columns(&self) -> Vec<String> {
        self.dims.index_columns()
    }
}

/// Construction request for a Var. Exactly one of `variable` / `values` must
/// be supplied.
#[derive(Debug, Clone, Default)]
pub struct VarQuery {
    variable: Option<OneOrMany>,
    values: Option<(VarDims, ValueFrame)>,
    selectors: Option<Vec<YearSelector>>,
    region: Option<OneOrMany>,
    unit: Option<OneOrMany>,
    display_unit: Option<String>,
    default: Option<f64>,
    make_positive: bool,
}

impl VarQuery {
    pub fn variable(name: impl Into<String>) -> Self {
        Self { variable: Some(OneOrMany::one(name)), ..Self::default() }
    }

    pub fn variables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { variable: Some(OneOrMany::many(names)), ..Self::default() }
    }

    pub fn values(dims: VarDims, frame: ValueFrame) -> Self {
        Self { values: Some((dims, frame)), ..Self::default() }
    }

    /// Adds one year selector (call repeatedly to mix kinds).
    pub fn year(mut self, selector: impl Into<YearSelector>) -> Self {
        self.selectors.get_or_insert_with(Vec::new).push(selector.into());
        self
    }

    /// Adds a metadata-column selector (scenario-specific year).
    pub fn meta_year(self, column: impl Into<String>) -> Self {
        self.year(YearSelector::meta(column))
    }

    pub fn years<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<YearSelector>,
    {
        self.selectors
            .get_or_insert_with(Vec::new)
            .extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(OneOrMany::one(region));
        self
    }

    pub fn regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.region = Some(OneOrMany::many(regions));
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(OneOrMany::one(unit));
        self
    }

    pub fn units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unit = Some(OneOrMany::many(units));
        self
    }

    /// Overrides the display unit string.
    pub fn display_unit(mut self, unit: impl Into<String>) -> Self {
        self.display_unit = Some(unit.into());
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }

    /// Replaces assembled values with their absolute value.
    pub fn make_positive(mut self) -> Self {
        self.make_positive = true;
        self
    }
}

/// An immutable snapshot of ledger + metadata, the entry point for building
/// Vars. `meta` holds every imported scenario; `vetted` the subset passing
/// vetting, which is what selection filters run against.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub ledger: Ledger,
    pub meta: MetaTable,
    pub vetted: MetaTable,
}

impl Dataset {
    pub fn new(ledger: Ledger, meta: MetaTable, vetted: MetaTable) -> Self {
        Self { ledger, meta, vetted }
    }

    /// A dataset without a vetting pass: every scenario counts as vetted.
    pub fn unvetted(ledger: Ledger) -> Self {
        let meta = MetaTable::from_ledger(&ledger);
        let vetted = meta.clone();
        Self { ledger, meta, vetted }
    }

    /// Builds a Var from a query against this dataset.
    pub fn var(&self, query: VarQuery) -> Result<Var> {
        match (&query.variable, &query.values) {
            (None, None) => {
                return Err(AlgebraError::ArgumentConflict(
                    "`variable` and `values` cannot both be None".into(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(AlgebraError::ArgumentConflict(
                    "`variable` and `values` cannot both be defined".into(),
                ))
            }
            _ => {}
        }

        if let Some((dims, frame)) = query.values {
            let mut var = Var::from_values(dims, frame, query.display_unit.unwrap_or_default());
            var.default = query.default;
            return Ok(finish(var, query.make_positive));
        }

        let variable = query.variable.as_ref().expect("checked above");
        let dims = decide_dims(variable, query.region.as_ref(), query.unit.as_ref())?;

        let unit = match &query.display_unit {
            Some(u) => u.clone(),
            None => self.ledger.display_unit(variable),
        };

        let selectors = match query.selectors {
            Some(s) => s,
            None => self.ledger.years().iter().map(|&y| y.into()).collect(),
        };

        let mut frame = ValueFrame::new(selectors.clone());
        let rows = self
            .ledger
            .filter(variable, query.region.as_ref(), query.unit.as_ref());
        for row in rows {
            let key = row_key(row, dims);
            let values = self.assemble_row(row, &selectors);
            frame.insert(key, values);
        }

        let mut var = Var { dims, frame, unit, default: query.default };
        if let Some(d) = var.default {
            var.frame = var.frame.fill_missing(d);
        }
        Ok(finish(var, query.make_positive))
    }

    /// A Var over metadata columns instead of ledger years: one column per
    /// metadata column, unit `"[meta]"`, rows spanning every imported scenario.
    pub fn meta_var(&self, columns: &OneOrMany) -> Result<Var> {
        for column in columns.as_list() {
            if !self.meta.has_column(column) {
                return Err(AlgebraError::UnknownMetadataColumn(column.to_string()));
            }
        }
        let selectors: Vec<YearSelector> = columns
            .as_list()
            .iter()
            .map(|c| YearSelector::meta(*c))
            .collect();
        let mut frame = ValueFrame::new(selectors.clone());
        for name in self.meta.names() {
            let values = columns
                .as_list()
                .iter()
                .map(|c| self.meta.number(name, c).unwrap_or(f64::NAN))
                .collect();
            frame.insert(RowKey::scenario(name), values);
        }
        Ok(Var::from_values(VarDims::ScenarioOnly, frame, "[meta]"))
    }

    /// One assembled value per selector for a ledger row, routing each
    /// selector through direct lookup, interpolation or the scenario-specific
    /// metadata-year mode.
    fn assemble_row(&self, row: &Observation, selectors: &[YearSelector]) -> Vec<f64> {
        let years = self.ledger.years();
        selectors
            .iter()
            .map(|selector| match selector {
                YearSelector::Year(y) => interp::interp_at(years, &row.values, *y),
                YearSelector::Meta(column) => {
                    match self.meta.number(&row.name, column) {
                        // Clip to last in-range year + 1; beyond that the
                        // scenario has no meaningful sample year.
                        Some(m) if m.min((END_YEAR + 1) as f64) <= END_YEAR as f64 => {
                            interp::interp_at(years, &row.values, m)
                        }
                        _ => f64::NAN,
                    }
                }
            })
            .collect()
    }
}

fn finish(var: Var, make_positive: bool) -> Var {
    if make_positive {
        Var { frame: var.frame.map_values(f64::abs), ..var }
    } else {
        var
    }
}

fn decide_dims(
    variable: &OneOrMany,
    region: Option<&OneOrMany>,
    unit: Option<&OneOrMany>,
) -> Result<VarDims> {
    let mut dims = Vec::new();
    if variable.is_many() {
        dims.push(VarDims::ScenarioByVariable);
    }
    if region.is_some_and(OneOrMany::is_many) {
        dims.push(VarDims::ScenarioByRegion);
    }
    if unit.is_some_and(OneOrMany::is_many) {
        dims.push(VarDims::ScenarioByUnit);
    }
    match dims.len() {
        0 => Ok(VarDims::ScenarioOnly),
        1 => Ok(dims[0]),
        _ => Err(AlgebraError::ArgumentConflict(
            "at most one of `variable`, `region`, `unit` may be list-valued".into(),
        )),
    }
}

fn row_key(row: &Observation, dims: VarDims) -> RowKey {
    match dims {
        VarDims::ScenarioOnly => RowKey::scenario(&row.name),
        VarDims::ScenarioByRegion => RowKey::with_secondary(&row.name, &row.region),
        VarDims::ScenarioByVariable => RowKey::with_secondary(&row.name, &row.variable),
        VarDims::ScenarioByUnit => RowKey::with_secondary(&row.name, &row.unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Observation;

    fn dataset() -> Dataset {
        let mut ledger = Ledger::with_years(vec![2020, 2025, 2030]);
        ledger.push(Observation::new(
            "M", "S1", "World", "Emissions|CO2", "Gt CO2/yr", vec![10.0, 20.0, 30.0],
        ));
        ledger.push(Observation::new(
            "M", "S2", "World", "Emissions|CO2", "Gt CO2/yr", vec![40.0, f64::NAN, 60.0],
        ));
        ledger.push(Observation::new(
            "M", "S1", "World", "Final Energy", "EJ/yr", vec![1.0, 2.0, 3.0],
        ));
        Dataset::unvetted(ledger)
    }

    #[test]
    fn test_argument_conflict() {
        let data = dataset();
        let err = data.var(VarQuery::default()).unwrap_err();
        assert!(matches!(err, AlgebraError::ArgumentConflict(_)));

        let mut query = VarQuery::variable("Emissions|CO2");
        query.values = Some((VarDims::ScenarioOnly, ValueFrame::new(vec![])));
        let err = data.var(query).unwrap_err();
        assert!(matches!(err, AlgebraError::ArgumentConflict(_)));
    }

    #[test]
    fn test_values_constructor_builds_fixed_var() {
        let data = dataset();
        let mut frame = ValueFrame::new(vec![2050.into()]);
        frame.insert(RowKey::scenario("M S1"), vec![7.0]);
        let var = data
            .var(VarQuery::values(VarDims::ScenarioOnly, frame).display_unit("EJ/yr"))
            .unwrap();
        assert_eq!(var.dims, VarDims::ScenarioOnly);
        assert_eq!(var.unit, "EJ/yr");
        assert_eq!(var.frame.get(&RowKey::scenario("M S1")), Some(&[7.0][..]));
    }

    #[test]
    fn test_scalar_filter_keeps_scenario_only_dims() {
        let data = dataset();
        let var = data
            .var(VarQuery::variable("Emissions|CO2").region("World").year(2020))
            .unwrap();
        assert_eq!(var.dims, VarDims::ScenarioOnly);
        assert_eq!(var.unit, "Gt CO2/yr");
        assert_eq!(var.frame.get(&RowKey::scenario("M S1")), Some(&[10.0][..]));
    }

    #[test]
    fn test_list_variable_adds_dimension() {
        let data = dataset();
        let var = data
            .var(VarQuery::variables(["Emissions|CO2", "Final Energy"]).year(2020))
            .unwrap();
        assert_eq!(var.dims, VarDims::ScenarioByVariable);
        assert_eq!(var.unit, "EJ/yr or Gt CO2/yr");
        let key = RowKey::with_secondary("M S1", "Final Energy");
        assert_eq!(var.frame.get(&key), Some(&[1.0][..]));
    }

    #[test]
    fn test_two_list_filters_conflict() {
        let data = dataset();
        let err = data
            .var(VarQuery::variables(["A", "B"]).regions(["World", "R5ASIA"]))
            .unwrap_err();
        assert!(matches!(err, AlgebraError::ArgumentConflict(_)));
    }

    #[test]
    fn test_mixed_selectors() {
        let data = dataset();
        let var = data
            .var(VarQuery::variable("Emissions|CO2").year(2020).year(2022.5))
            .unwrap();
        // 2020 sampled directly, 2022.5 interpolated
        assert_eq!(var.frame.get(&RowKey::scenario("M S1")), Some(&[10.0, 15.0][..]));
        // S2's 2025 sample is missing, so its midpoint is NaN
        let s2 = var.frame.get(&RowKey::scenario("M S2")).unwrap();
        assert_eq!(s2[0], 40.0);
        assert!(s2[1].is_nan());
    }

    #[test]
    fn test_default_fills_assembled_result() {
        let data = dataset();
        let var = data
            .var(VarQuery::variable("Emissions|CO2").year(2025).default_value(0.0))
            .unwrap();
        assert_eq!(var.frame.get(&RowKey::scenario("M S2")), Some(&[0.0][..]));
    }

    #[test]
    fn test_make_positive() {
        let mut ledger = Ledger::with_years(vec![2020]);
        ledger.push(Observation::new("M", "S", "World", "LULUCF", "Gt CO2/yr", vec![-5.0]));
        let data = Dataset::unvetted(ledger);
        let var = data
            .var(VarQuery::variable("LULUCF").year(2020).make_positive())
            .unwrap();
        assert_eq!(var.frame.get(&RowKey::scenario("M S")), Some(&[5.0][..]));
    }

    #[test]
    fn test_meta_year_selector() {
        let data = {
            let mut d = dataset();
            d.meta.set("M S1", "Net zero CO2", Some(2022.5.into()));
            d.meta.set("M S2", "Net zero CO2", Some(2150.0.into()));
            d
        };
        let var = data
            .var(VarQuery::variable("Emissions|CO2").meta_year("Net zero CO2"))
            .unwrap();
        assert_eq!(var.frame.get(&RowKey::scenario("M S1")), Some(&[15.0][..]));
        // Out-of-range metadata year resolves to NaN, not an error
        assert!(var.frame.get(&RowKey::scenario("M S2")).unwrap()[0].is_nan());
    }

    #[test]
    fn test_meta_var() {
        let data = {
            let mut d = dataset();
            d.meta.set("M S1", "GHG 2030", Some(55.0.into()));
            d
        };
        let var = data.meta_var(&OneOrMany::one("GHG 2030")).unwrap();
        assert_eq!(var.unit, "[meta]");
        assert_eq!(var.frame.get(&RowKey::scenario("M S1")), Some(&[55.0][..]));
        assert!(var.frame.get(&RowKey::scenario("M S2")).unwrap()[0].is_nan());

        let err = data.meta_var(&OneOrMany::one("Nope")).unwrap_err();
        assert!(matches!(err, AlgebraError::UnknownMetadataColumn(_)));
    }
}
