use serde::{Deserialize, Serialize};

/// Builds the unique scenario name from the model and scenario labels.
pub fn scenario_name(model: &str, scenario: &str) -> String {
    format!("{} {}", model, scenario)
}

/// One row of the observation ledger.
///
/// `values` is aligned to the ledger's year grid; `f64::NAN` marks a missing
/// sample. Rows are immutable once stored; derived rows are appended, never
/// edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub model: String,
    pub scenario: String,
    /// Model + " " + Scenario, the unique scenario identifier.
    pub name: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
    pub values: Vec<f64>,
}

impl Observation {
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        region: impl Into<String>,
        variable: impl Into<String>,
        unit: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        let model = model.into();
        let scenario = scenario.into();
        let name = scenario_name(&model, &scenario);
        Self {
            model,
            scenario,
            name,
            region: region.into(),
            variable: variable.into(),
            unit: unit.into(),
            values,
        }
    }
}

/// A scalar metadata cell. Missing cells are `None` at the table level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl MetaValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetaValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self { MetaValue::Number(v) }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self { MetaValue::Text(v.to_string()) }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self { MetaValue::Text(v) }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self { MetaValue::Bool(v) }
}

/// A filter argument that is either a single value or a list.
///
/// The distinction is structural: a `One` filter narrows a Var without adding
/// an index dimension, a `Many` filter adds the corresponding secondary
/// dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn one(value: impl Into<String>) -> Self {
        OneOrMany::One(value.into())
    }

    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OneOrMany::Many(values.into_iter().map(Into::into).collect())
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            OneOrMany::One(v) => v == value,
            OneOrMany::Many(vs) => vs.iter().any(|v| v == value),
        }
    }

    pub fn as_list(&self) -> Vec<&str> {
        match self {
            OneOrMany::One(v) => vec![v.as_str()],
            OneOrMany::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}
