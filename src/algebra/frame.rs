//! frame.rs
//! The 2-D value table behind a Var: rows keyed by (scenario name, optional
//! secondary label), columns keyed by year selector, cells f64 with NaN for
//! missing observations.

use std::collections::BTreeMap;

/// One column key of a [`ValueFrame`].
///
/// A literal year (sampled or interpolated) or the name of a metadata column
/// whose per-scenario numeric value designates a scenario-specific year.
#[derive(Debug, Clone, PartialEq)]
pub enum YearSelector {
    Year(f64),
    Meta(String),
}

impl YearSelector {
    pub fn meta(column: impl Into<String>) -> Self {
        YearSelector::Meta(column.into())
    }

    /// Display label: "2050", "2022.5" or the metadata column name.
    pub fn label(&self) -> String {
        match self {
            YearSelector::Year(y) if y.fract() == 0.0 => format!("{}", *y as i64),
            YearSelector::Year(y) => format!("{}", y),
            YearSelector::Meta(c) => c.clone(),
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, YearSelector::Meta(_))
    }
}

impl From<f64> for YearSelector {
    fn from(y: f64) -> Self { YearSelector::Year(y) }
}

impl From<i32> for YearSelector {
    fn from(y: i32) -> Self { YearSelector::Year(y as f64) }
}

/// Row identity inside a frame: scenario name plus the value of the secondary
/// dimension, when the owning Var carries one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub name: String,
    pub secondary: Option<String>,
}

impl RowKey {
    pub fn scenario(name: impl Into<String>) -> Self {
        Self { name: name.into(), secondary: None }
    }

    pub fn with_secondary(name: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self { name: name.into(), secondary: Some(secondary.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueFrame {
    columns: Vec<YearSelector>,
    rows: BTreeMap<RowKey, Vec<f64>>,
}

impl ValueFrame {
    pub fn new(columns: Vec<YearSelector>) -> Self {
        Self { columns, rows: BTreeMap::new() }
    }

    pub fn columns(&self) -> &[YearSelector] {
        &self.columns
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.columns.iter().map(YearSelector::label).collect()
    }

    pub fn column_position(&self, selector: &YearSelector) -> Option<usize> {
        self.columns.iter().position(|c| c == selector)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RowKey> {
        self.rows.keys()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&RowKey, &[f64])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn get(&self, key: &RowKey) -> Option<&[f64]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Inserts a row; the first insert for a key wins, matching the identity
    /// expectation that (scenario, secondary) is unique.
    pub fn insert(&mut self, key: RowKey, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.entry(key).or_insert(values);
    }

    /// Applies `f` to every cell.
    pub fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        for values in self.rows.values_mut() {
            for v in values.iter_mut() {
                *v = f(*v);
            }
        }
        self
    }

    /// Replaces NaN cells with `default`.
    pub fn fill_missing(self, default: f64) -> Self {
        self.map_values(|v| if v.is_nan() { default } else { v })
    }

    /// A single-column frame replicated over `columns` (the one-vs-many
    /// selector broadcast).
    pub fn replicate_single(&self, columns: &[YearSelector]) -> Self {
        debug_assert_eq!(self.columns.len(), 1);
        let mut out = Self::new(columns.to_vec());
        for (key, values) in self.rows() {
            out.insert(key.clone(), vec![values[0]; columns.len()]);
        }
        out
    }

    /// A frame with the same rows, columns permuted to `columns` (which must
    /// be a label-level permutation of the current columns).
    pub fn reorder_columns(&self, columns: &[YearSelector]) -> Self {
        let positions: Vec<usize> = columns
            .iter()
            .map(|c| {
                self.column_position(c)
                    .expect("reorder_columns requires a column permutation")
            })
            .collect();
        let mut out = Self::new(columns.to_vec());
        for (key, values) in self.rows() {
            out.insert(key.clone(), positions.iter().map(|&i| values[i]).collect());
        }
        out
    }

    /// Rows restricted to the scenario names in `names`, preserving order.
    pub fn subset_by_name(&self, names: &std::collections::HashSet<&str>) -> Self {
        let mut out = Self::new(self.columns.clone());
        for (key, values) in self.rows() {
            if names.contains(key.name.as_str()) {
                out.insert(key.clone(), values.to_vec());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_labels() {
        assert_eq!(YearSelector::Year(2050.0).label(), "2050");
        assert_eq!(YearSelector::Year(2022.5).label(), "2022.5");
        assert_eq!(YearSelector::meta("Net zero CO2").label(), "Net zero CO2");
    }

    #[test]
    fn test_first_insert_wins() {
        let mut frame = ValueFrame::new(vec![2050.into()]);
        frame.insert(RowKey::scenario("M S"), vec![1.0]);
        frame.insert(RowKey::scenario("M S"), vec![2.0]);
        assert_eq!(frame.get(&RowKey::scenario("M S")), Some(&[1.0][..]));
    }

    #[test]
    fn test_replicate_single() {
        let mut frame = ValueFrame::new(vec![2050.into()]);
        frame.insert(RowKey::scenario("M S"), vec![7.0]);
        let wide = frame.replicate_single(&[2030.into(), 2050.into(), 2100.into()]);
        assert_eq!(wide.get(&RowKey::scenario("M S")), Some(&[7.0, 7.0, 7.0][..]));
    }

    #[test]
    fn test_reorder_columns() {
        let mut frame = ValueFrame::new(vec![2030.into(), 2050.into()]);
        frame.insert(RowKey::scenario("M S"), vec![1.0, 2.0]);
        let flipped = frame.reorder_columns(&[2050.into(), 2030.into()]);
        assert_eq!(flipped.get(&RowKey::scenario("M S")), Some(&[2.0, 1.0][..]));
    }
}
