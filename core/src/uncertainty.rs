//! Row-wise evaluation of derived bound expressions.

use crate::derivation::MinMaxPair;
use crate::error::{MinMaxError, MinMaxResult};
use crate::expr::{evaluate, Bindings, Expr};
use crate::registry::Constant;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Values supplied for one symbol: a single broadcast value or a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Column {
    /// Value at `row`; scalars and one-element series broadcast
    fn at(&self, row: usize) -> f64 {
        match self {
            Self::Scalar(v) => *v,
            Self::Series(values) if values.len() == 1 => values[0],
            Self::Series(values) => values[row],
        }
    }

    /// Length if this column does not broadcast
    fn series_len(&self) -> Option<usize> {
        match self {
            Self::Series(values) if values.len() != 1 => Some(values.len()),
            _ => None,
        }
    }
}

impl From<f64> for Column {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Self::Series(values)
    }
}

/// Data columns keyed by symbol name (`M`, `dM`, ...), in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataColumns {
    columns: IndexMap<String, Column>,
}

impl DataColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, column: impl Into<Column>) -> Self {
        self.insert(name, column);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column: impl Into<Column>) {
        self.columns.insert(name.into(), column.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of rows after broadcasting
    pub fn row_count(&self) -> MinMaxResult<usize> {
        if self.columns.is_empty() {
            return Ok(0);
        }

        let mut lengths: Vec<usize> = self.columns.values().filter_map(Column::series_len).collect();
        lengths.sort_unstable();
        lengths.dedup();

        match lengths.len() {
            0 => Ok(1),
            1 if lengths[0] > 0 => Ok(lengths[0]),
            _ => Err(MinMaxError::DimensionMismatch { lengths }),
        }
    }

    fn row(&self, index: usize) -> IndexMap<String, f64> {
        self.columns
            .iter()
            .map(|(name, column)| (name.clone(), column.at(index)))
            .collect()
    }
}

/// One evaluated data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyRow {
    /// Input values for this row, in column order
    pub inputs: IndexMap<String, f64>,
    pub min: f64,
    pub max: f64,
    /// Half the spread between max and min
    #[serde(rename = "final")]
    pub final_uncertainty: f64,
}

/// Round half away from zero to `places` decimal places.
///
/// Past the precision of an `f64` the value is returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    if places > f64::DIGITS + 1 {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Evaluate the min/max pair for every data row
pub fn evaluate_rows(
    bounds: &MinMaxPair,
    constants: &[&Constant],
    data: &DataColumns,
    decimal_places: u32,
) -> MinMaxResult<Vec<UncertaintyRow>> {
    let rows = data.row_count()?;
    let mut out = Vec::with_capacity(rows);

    for index in 0..rows {
        let inputs = data.row(index);

        let mut bindings: Bindings = inputs.iter().map(|(k, v)| (k.clone(), *v)).collect();
        for constant in constants {
            bindings.insert(constant.name.clone(), constant.value);
        }

        let eval = |expr: &Expr| {
            evaluate(expr, &bindings).map_err(|source| MinMaxError::Evaluation { row: index, source })
        };
        let min = eval(&bounds.min)?;
        let max = eval(&bounds.max)?;
        if min > max {
            warn!(
                "Row {}: min {} exceeds max {}; the derived sign pattern does not hold here",
                index, min, max
            );
        }
        let final_uncertainty = (max - min) / 2.0;

        out.push(UncertaintyRow {
            inputs,
            min: round_to(min, decimal_places),
            max: round_to(max, decimal_places),
            final_uncertainty: round_to(final_uncertainty, decimal_places),
        });
    }

    Ok(out)
}
