//! Schema Checks
//! Column existence checks performed before any aggregation touches the data.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{context}: missing column(s) {}", .columns.join(", "))]
    MissingColumns {
        context: String,
        columns: Vec<String>,
    },
    #[error("{context}: need at least {required} numeric columns, found {found}")]
    InsufficientColumns {
        context: String,
        required: usize,
        found: usize,
    },
    #[error("{context}: column {column} could not be read ({reason})")]
    Unreadable {
        context: String,
        column: String,
        reason: String,
    },
}

impl SchemaError {
    /// Columns named by the error, if any.
    pub fn columns(&self) -> Vec<String> {
        match self {
            SchemaError::MissingColumns { columns, .. } => columns.clone(),
            SchemaError::Unreadable { column, .. } => vec![column.clone()],
            SchemaError::InsufficientColumns { .. } => Vec::new(),
        }
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Return the subset of `columns` absent from `df`, preserving order.
pub fn missing_columns<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Vec<String> {
    columns
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !has_column(df, name))
        .map(str::to_string)
        .collect()
}

/// Fail with every missing column at once rather than the first one hit.
pub fn require_columns<S: AsRef<str>>(
    df: &DataFrame,
    columns: &[S],
    context: &str,
) -> Result<(), SchemaError> {
    let missing = missing_columns(df, columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns {
            context: context.to_string(),
            columns: missing,
        })
    }
}

/// Read a column as nullable integer codes. A value is a code only when it
/// is an exact integer; fractional, non-numeric and null values become `None`.
pub fn int_codes(df: &DataFrame, column: &str, context: &str) -> Result<Vec<Option<i64>>, SchemaError> {
    require_columns(df, &[column], context)?;
    let unreadable = |e: PolarsError| SchemaError::Unreadable {
        context: context.to_string(),
        column: column.to_string(),
        reason: e.to_string(),
    };

    let series = df.column(column).map_err(unreadable)?;
    let dtype = series.dtype();

    if dtype.is_integer() {
        let casted = series.cast(&DataType::Int64).map_err(unreadable)?;
        let ca = casted.i64().map_err(unreadable)?;
        return Ok(ca.into_iter().collect());
    }

    if matches!(dtype, DataType::String) {
        let ca = series.str().map_err(unreadable)?;
        return Ok(ca.into_iter().map(|v| v.and_then(parse_code)).collect());
    }

    let casted = series.cast(&DataType::Float64).map_err(unreadable)?;
    let ca = casted.f64().map_err(unreadable)?;
    Ok(ca.into_iter().map(|v| v.and_then(integral_code)).collect())
}

fn parse_code(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(integral_code))
}

/// `2.0` is code 2; `1.7`, NaN and out-of-range values are not codes.
fn integral_code(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Read a column as nullable floats.
pub fn float_values(df: &DataFrame, column: &str, context: &str) -> Result<Vec<Option<f64>>, SchemaError> {
    require_columns(df, &[column], context)?;
    let unreadable = |e: PolarsError| SchemaError::Unreadable {
        context: context.to_string(),
        column: column.to_string(),
        reason: e.to_string(),
    };

    let series = df.column(column).map_err(unreadable)?;
    let casted = series.cast(&DataType::Float64).map_err(unreadable)?;
    let ca = casted.f64().map_err(unreadable)?;
    Ok(ca.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

/// Read a column as nullable strings.
pub fn text_values(df: &DataFrame, column: &str, context: &str) -> Result<Vec<Option<String>>, SchemaError> {
    require_columns(df, &[column], context)?;
    let unreadable = |e: PolarsError| SchemaError::Unreadable {
        context: context.to_string(),
        column: column.to_string(),
        reason: e.to_string(),
    };

    let series = df.column(column).map_err(unreadable)?;
    let casted = series.cast(&DataType::String).map_err(unreadable)?;
    let ca = casted.str().map_err(unreadable)?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}
