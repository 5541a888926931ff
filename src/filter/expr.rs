//! Expression-based filtering for event data
//!
//! This module provides the declarative boolean filter handed to event sources. An
//! [`Expr`] can be serialized for a remote store or evaluated locally against Arrow
//! record batches. Null cells never match a comparison.

use std::fmt;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Datum, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::compute::kernels::cmp;
use arrow::compute::{and, is_not_null, is_null, not, or};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CohortError, Result};

/// Represents a filter expression over event columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Column equals a literal value
    Eq(String, LiteralValue),

    /// Column not equals a literal value
    NotEq(String, LiteralValue),

    /// Column is greater than a literal value
    Gt(String, LiteralValue),

    /// Column is greater than or equal to a literal value
    GtEq(String, LiteralValue),

    /// Column is less than a literal value
    Lt(String, LiteralValue),

    /// Column is less than or equal to a literal value
    LtEq(String, LiteralValue),

    /// Column is in a set of values
    In(String, Vec<LiteralValue>),

    /// Column is not in a set of values
    NotIn(String, Vec<LiteralValue>),

    /// Column is null
    IsNull(String),

    /// Column is not null
    IsNotNull(String),

    /// Logical AND of expressions
    And(Vec<Expr>),

    /// Logical OR of expressions
    Or(Vec<Expr>),

    /// Logical NOT of an expression
    Not(Box<Expr>),

    /// Always evaluates to true
    AlwaysTrue,

    /// Always evaluates to false
    AlwaysFalse,
}

/// Represents a literal value that can be used in filter expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    /// Boolean value
    Boolean(bool),

    /// Integer value
    Int(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),

    /// Null value
    Null,
}

impl LiteralValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Null => f.write_str("NULL"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, exprs: &[Expr], op: &str| -> fmt::Result {
            f.write_str("(")?;
            for (i, expr) in exprs.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{expr}")?;
            }
            f.write_str(")")
        };

        match self {
            Self::Eq(c, v) => write!(f, "{c} = {v}"),
            Self::NotEq(c, v) => write!(f, "{c} != {v}"),
            Self::Gt(c, v) => write!(f, "{c} > {v}"),
            Self::GtEq(c, v) => write!(f, "{c} >= {v}"),
            Self::Lt(c, v) => write!(f, "{c} < {v}"),
            Self::LtEq(c, v) => write!(f, "{c} <= {v}"),
            Self::In(c, values) => write!(f, "{c} IN [{} values]", values.len()),
            Self::NotIn(c, values) => write!(f, "{c} NOT IN [{} values]", values.len()),
            Self::IsNull(c) => write!(f, "{c} IS NULL"),
            Self::IsNotNull(c) => write!(f, "{c} IS NOT NULL"),
            Self::And(exprs) => join(f, exprs, "AND"),
            Self::Or(exprs) => join(f, exprs, "OR"),
            Self::Not(expr) => write!(f, "NOT {expr}"),
            Self::AlwaysTrue => f.write_str("TRUE"),
            Self::AlwaysFalse => f.write_str("FALSE"),
        }
    }
}

impl Expr {
    /// Returns the set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> FxHashSet<String> {
        let mut columns = FxHashSet::default();
        self.collect_required_columns(&mut columns);
        columns
    }

    fn collect_required_columns(&self, columns: &mut FxHashSet<String>) {
        match self {
            Self::Eq(col, _)
            | Self::NotEq(col, _)
            | Self::Gt(col, _)
            | Self::GtEq(col, _)
            | Self::Lt(col, _)
            | Self::LtEq(col, _)
            | Self::In(col, _)
            | Self::NotIn(col, _)
            | Self::IsNull(col)
            | Self::IsNotNull(col) => {
                columns.insert(col.clone());
            }
            Self::And(exprs) | Self::Or(exprs) => {
                for expr in exprs {
                    expr.collect_required_columns(columns);
                }
            }
            Self::Not(expr) => expr.collect_required_columns(columns),
            Self::AlwaysTrue | Self::AlwaysFalse => {}
        }
    }

    /// Evaluate the expression against a record batch
    ///
    /// # Returns
    /// A null-free boolean mask with one entry per row
    pub fn evaluate(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        let rows = batch.num_rows();
        match self {
            Self::AlwaysTrue => Ok(BooleanArray::from(vec![true; rows])),
            Self::AlwaysFalse => Ok(BooleanArray::from(vec![false; rows])),
            Self::And(exprs) => {
                let mut result = BooleanArray::from(vec![true; rows]);
                for expr in exprs {
                    result = and(&result, &expr.evaluate(batch)?)?;
                }
                Ok(result)
            }
            Self::Or(exprs) => {
                let mut result = BooleanArray::from(vec![false; rows]);
                for expr in exprs {
                    result = or(&result, &expr.evaluate(batch)?)?;
                }
                Ok(result)
            }
            Self::Not(expr) => Ok(not(&expr.evaluate(batch)?)?),
            Self::Eq(col, value) => compare(batch, col, value, cmp::eq),
            Self::NotEq(col, value) => compare(batch, col, value, cmp::neq),
            Self::Gt(col, value) => compare(batch, col, value, cmp::gt),
            Self::GtEq(col, value) => compare(batch, col, value, cmp::gt_eq),
            Self::Lt(col, value) => compare(batch, col, value, cmp::lt),
            Self::LtEq(col, value) => compare(batch, col, value, cmp::lt_eq),
            Self::In(col, values) => evaluate_in(column(batch, col)?, col, values),
            Self::NotIn(col, values) => {
                let column = column(batch, col)?;
                let inside = evaluate_in(column, col, values)?;
                // Null cells are in neither set
                let present = is_not_null(column.as_ref())?;
                Ok(and(&not(&inside)?, &present)?)
            }
            Self::IsNull(col) => Ok(is_null(column(batch, col)?.as_ref())?),
            Self::IsNotNull(col) => Ok(is_not_null(column(batch, col)?.as_ref())?),
        }
    }
}

/// Keep the rows of `batch` matching `expr`
pub fn filter_batch(batch: &RecordBatch, expr: &Expr) -> Result<RecordBatch> {
    let mask = expr.evaluate(batch)?;
    Ok(arrow::compute::filter_record_batch(batch, &mask)?)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| CohortError::query(format!("Column '{name}' not found")))
}

fn nulls_as_false(mask: BooleanArray) -> BooleanArray {
    if mask.null_count() == 0 {
        return mask;
    }
    mask.iter().map(|v| Some(v.unwrap_or(false))).collect()
}

fn type_error(col: &str, data_type: &DataType, value: &LiteralValue) -> CohortError {
    CohortError::query(format!(
        "Cannot compare column '{col}' of type {data_type} with {value}"
    ))
}

/// Build a scalar of the column's type from a literal
fn scalar_for(col: &str, data_type: &DataType, value: &LiteralValue) -> Result<Box<dyn Datum>> {
    let err = || type_error(col, data_type, value);
    let scalar: Box<dyn Datum> = match data_type {
        DataType::Utf8 => Box::new(StringArray::new_scalar(value.as_str().ok_or_else(err)?)),
        DataType::Int64 => Box::new(Int64Array::new_scalar(value.as_i64().ok_or_else(err)?)),
        DataType::Int32 => {
            let n = value.as_i64().ok_or_else(err)?;
            Box::new(Int32Array::new_scalar(i32::try_from(n).map_err(|_| err())?))
        }
        DataType::Float64 => Box::new(Float64Array::new_scalar(value.as_f64().ok_or_else(err)?)),
        _ => return Err(err()),
    };
    Ok(scalar)
}

fn compare(
    batch: &RecordBatch,
    col: &str,
    value: &LiteralValue,
    op: fn(&dyn Datum, &dyn Datum) -> std::result::Result<BooleanArray, arrow::error::ArrowError>,
) -> Result<BooleanArray> {
    let column = column(batch, col)?;
    if matches!(value, LiteralValue::Null) {
        return Ok(BooleanArray::from(vec![false; batch.num_rows()]));
    }
    let scalar = scalar_for(col, column.data_type(), value)?;
    let result = op(column, scalar.as_ref())?;
    Ok(nulls_as_false(result))
}

fn evaluate_in(column: &ArrayRef, col: &str, values: &[LiteralValue]) -> Result<BooleanArray> {
    match column.data_type() {
        DataType::Utf8 => {
            let array = column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| CohortError::query(format!("Column '{col}' is not a string array")))?;
            let set: FxHashSet<&str> = values.iter().filter_map(LiteralValue::as_str).collect();
            Ok(array
                .iter()
                .map(|v| Some(v.is_some_and(|s| set.contains(s))))
                .collect())
        }
        DataType::Int64 => {
            let array = column
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| CohortError::query(format!("Column '{col}' is not an int64 array")))?;
            let set: FxHashSet<i64> = values.iter().filter_map(LiteralValue::as_i64).collect();
            Ok(array
                .iter()
                .map(|v| Some(v.is_some_and(|n| set.contains(&n))))
                .collect())
        }
        other => Err(CohortError::query(format!(
            "IN is not supported for column '{col}' of type {other}"
        ))),
    }
}
