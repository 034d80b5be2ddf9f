//! Derived columns computed row by row

use polars::prelude::*;
use tracing::{error, info};

use crate::data::{Row, Table, Value};
use crate::error::Error;

/// List price column used by [`discount_pct`]
pub const MSRP: &str = "MSRP";
/// Actual sale price column used by [`discount_pct`]
pub const PRICE_EACH: &str = "PRICEEACH";

/// Discount off the list price, in percent
///
/// `(MSRP - PRICEEACH) / MSRP * 100` when the list price is above the sale
/// price, otherwise `0`: sales above list price are not negative discounts.
pub fn discount_pct(row: &Row<'_>) -> anyhow::Result<Value> {
    let msrp = row.f64(MSRP)?;
    let price = row.f64(PRICE_EACH)?;

    if msrp > price {
        Ok(Value::Float((msrp - price) / msrp * 100.0))
    } else {
        Ok(Value::Float(0.0))
    }
}

/// Add a column computed from every row
///
/// # Arguments
/// * `table` - Table to extend
/// * `new_name` - Name of the new column; must not exist yet
/// * `row_fn` - Pure function from a row to the new cell value
///
/// # Errors
/// * `DuplicateColumn` before anything is computed if `new_name` exists
/// * `Computation` on the first row `row_fn` fails for; nothing is written
pub fn add_column<F>(mut table: Table, new_name: &str, row_fn: F) -> crate::Result<Table>
where
    F: Fn(&Row<'_>) -> anyhow::Result<Value>,
{
    if table.has_column(new_name) {
        error!(column = new_name, "column already exists");
        return Err(Error::DuplicateColumn(new_name.to_string()));
    }

    let columns = table.columns()?;
    let computed = (0..table.height())
        .map(|index| {
            row_fn(&Row::new(&columns, index)).map_err(|source| {
                error!(column = new_name, row = index, error = %source, "row computation failed");
                Error::Computation {
                    column: new_name.to_string(),
                    row: index,
                    source,
                }
            })
        })
        .collect::<crate::Result<Vec<Value>>>()?;

    let series = series_from_values(new_name, computed)?;
    table.put_column(series)?;

    info!(column = new_name, "successfully added new column");
    Ok(table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Int,
    Float,
    Text,
    DateTime,
}

fn kind_of(value: &Value) -> Option<Kind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(Kind::Bool),
        Value::Int(_) => Some(Kind::Int),
        Value::Float(_) => Some(Kind::Float),
        Value::Text(_) => Some(Kind::Text),
        Value::DateTime(_) => Some(Kind::DateTime),
    }
}

/// Build a typed series from computed values, widening Int to Float when mixed
fn series_from_values(name: &str, values: Vec<Value>) -> crate::Result<Series> {
    let mut kind = None;
    for (row, value) in values.iter().enumerate() {
        kind = match (kind, kind_of(value)) {
            (current, None) => current,
            (None, next) => next,
            (Some(a), Some(b)) if a == b => Some(a),
            (Some(Kind::Int), Some(Kind::Float)) | (Some(Kind::Float), Some(Kind::Int)) => {
                Some(Kind::Float)
            }
            (Some(a), Some(b)) => {
                return Err(Error::Computation {
                    column: name.to_string(),
                    row,
                    source: anyhow::anyhow!("value of kind {b:?} in a column of kind {a:?}"),
                })
            }
        };
    }

    let name: PlSmallStr = name.into();
    let series = match kind {
        Some(Kind::Bool) => {
            let v: Vec<Option<bool>> = values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, v)
        }
        Some(Kind::Int) => {
            let v: Vec<Option<i64>> = values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name, v)
        }
        Some(Kind::Float) | None => {
            let v: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
            Series::new(name, v)
        }
        Some(Kind::Text) => {
            let v: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    Value::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();
            Series::new(name, v)
        }
        Some(Kind::DateTime) => {
            let v: Vec<Option<i64>> = values
                .iter()
                .map(|v| match v {
                    Value::DateTime(d) => Some(d.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect();
            Series::new(name, v).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
    };

    Ok(series)
}
