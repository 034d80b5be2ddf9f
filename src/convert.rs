//! Column type conversion: date-times and categoricals

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{error, info};

use crate::data::{Table, Value};
use crate::error::Error;

/// Formats tried, in order, when no explicit format is given.
/// The first one that parses the first non-null value is used for the whole column.
const INFERRED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d",
    "%d.%m.%Y",
];

/// Parse one value with a chrono format. Date-only formats yield midnight.
pub fn parse_datetime(value: &str, format: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn infer_format(sample: &str) -> Option<&'static str> {
    INFERRED_FORMATS
        .iter()
        .copied()
        .find(|format| parse_datetime(sample, format).is_some())
}

/// Convert a text column to `Datetime(ms)`
///
/// Every non-null value must parse, otherwise the table is returned untouched
/// inside a `Conversion` error. Columns that are already temporal pass through.
pub fn to_datetime(mut table: Table, column: &str, format: Option<&str>) -> crate::Result<Table> {
    let stamps = datetime_values(&table, column, format)?;
    if matches!(table.dtype(column)?, DataType::Datetime(..)) {
        return Ok(table);
    }

    let millis: Vec<Option<i64>> = stamps
        .iter()
        .map(|v| v.map(|d| d.and_utc().timestamp_millis()))
        .collect();
    let series = Series::new(column.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    table.put_column(series)?;

    info!(column, "column successfully converted to datetime");
    Ok(table)
}

/// Date-time values of a column, parsing text on the fly
///
/// Used by `to_datetime` and by chart builders that need dates from a column
/// the caller may not have converted yet.
pub fn datetime_values(
    table: &Table,
    column: &str,
    format: Option<&str>,
) -> crate::Result<Vec<Option<NaiveDateTime>>> {
    let dtype = table.dtype(column)?;
    let values = table.values(column)?;

    match dtype {
        DataType::Datetime(..) | DataType::Date => Ok(values
            .into_iter()
            .map(|v| match v {
                Value::DateTime(d) => Some(d),
                _ => None,
            })
            .collect()),
        DataType::String | DataType::Categorical(..) => parse_text_values(column, &values, format),
        other => {
            error!(column, dtype = %other, "column cannot be converted to datetime");
            Err(Error::conversion(
                column,
                format!("values of type {other} are not date-times"),
            ))
        }
    }
}

fn parse_text_values(
    column: &str,
    values: &[Value],
    format: Option<&str>,
) -> crate::Result<Vec<Option<NaiveDateTime>>> {
    let format = match format {
        Some(format) => Some(format),
        None => values
            .iter()
            .find_map(|v| match v {
                Value::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .map(|sample| {
                infer_format(sample).ok_or_else(|| {
                    error!(column, sample, "could not infer a date format");
                    Error::conversion(column, format!("could not infer a date format from '{sample}'"))
                })
            })
            .transpose()?,
    };

    values
        .iter()
        .enumerate()
        .map(|(row, value)| match (value, format) {
            (Value::Text(s), Some(format)) => parse_datetime(s, format).map(Some).ok_or_else(|| {
                error!(column, row, value = %s, "invalid or out-of-range date");
                Error::conversion(
                    column,
                    format!("row {row}: '{s}' is not a valid date for format '{format}'"),
                )
            }),
            _ => Ok(None),
        })
        .collect()
}

/// Mark text columns as categorical without altering their values
pub fn to_categorical(mut table: Table, columns: &[&str]) -> crate::Result<Table> {
    table.require(columns)?;

    for &name in columns {
        let dtype = table.dtype(name)?;
        match dtype {
            DataType::Categorical(..) => continue,
            DataType::String => {
                let converted = table
                    .frame()
                    .column(name)?
                    .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))?;
                table.put_column(converted.as_materialized_series().clone())?;
                info!(column = name, "column successfully converted to categorical type");
            }
            other => {
                error!(column = name, dtype = %other, "column cannot be made categorical");
                return Err(Error::type_mismatch(
                    name,
                    format!("only text columns can be categorical, found {other}"),
                ));
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn table(dates: &[Option<&str>]) -> Table {
        let df = df!(
            "ORDERDATE" => dates,
            "DEALSIZE" => vec![Some("Small"); dates.len()],
            "SALES" => vec![100.0; dates.len()],
        )
        .unwrap();
        Table::from(df)
    }

    #[test]
    fn test_to_datetime_with_format() {
        let t = to_datetime(
            table(&[Some("2/24/2003 0:00"), Some("12/1/2004 13:45")]),
            "ORDERDATE",
            Some("%m/%d/%Y %H:%M"),
        )
        .unwrap();

        assert!(matches!(t.dtype("ORDERDATE").unwrap(), DataType::Datetime(..)));
        match &t.values("ORDERDATE").unwrap()[1] {
            Value::DateTime(d) => {
                assert_eq!((d.year(), d.month(), d.day()), (2004, 12, 1));
                assert_eq!((d.hour(), d.minute()), (13, 45));
            }
            other => panic!("expected a date-time, got {other:?}"),
        }
    }

    #[test]
    fn test_to_datetime_round_trips_calendar_date() {
        let t = to_datetime(table(&[Some("2023-02-28")]), "ORDERDATE", Some("%Y-%m-%d")).unwrap();
        match &t.values("ORDERDATE").unwrap()[0] {
            Value::DateTime(d) => assert_eq!(d.format("%Y-%m-%d").to_string(), "2023-02-28"),
            other => panic!("expected a date-time, got {other:?}"),
        }
    }

    #[test]
    fn test_to_datetime_rejects_invalid_calendar_date() {
        let result = to_datetime(
            table(&[Some("2023-02-27"), Some("2023-02-30")]),
            "ORDERDATE",
            Some("%Y-%m-%d"),
        );
        assert!(matches!(result, Err(Error::Conversion { .. })));

        let result = to_datetime(table(&[Some("2023-02-30")]), "ORDERDATE", None);
        assert!(matches!(result, Err(Error::Conversion { .. })));
    }

    #[test]
    fn test_to_datetime_infers_format_and_keeps_nulls() {
        let t = to_datetime(table(&[Some("2025-01-03"), None]), "ORDERDATE", None).unwrap();
        let values = t.values("ORDERDATE").unwrap();
        assert!(matches!(values[0], Value::DateTime(_)));
        assert_eq!(values[1], Value::Null);
    }

    #[test]
    fn test_to_datetime_missing_column() {
        let result = to_datetime(table(&[Some("2025-01-03")]), "SHIPDATE", None);
        assert!(matches!(result, Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_to_categorical() {
        let t = to_categorical(table(&[Some("2025-01-03")]), &["DEALSIZE"]).unwrap();
        assert!(matches!(t.dtype("DEALSIZE").unwrap(), DataType::Categorical(..)));
        assert_eq!(t.values("DEALSIZE").unwrap(), vec![Value::Text("Small".to_string())]);

        // idempotent
        let t = to_categorical(t, &["DEALSIZE"]).unwrap();
        assert!(matches!(t.dtype("DEALSIZE").unwrap(), DataType::Categorical(..)));
    }

    #[test]
    fn test_to_categorical_errors() {
        let result = to_categorical(table(&[Some("2025-01-03")]), &["DEALSIZE", "STATUS"]);
        assert!(matches!(result, Err(Error::MissingColumn(name)) if name == "STATUS"));

        let result = to_categorical(table(&[Some("2025-01-03")]), &["SALES"]);
        assert!(matches!(result, Err(Error::Type { .. })));
    }
}
