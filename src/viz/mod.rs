//! Chart builders
//!
//! Every builder borrows the cleaned table, checks the columns it needs, runs
//! one aggregation with Polars and turns the result into [`Chart`]s. Helper
//! columns (period labels, parsed dates) live on a private copy of the frame,
//! so the caller's table is never touched.
//!
//! [`Chart`]: crate::chart::Chart

pub mod pricing;
pub mod rfm;
pub mod sales;
pub mod trends;

use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;

use crate::chart::Datum;
use crate::convert::{datetime_values, to_datetime};
use crate::data::{column_values, Table};
use crate::error::Error;

/// Name of the helper column holding period labels
pub const PERIOD_COLUMN: &str = "selected_time_period";

/// Bucket granularity for time-based aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year,
    Quarter,
    Month,
    Day,
}

impl Period {
    /// Bucket label, chosen so that lexical order is chronological
    pub fn label(self, stamp: &NaiveDateTime) -> String {
        match self {
            Period::Year => stamp.format("%Y").to_string(),
            Period::Quarter => format!("{}Q{}", stamp.year(), (stamp.month() - 1) / 3 + 1),
            Period::Month => stamp.format("%Y-%m").to_string(),
            Period::Day => stamp.format("%Y-%m-%d").to_string(),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Y" | "YEAR" => Ok(Period::Year),
            "Q" | "QUARTER" => Ok(Period::Quarter),
            "M" | "MONTH" => Ok(Period::Month),
            "D" | "DAY" => Ok(Period::Day),
            other => Err(format!("unknown period '{other}', expected Y, Q, M or D")),
        }
    }
}

/// Copy of the table's frame whose `date` column holds date-times
pub(crate) fn frame_with_datetimes(table: &Table, date: &str) -> crate::Result<DataFrame> {
    match table.dtype(date)? {
        DataType::Datetime(..) => Ok(table.frame().clone()),
        _ => Ok(to_datetime(table.clone(), date, None)?.into_frame()),
    }
}

/// Copy of the table's frame with a period label column added
pub(crate) fn frame_with_period(table: &Table, date: &str, period: Period) -> crate::Result<DataFrame> {
    let labels: Vec<Option<String>> = datetime_values(table, date, None)?
        .iter()
        .map(|stamp| stamp.as_ref().map(|d| period.label(d)))
        .collect();

    let mut frame = table.frame().clone();
    frame.with_column(Series::new(PERIOD_COLUMN.into(), labels))?;
    Ok(frame)
}

pub(crate) fn texts(frame: &DataFrame, name: &str) -> crate::Result<Vec<String>> {
    Ok(column_values(frame, name)?
        .iter()
        .map(|v| v.to_string())
        .collect())
}

/// Numeric column values; nulls become NaN, which serializes as a gap
pub(crate) fn numbers(frame: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    column_values(frame, name)?
        .iter()
        .map(|v| {
            if v.is_null() {
                Ok(f64::NAN)
            } else {
                v.as_f64()
                    .ok_or_else(|| Error::type_mismatch(name, format!("expected numbers, found {v:?}")))
            }
        })
        .collect()
}

pub(crate) fn data(frame: &DataFrame, name: &str) -> crate::Result<Vec<Datum>> {
    Ok(column_values(frame, name)?.iter().map(Datum::from).collect())
}

/// Row indices per key, keys in order of first appearance
pub(crate) fn group_rows(keys: &[String]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (row, key) in keys.iter().enumerate() {
        match groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((key.clone(), vec![row])),
        }
    }
    groups
}

pub(crate) fn pick<T: Clone>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&i| values[i].clone()).collect()
}

pub(crate) fn as_data(values: &[f64]) -> Vec<Datum> {
    values.iter().map(|&v| Datum::Number(v)).collect()
}
