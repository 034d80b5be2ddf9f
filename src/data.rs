//! Sales table model and CSV loading using Polars

use std::fmt;
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{error, info};

use crate::error::Error;

/// Text encoding of the input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    /// ISO-8859-1: every byte maps to one code point, so decoding never fails.
    #[default]
    Latin1,
}

impl Encoding {
    /// Decode raw file bytes into UTF-8 text
    pub fn decode(self, bytes: &[u8]) -> std::result::Result<String, String> {
        match self {
            Encoding::Utf8 => {
                let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))?;
                Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(name: &str) -> crate::Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "cp819" => Ok(Encoding::Latin1),
            other => Err(Error::Load {
                path: Default::default(),
                reason: format!("unsupported encoding '{other}'"),
            }),
        }
    }
}

/// A single cell value as seen by row-computation functions
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Column-major snapshot of a table: (name, values) pairs in schema order
pub type Columns = Vec<(String, Vec<Value>)>;

/// Attribute-name to value view of one table row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [(String, Vec<Value>)],
    index: usize,
}

impl<'a> Row<'a> {
    pub fn new(columns: &'a [(String, Vec<Value>)], index: usize) -> Self {
        Self { columns, index }
    }

    /// Position of this row in the table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| &values[self.index])
    }

    /// Numeric value of a column, failing on absent, null or non-numeric cells
    pub fn f64(&self, name: &str) -> crate::Result<f64> {
        let value = self
            .get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch(name, format!("expected a number, found {value:?}")))
    }

    pub fn text(&self, name: &str) -> crate::Result<&'a str> {
        match self.get(name) {
            Some(Value::Text(v)) => Ok(v),
            Some(other) => Err(Error::type_mismatch(name, format!("expected text, found {other:?}"))),
            None => Err(Error::MissingColumn(name.to_string())),
        }
    }
}

/// In-memory sales table backed by a Polars `DataFrame`
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
}

impl From<DataFrame> for Table {
    fn from(frame: DataFrame) -> Self {
        Self { frame }
    }
}

impl Table {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Fail with `MissingColumn` on the first name absent from the table
    pub fn require(&self, names: &[&str]) -> crate::Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => {
                error!(column = %missing, "required column not found");
                Err(Error::MissingColumn(missing.to_string()))
            }
            None => Ok(()),
        }
    }

    pub fn dtype(&self, name: &str) -> crate::Result<DataType> {
        self.require(&[name])?;
        Ok(self.frame.column(name)?.dtype().clone())
    }

    /// Values of one column as scalar `Value`s
    pub fn values(&self, name: &str) -> crate::Result<Vec<Value>> {
        self.require(&[name])?;
        column_values(&self.frame, name)
    }

    /// Snapshot of every column, used to hand rows to row functions
    pub fn columns(&self) -> crate::Result<Columns> {
        self.column_names()
            .into_iter()
            .map(|name| {
                let values = column_values(&self.frame, &name)?;
                Ok((name, values))
            })
            .collect()
    }

    /// Add or replace a column of the same length
    pub(crate) fn put_column(&mut self, series: Series) -> crate::Result<()> {
        self.frame.with_column(series)?;
        Ok(())
    }
}

/// Read one column of a frame into `Value`s, normalizing integer and float widths
pub fn column_values(frame: &DataFrame, name: &str) -> crate::Result<Vec<Value>> {
    let column = frame
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?;

    let values = match column.dtype() {
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect(),
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
            .collect(),
        DataType::Categorical(..) => {
            let text = column.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
                .collect()
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let raw = column.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(|t| timestamp_to_naive(t, unit))
                        .map_or(Value::Null, Value::DateTime)
                })
                .collect()
        }
        DataType::Date => {
            let raw = column.cast(&DataType::Int32)?;
            raw.i32()?
                .into_iter()
                .map(|v| {
                    v.and_then(days_to_naive)
                        .map_or(Value::Null, Value::DateTime)
                })
                .collect()
        }
        dtype if dtype.is_integer() => {
            let ints = column.cast(&DataType::Int64)?;
            ints.i64()?
                .into_iter()
                .map(|v| v.map_or(Value::Null, Value::Int))
                .collect()
        }
        dtype if dtype.is_float() => {
            let floats = column.cast(&DataType::Float64)?;
            floats
                .f64()?
                .into_iter()
                .map(|v| v.map_or(Value::Null, Value::Float))
                .collect()
        }
        other => {
            return Err(Error::type_mismatch(
                name,
                format!("cannot read values of type {other}"),
            ))
        }
    };

    Ok(values)
}

fn timestamp_to_naive(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let stamp = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
    };
    Some(stamp.naive_utc())
}

fn days_to_naive(days: i32) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    epoch
        .checked_add_signed(chrono::Duration::days(i64::from(days)))?
        .and_hms_opt(0, 0, 0)
}

/// Cell texts read as missing values, besides empty fields
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a delimited file with a header row into a `Table`
///
/// # Arguments
/// * `file_path` - Path to the CSV file
/// * `encoding` - Text encoding of the file (ISO-8859-1 for the sales sample)
///
/// # Errors
/// * `Error::NotFound` when the path does not exist
/// * `Error::Load` for undecodable or malformed input
pub fn load_data(file_path: impl AsRef<Path>, encoding: Encoding) -> crate::Result<Table> {
    let path = file_path.as_ref();

    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            error!(path = %path.display(), "file not found");
            Error::NotFound(path.to_path_buf())
        } else {
            error!(path = %path.display(), error = %e, "failed to read file");
            Error::Load {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })?;

    let load_error = |reason: String| {
        error!(path = %path.display(), %reason, "unexpected error while loading data");
        Error::Load {
            path: path.to_path_buf(),
            reason,
        }
    };

    let text = encoding.decode(&bytes).map_err(load_error)?;

    let null_values = NullValues::AllColumns(MISSING_MARKERS.iter().map(|&m| m.into()).collect());
    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)));
    let frame = options
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .map_err(|e| load_error(e.to_string()))?;

    info!(
        path = %path.display(),
        rows = frame.height(),
        columns = frame.width(),
        "data loaded successfully"
    );

    Ok(Table::from(frame))
}
