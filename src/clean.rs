//! Table cleaning: dropping columns, missing values and duplicates, and
//! whitespace normalization of text columns.

use polars::prelude::*;
use tracing::{debug, info};

use crate::data::Table;

/// Clean a table in a fixed order: drop columns, then rows with missing
/// values, then duplicate rows (first occurrence kept).
///
/// # Arguments
/// * `table` - Table to clean
/// * `columns_to_drop` - Columns removed before any row filtering; all must exist
/// * `drop_missing` - Remove every row holding at least one null
/// * `drop_duplicates` - Remove rows identical to an earlier row
///
/// # Returns
/// * The cleaned table, possibly empty
pub fn clean_data(
    table: Table,
    columns_to_drop: &[&str],
    drop_missing: bool,
    drop_duplicates: bool,
) -> crate::Result<Table> {
    info!("starting data cleaning process");
    table.require(columns_to_drop)?;

    let mut frame = table.into_frame();

    if !columns_to_drop.is_empty() {
        info!(columns = ?columns_to_drop, "dropping columns");
        for &name in columns_to_drop {
            // repeated names were already dropped
            if frame.get_column_index(name).is_some() {
                frame.drop_in_place(name)?;
            }
        }
    }

    if drop_missing {
        let before = frame.height();
        frame = frame.lazy().drop_nulls(None).collect()?;
        info!(removed = before - frame.height(), "dropped rows with missing values");
    }

    if drop_duplicates {
        let before = frame.height();
        frame = frame
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        info!(removed = before - frame.height(), "removed duplicate rows");
    }

    Ok(Table::from(frame))
}

/// Strip and collapse whitespace in every text column
pub fn trim_whitespace(table: Table) -> crate::Result<Table> {
    let mut frame = table.into_frame();

    let text_columns: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .map(|c| c.name().to_string())
        .collect();

    for name in text_columns {
        let normalized: Vec<Option<String>> = frame
            .column(&name)?
            .str()?
            .into_iter()
            .map(|v| v.map(collapse_whitespace))
            .collect();
        frame.with_column(Series::new(name.as_str().into(), normalized))?;
        debug!(column = %name, "removed extra spaces");
    }

    info!("whitespace normalization completed");
    Ok(Table::from(frame))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
