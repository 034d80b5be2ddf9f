//! Time-series trends: discount strategy and deal sizes

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::info;

use super::{as_data, data, frame_with_datetimes, group_rows, numbers, pick, texts};
use crate::chart::{Chart, ColorAssigner, Datum, Layout, Trace, TraceKind};
use crate::data::{column_values, Table, Value};

/// Observations averaged by the discount rolling mean
pub const DISCOUNT_ROLLING_WINDOW: usize = 30;

/// Helper column holding the rolling mean discount
pub const ROLLING_COLUMN: &str = "ROLLING_DISCOUNT";

/// Helper column holding order counts
pub const COUNT_COLUMN: &str = "ORDER_COUNT";

/// Inclusive calendar range a trend chart is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, stamp: &NaiveDateTime) -> bool {
        let day = stamp.date();
        self.start <= day && day <= self.end
    }
}

impl Default for DateWindow {
    /// Span of the sample sales dataset
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2003, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2005, 5, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

fn stamps(frame: &DataFrame, name: &str) -> crate::Result<Vec<Option<NaiveDateTime>>> {
    Ok(column_values(frame, name)?
        .into_iter()
        .map(|v| match v {
            Value::DateTime(d) => Some(d),
            _ => None,
        })
        .collect())
}

/// Mean discount per (date, product line) over discounted rows, with a
/// trailing rolling mean per product line
///
/// Rows come out sorted by product line, then date. The rolling mean covers
/// up to `window` observations and starts at the first one.
pub fn discount_trend_summary(
    table: &Table,
    products_column: &str,
    date_column: &str,
    discount_column: &str,
    window: usize,
) -> crate::Result<DataFrame> {
    table.require(&[products_column, date_column, discount_column])?;

    let rolling = RollingOptionsFixedWindow {
        window_size: window,
        min_periods: 1,
        ..Default::default()
    };

    let summary = frame_with_datetimes(table, date_column)?
        .lazy()
        .filter(col(discount_column).gt(lit(0.0)))
        .group_by_stable([col(date_column), col(products_column)])
        .agg([col(discount_column).mean()])
        .sort_by_exprs(
            [col(products_column), col(date_column)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .with_column(
            col(discount_column)
                .rolling_mean(rolling)
                .over([col(products_column)])
                .alias(ROLLING_COLUMN),
        )
        .collect()?;
    Ok(summary)
}

/// Multi-line chart of the rolling mean discount per product line
pub fn discount_trend(
    table: &Table,
    products_column: &str,
    date_column: &str,
    discount_column: &str,
    window: DateWindow,
) -> crate::Result<Chart> {
    info!("plotting discount pricing strategy");
    let summary = discount_trend_summary(
        table,
        products_column,
        date_column,
        discount_column,
        DISCOUNT_ROLLING_WINDOW,
    )?;

    let products = texts(&summary, products_column)?;
    let dates = stamps(&summary, date_column)?;
    let labels = data(&summary, date_column)?;
    let rolling = numbers(&summary, ROLLING_COLUMN)?;

    let mut colors = ColorAssigner::default();
    let traces = group_rows(&products)
        .into_iter()
        .map(|(product, rows)| {
            let visible: Vec<usize> = rows
                .into_iter()
                .filter(|&i| dates[i].as_ref().is_some_and(|d| window.contains(d)))
                .collect();
            Trace::new(TraceKind::Scatter)
                .mode("lines")
                .line_color(colors.color_for(&product))
                .name(product)
                .x(pick(&labels, &visible))
                .y(as_data(&pick(&rolling, &visible)))
        })
        .collect();

    let layout = Layout::titled("Discount Pricing Strategy (30-Order Rolling Average)")
        .axes("Date", "Average discount (%)")
        .x_range(
            Datum::from(window.start.format("%Y-%m-%d").to_string()),
            Datum::from(window.end.format("%Y-%m-%d").to_string()),
        )
        .legend_title("Product");

    info!("discount pricing strategy plotted successfully");
    Ok(Chart::new(layout, traces))
}

/// Number of rows per (date, deal size), chronological
pub fn dealsize_summary(
    table: &Table,
    dealsize_column: &str,
    date_column: &str,
) -> crate::Result<DataFrame> {
    table.require(&[dealsize_column, date_column])?;

    let summary = frame_with_datetimes(table, date_column)?
        .lazy()
        .group_by_stable([col(date_column), col(dealsize_column)])
        .agg([len().alias(COUNT_COLUMN)])
        .sort_by_exprs(
            [col(date_column)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    Ok(summary)
}

/// Stacked area chart of order counts per deal size over time
pub fn dealsize_trends(table: &Table, dealsize_column: &str, date_column: &str) -> crate::Result<Chart> {
    info!("plotting deal size trends");
    let summary = dealsize_summary(table, dealsize_column, date_column)?;

    let sizes = texts(&summary, dealsize_column)?;
    let dates = data(&summary, date_column)?;
    let counts = numbers(&summary, COUNT_COLUMN)?;

    let mut colors = ColorAssigner::default();
    let traces = group_rows(&sizes)
        .into_iter()
        .map(|(size, rows)| {
            Trace::new(TraceKind::Scatter)
                .mode("lines")
                .stack_group("one")
                .line_color(colors.color_for(&size))
                .name(size)
                .x(pick(&dates, &rows))
                .y(as_data(&pick(&counts, &rows)))
                .hover_template("Date = %{x}<br>Orders = %{y}<extra></extra>")
        })
        .collect();

    let layout = Layout::titled("Deal Size Trends Over Time")
        .axes("Date", "Number of orders")
        .legend_title("Deal size");

    info!("deal size trends plotted successfully");
    Ok(Chart::new(layout, traces))
}
