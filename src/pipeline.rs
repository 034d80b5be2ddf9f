//! End-to-end run over the sample sales dataset: prepare the table, then
//! render every report into a [`ReportPaths`] directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::chart::Chart;
use crate::clean::{clean_data, trim_whitespace};
use crate::convert::{to_categorical, to_datetime};
use crate::data::{load_data, Encoding, Table};
use crate::derive::{add_column, discount_pct};
use crate::report::{write_html, ReportPaths};
use crate::viz::pricing::{msrp_distribution, msrp_vs_price, price_quantity_composite};
use crate::viz::rfm::rfm;
use crate::viz::sales::{regional_sales_by_year, top_products, total_sales};
use crate::viz::trends::{dealsize_trends, discount_trend, DateWindow};
use crate::viz::Period;

/// Columns with no use in the reports
pub const UNUSED_COLUMNS: [&str; 7] = [
    "PHONE",
    "ADDRESSLINE2",
    "POSTALCODE",
    "STATE",
    "TERRITORY",
    "CONTACTLASTNAME",
    "CONTACTFIRSTNAME",
];

pub const ORDER_DATE_FORMAT: &str = "%m/%d/%Y %H:%M";

pub const DISCOUNT_COLUMN: &str = "DISCOUNT_PCT";

/// Load, clean, convert and enrich the sales file
pub fn prepare_sales(path: impl AsRef<Path>, encoding: Encoding) -> crate::Result<Table> {
    let table = load_data(path, encoding)?;
    let table = clean_data(table, &UNUSED_COLUMNS, true, true)?;
    let table = trim_whitespace(table)?;
    let table = to_datetime(table, "ORDERDATE", Some(ORDER_DATE_FORMAT))?;
    let table = to_categorical(table, &["DEALSIZE", "STATUS"])?;
    let table = add_column(table, DISCOUNT_COLUMN, discount_pct)?;

    info!(
        rows = table.height(),
        columns = table.width(),
        "data cleaning was successfully completed"
    );
    Ok(table)
}

fn save(chart: &Chart, path: PathBuf, written: &mut Vec<PathBuf>) -> crate::Result<()> {
    write_html(chart, &path)?;
    written.push(path);
    Ok(())
}

/// Build every chart from the prepared table and write it to disk.
/// Returns the written files in pipeline order.
pub fn write_reports(table: &Table, paths: &ReportPaths) -> crate::Result<Vec<PathBuf>> {
    let start = Instant::now();
    let mut written = Vec::new();

    let chart = total_sales(table, "ORDERDATE", "SALES", Period::Month)?;
    save(&chart, paths.total_sales(), &mut written)?;

    let regional = regional_sales_by_year(table, "SALES", "COUNTRY", "YEAR_ID")?;
    save(&regional.bars, paths.regional_sales(), &mut written)?;
    save(&regional.map, paths.regional_sales_map(), &mut written)?;

    let chart = top_products(table, "PRODUCTLINE", "ORDERDATE", "COUNTRY", "SALES", Period::Month)?;
    save(&chart, paths.top_products(), &mut written)?;

    let distribution = msrp_distribution(table, "PRODUCTLINE", "MSRP", "SALES")?;
    save(&distribution.histogram, paths.sales_by_msrp(), &mut written)?;
    save(&distribution.scatter, paths.individual_sales_by_msrp(), &mut written)?;

    let chart = msrp_vs_price(table, "PRODUCTLINE", "MSRP", "PRICEEACH")?;
    save(&chart, paths.msrp_vs_price(), &mut written)?;

    let raster = paths.price_quantity_raster();
    price_quantity_composite(
        table,
        "PRODUCTLINE",
        "QUANTITYORDERED",
        "SALES",
        "MSRP",
        "PRICEEACH",
        &raster,
    )?;
    written.push(raster);

    let chart = discount_trend(
        table,
        "PRODUCTLINE",
        "ORDERDATE",
        DISCOUNT_COLUMN,
        DateWindow::default(),
    )?;
    save(&chart, paths.pricing_strategy(), &mut written)?;

    let chart = dealsize_trends(table, "DEALSIZE", "ORDERDATE")?;
    save(&chart, paths.dealsize_trends(), &mut written)?;

    let charts = rfm(table, "ORDERNUMBER", "ORDERDATE", "CUSTOMERNAME", "SALES")?;
    save(&charts.scatter, paths.rfm(), &mut written)?;
    save(&charts.recency, paths.rfm_recency(), &mut written)?;
    save(&charts.frequency, paths.rfm_frequency(), &mut written)?;
    save(&charts.monetary, paths.rfm_monetary(), &mut written)?;

    info!(
        files = written.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        dir = %paths.dir().display(),
        "reports written"
    );
    Ok(written)
}
