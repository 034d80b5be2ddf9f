//! Sales trend, regional performance and best-seller charts

use polars::prelude::*;
use tracing::{debug, info, warn};

use super::{as_data, data, frame_with_period, group_rows, numbers, pick, texts, Period, PERIOD_COLUMN};
use crate::chart::{Chart, ColorAssigner, Datum, Layout, Marker, MarkerColor, Trace, TraceKind};
use crate::countries::iso3_code;
use crate::data::Table;

/// Number of rows kept by [`top_products`]
pub const TOP_PRODUCT_COUNT: u32 = 5;

const TOTAL_SALES_COLOR: &str = "#145A32";

/// Bars and map produced by [`regional_sales_by_year`]
#[derive(Debug, Clone)]
pub struct RegionalSales {
    /// Grouped bars of yearly sales per region
    pub bars: Chart,
    /// Choropleth of each region's mean yearly sales
    pub map: Chart,
}

/// Summed sales per period bucket, in chronological order
pub fn total_sales_summary(
    table: &Table,
    date_column: &str,
    sales_column: &str,
    period: Period,
) -> crate::Result<DataFrame> {
    table.require(&[date_column, sales_column])?;

    let summary = frame_with_period(table, date_column, period)?
        .lazy()
        .group_by_stable([col(PERIOD_COLUMN)])
        .agg([col(sales_column).sum()])
        .sort_by_exprs([col(PERIOD_COLUMN)], SortMultipleOptions::default())
        .collect()?;
    Ok(summary)
}

/// Line chart of total sales per period
pub fn total_sales(
    table: &Table,
    date_column: &str,
    sales_column: &str,
    period: Period,
) -> crate::Result<Chart> {
    info!("plotting sales trends");
    let summary = total_sales_summary(table, date_column, sales_column, period)?;

    let trace = Trace::new(TraceKind::Scatter)
        .name("Total sales")
        .mode("markers+lines")
        .x(data(&summary, PERIOD_COLUMN)?)
        .y(as_data(&numbers(&summary, sales_column)?))
        .line_color(TOTAL_SALES_COLOR)
        .hover_template("Date = %{x}<br>Total sales = %{y}<extra></extra>");

    let layout = Layout::titled("Total Sales")
        .axes("Date", "Total sales")
        .x_tick_angle(-45)
        .bar_gap(0.2);

    info!("sales trends plotted successfully");
    Ok(Chart::new(layout, vec![trace]))
}

/// Summed sales per (region, year), regions in order of first appearance
pub fn regional_sales_summary(
    table: &Table,
    sales_column: &str,
    country_column: &str,
    year_column: &str,
) -> crate::Result<DataFrame> {
    table.require(&[sales_column, country_column, year_column])?;

    let summary = table
        .frame()
        .clone()
        .lazy()
        .group_by_stable([col(country_column), col(year_column)])
        .agg([col(sales_column).sum()])
        .collect()?;
    Ok(summary)
}

/// Grouped bars of yearly sales per region plus a choropleth of the mean
/// yearly sales. Regions without a known country code stay in the bars but
/// are left off the map.
pub fn regional_sales_by_year(
    table: &Table,
    sales_column: &str,
    country_column: &str,
    year_column: &str,
) -> crate::Result<RegionalSales> {
    info!("starting regional sales visualization");
    let summary = regional_sales_summary(table, sales_column, country_column, year_column)?;

    let countries = texts(&summary, country_column)?;
    let years = data(&summary, year_column)?;
    let totals = numbers(&summary, sales_column)?;

    let mut colors = ColorAssigner::default();
    let bar_traces = group_rows(&countries)
        .into_iter()
        .map(|(country, rows)| {
            Trace::new(TraceKind::Bar)
                .name(country.clone())
                .x(pick(&years, &rows))
                .y(as_data(&pick(&totals, &rows)))
                .custom_data(vec![country.clone(); rows.len()])
                .marker(Marker {
                    color: Some(MarkerColor::Fixed(colors.color_for(&country).to_string())),
                    ..Default::default()
                })
                .hover_template("Country = %{customdata}<br>Year = %{x}<br>Total sales = %{y}<extra></extra>")
        })
        .collect();

    let bars = Chart::new(
        Layout::titled("Regional Sales Performance Over Time")
            .axes("Year", "Total sales")
            .x_tick_angle(-45)
            .legend_title("Country")
            .bar_mode("group")
            .bar_gap(0.2),
        bar_traces,
    );

    let averages = summary
        .lazy()
        .group_by_stable([col(country_column)])
        .agg([col(sales_column).mean()])
        .collect()?;

    let mut codes = Vec::new();
    let mut names = Vec::new();
    let mut means = Vec::new();
    for (name, mean) in texts(&averages, country_column)?
        .into_iter()
        .zip(numbers(&averages, sales_column)?)
    {
        match iso3_code(&name) {
            Some(code) => {
                codes.push(code.to_string());
                names.push(name);
                means.push(Datum::Number(mean));
            }
            None => warn!(region = %name, "no country code for region, leaving it off the map"),
        }
    }

    let map_trace = Trace::new(TraceKind::Choropleth)
        .locations(codes)
        .z(means)
        .text(names)
        .color_scale("Viridis", "Average sales")
        .hover_template("Country = %{text}<br>Average yearly sales = %{z:,.2f}<extra></extra>");
    let map = Chart::new(Layout::titled("Average Yearly Sales by Country"), vec![map_trace]);

    info!("regional sales plot successfully created");
    Ok(RegionalSales { bars, map })
}

/// Top (product, region, period) groups by summed sales, best first
pub fn top_products_summary(
    table: &Table,
    products_column: &str,
    date_column: &str,
    country_column: &str,
    sales_column: &str,
    period: Period,
) -> crate::Result<DataFrame> {
    table.require(&[sales_column, country_column, date_column, products_column])?;

    let summary = frame_with_period(table, date_column, period)?
        .lazy()
        .group_by_stable([col(products_column), col(country_column), col(PERIOD_COLUMN)])
        .agg([col(sales_column).sum()])
        .sort_by_exprs(
            [col(sales_column)],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(TOP_PRODUCT_COUNT)
        .collect()?;
    Ok(summary)
}

/// Bar chart of the five best-selling (product, region, period) groups
pub fn top_products(
    table: &Table,
    products_column: &str,
    date_column: &str,
    country_column: &str,
    sales_column: &str,
    period: Period,
) -> crate::Result<Chart> {
    info!("plotting bestsellers");
    let summary = top_products_summary(
        table,
        products_column,
        date_column,
        country_column,
        sales_column,
        period,
    )?;
    debug!("top products:\n{summary}");

    let products = data(&summary, products_column)?;
    let countries = texts(&summary, country_column)?;
    let periods = texts(&summary, PERIOD_COLUMN)?;
    let totals = numbers(&summary, sales_column)?;

    let mut colors = ColorAssigner::default();
    let traces = group_rows(&countries)
        .into_iter()
        .map(|(country, rows)| {
            Trace::new(TraceKind::Bar)
                .name(country.clone())
                .x(pick(&products, &rows))
                .y(as_data(&pick(&totals, &rows)))
                .text(pick(&periods, &rows))
                .marker(Marker {
                    color: Some(MarkerColor::Fixed(colors.color_for(&country).to_string())),
                    ..Default::default()
                })
                .hover_template("Product = %{x}<br>Sales = %{y}<br>Date = %{text}<extra></extra>")
        })
        .collect();

    let layout = Layout::titled("Top 5 Best-Selling Products")
        .axes("Product", "Sales")
        .legend_title("Country");

    info!("top 5 products by sales plotted successfully");
    Ok(Chart::new(layout, traces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn orders() -> Table {
        let df = df!(
            "Product" => &["A", "B", "A", "C"],
            "Sales" => &[300, 450, 100, 500],
            "Date" => &["2025-01-01", "2025-01-20", "2025-02-03", "2024-11-30"],
            "Year" => &[2025, 2025, 2025, 2024],
            "Region" => &["France", "USA", "France", "Atlantis"],
        )
        .unwrap();
        Table::from(df)
    }

    #[test]
    fn test_total_sales_by_month() {
        let summary = total_sales_summary(&orders(), "Date", "Sales", Period::Month).unwrap();
        assert_eq!(
            texts(&summary, PERIOD_COLUMN).unwrap(),
            vec!["2024-11", "2025-01", "2025-02"]
        );
        assert_eq!(numbers(&summary, "Sales").unwrap(), vec![500.0, 750.0, 100.0]);
    }

    #[test]
    fn test_total_sales_chart() {
        let chart = total_sales(&orders(), "Date", "Sales", Period::Year).unwrap();
        assert_eq!(chart.title(), "Total Sales");
        assert_eq!(chart.traces().len(), 1);
        assert_eq!(
            chart.traces()[0].x_values(),
            &[Datum::from("2024"), Datum::from("2025")]
        );
    }

    #[test]
    fn test_builders_check_columns_first() {
        let result = total_sales(&orders(), "OrderDate", "Sales", Period::Month);
        assert!(matches!(result, Err(Error::MissingColumn(name)) if name == "OrderDate"));

        let result = regional_sales_by_year(&orders(), "Sales", "Country", "Year");
        assert!(matches!(result, Err(Error::MissingColumn(name)) if name == "Country"));
    }

    #[test]
    fn test_regional_sales_map_skips_unknown_regions() {
        let charts = regional_sales_by_year(&orders(), "Sales", "Region", "Year").unwrap();

        let names: Vec<_> = charts.bars.traces().iter().filter_map(|t| t.trace_name()).collect();
        assert_eq!(names, vec!["France", "USA", "Atlantis"]);
        assert_eq!(
            charts.bars.trace("France").unwrap().y_values(),
            &[Datum::Number(400.0)]
        );

        let map = &charts.map.traces()[0];
        assert_eq!(map.location_codes(), &["FRA".to_string(), "USA".to_string()]);
        assert_eq!(map.z_values(), &[Datum::Number(400.0), Datum::Number(450.0)]);
    }

    #[test]
    fn test_top_products_limit_and_order() {
        let summary =
            top_products_summary(&orders(), "Product", "Date", "Region", "Sales", Period::Month)
                .unwrap();
        assert_eq!(summary.height(), 4);
        assert_eq!(texts(&summary, "Product").unwrap()[0], "C");
        assert_eq!(numbers(&summary, "Sales").unwrap(), vec![500.0, 450.0, 300.0, 100.0]);
    }
}
