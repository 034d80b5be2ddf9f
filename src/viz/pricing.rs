//! List price (MSRP) versus actual price charts

use std::fmt;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use super::{as_data, group_rows, numbers, pick, texts};
use crate::chart::{
    Chart, ColorAssigner, ColorBar, Datum, Layout, Line, Marker, MarkerColor, Title, Trace, TraceKind,
};
use crate::data::Table;
use crate::report::write_composite_png;

/// Histogram and scatter produced by [`msrp_distribution`]
#[derive(Debug, Clone)]
pub struct MsrpDistribution {
    pub histogram: Chart,
    pub scatter: Chart,
}

/// Which of the two prices a point describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceType {
    Msrp,
    SalePrice,
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceType::Msrp => f.write_str("MSRP"),
            PriceType::SalePrice => f.write_str("Sale price"),
        }
    }
}

/// Mean price of one product line, long format
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub product: String,
    pub price_type: PriceType,
    pub value: f64,
}

/// One marker of the price/quantity composite
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePoint {
    pub product: String,
    pub price_type: PriceType,
    /// Mean price of the given type
    pub price: f64,
    /// Summed sales of the product line
    pub sales: f64,
    /// Summed quantity ordered of the product line
    pub quantity: f64,
}

/// Summed sales per (MSRP, product line)
pub fn msrp_distribution_summary(
    table: &Table,
    products_column: &str,
    msrp_column: &str,
    sales_column: &str,
) -> crate::Result<DataFrame> {
    table.require(&[sales_column, msrp_column, products_column])?;

    let summary = table
        .frame()
        .clone()
        .lazy()
        .group_by_stable([col(msrp_column), col(products_column)])
        .agg([col(sales_column).sum()])
        .sort_by_exprs(
            [col(msrp_column)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    Ok(summary)
}

/// Total sales by MSRP per product line, as a histogram and as a scatter
pub fn msrp_distribution(
    table: &Table,
    products_column: &str,
    msrp_column: &str,
    sales_column: &str,
) -> crate::Result<MsrpDistribution> {
    info!("plotting sales by MSRP");
    let summary = msrp_distribution_summary(table, products_column, msrp_column, sales_column)?;

    let products = texts(&summary, products_column)?;
    let msrp = numbers(&summary, msrp_column)?;
    let sales = numbers(&summary, sales_column)?;
    let groups = group_rows(&products);

    let mut colors = ColorAssigner::default();
    let mut histogram_traces = Vec::with_capacity(groups.len());
    let mut scatter_traces = Vec::with_capacity(groups.len());
    for (product, rows) in &groups {
        let marker = Marker {
            color: Some(MarkerColor::Fixed(colors.color_for(product).to_string())),
            ..Default::default()
        };
        let x = as_data(&pick(&msrp, rows));
        let y = as_data(&pick(&sales, rows));

        histogram_traces.push(
            Trace::new(TraceKind::Histogram)
                .name(product.clone())
                .hist_func("sum")
                .x(x.clone())
                .y(y.clone())
                .marker(marker.clone()),
        );
        scatter_traces.push(
            Trace::new(TraceKind::Scatter)
                .name(product.clone())
                .mode("markers")
                .x(x)
                .y(y)
                .marker(marker)
                .hover_template("Product = %{fullData.name}<br>MSRP = %{x}<br>Sales = %{y}<extra></extra>"),
        );
    }
    info!("total sales by MSRP plotted successfully");

    let histogram = Chart::new(
        Layout::titled("Total Sales Distribution by MSRP")
            .axes("MSRP", "Total Sales")
            .legend_title("Product"),
        histogram_traces,
    );
    let scatter = Chart::new(
        Layout::titled("Individual Sales Distribution by MSRP")
            .axes("MSRP", "Individual Sales")
            .legend_title("Product"),
        scatter_traces,
    );
    info!("individual sales by MSRP plotted successfully");

    Ok(MsrpDistribution { histogram, scatter })
}

/// Mean MSRP and mean sale price per product line, MSRP rows first
pub fn msrp_vs_price_summary(
    table: &Table,
    products_column: &str,
    msrp_column: &str,
    price_column: &str,
) -> crate::Result<Vec<PricePoint>> {
    table.require(&[price_column, msrp_column, products_column])?;

    let grouped = table
        .frame()
        .clone()
        .lazy()
        .group_by_stable([col(products_column)])
        .agg([col(msrp_column).mean(), col(price_column).mean()])
        .collect()?;

    let products = texts(&grouped, products_column)?;
    let mut points = Vec::with_capacity(products.len() * 2);
    for (price_type, column) in [(PriceType::Msrp, msrp_column), (PriceType::SalePrice, price_column)] {
        for (product, value) in products.iter().zip(numbers(&grouped, column)?) {
            points.push(PricePoint {
                product: product.clone(),
                price_type,
                value,
            });
        }
    }
    Ok(points)
}

/// Scatter of mean MSRP against mean sale price per product line
pub fn msrp_vs_price(
    table: &Table,
    products_column: &str,
    msrp_column: &str,
    price_column: &str,
) -> crate::Result<Chart> {
    info!("plotting MSRP vs sale price");
    let points = msrp_vs_price_summary(table, products_column, msrp_column, price_column)?;

    let mut colors = ColorAssigner::default();
    let traces = [PriceType::Msrp, PriceType::SalePrice]
        .into_iter()
        .map(|price_type| {
            let (x, y): (Vec<Datum>, Vec<Datum>) = points
                .iter()
                .filter(|p| p.price_type == price_type)
                .map(|p| (Datum::from(p.product.as_str()), Datum::Number(p.value)))
                .unzip();
            let name = price_type.to_string();
            Trace::new(TraceKind::Scatter)
                .mode("markers")
                .marker(Marker {
                    color: Some(MarkerColor::Fixed(colors.color_for(&name).to_string())),
                    size: Some(10.0),
                    ..Default::default()
                })
                .name(name)
                .x(x)
                .y(y)
        })
        .collect();

    let layout = Layout::titled("MSRP vs Sale price per Product")
        .axes("Product", "MSRP vs Sale price")
        .x_tick_angle(-45)
        .legend_title("Price type");

    info!("plotting MSRP vs sale price completed successfully");
    Ok(Chart::new(layout, traces))
}

/// Mean prices and summed sales/quantity per product line, one point per price type
pub fn price_quantity_summary(
    table: &Table,
    products_column: &str,
    quantity_column: &str,
    sales_column: &str,
    msrp_column: &str,
    price_column: &str,
) -> crate::Result<Vec<CompositePoint>> {
    table.require(&[
        price_column,
        msrp_column,
        products_column,
        sales_column,
        quantity_column,
    ])?;

    let grouped = table
        .frame()
        .clone()
        .lazy()
        .group_by_stable([col(products_column)])
        .agg([
            col(msrp_column).mean(),
            col(price_column).mean(),
            col(sales_column).sum(),
            col(quantity_column).sum(),
        ])
        .collect()?;

    let products = texts(&grouped, products_column)?;
    let sales = numbers(&grouped, sales_column)?;
    let quantity = numbers(&grouped, quantity_column)?;

    let mut points = Vec::with_capacity(products.len() * 2);
    for (price_type, column) in [(PriceType::Msrp, msrp_column), (PriceType::SalePrice, price_column)] {
        for (i, price) in numbers(&grouped, column)?.into_iter().enumerate() {
            points.push(CompositePoint {
                product: products[i].clone(),
                price_type,
                price,
                sales: sales[i],
                quantity: quantity[i],
            });
        }
    }
    Ok(points)
}

/// Chart of the composite: triangles for MSRP, circles for sale price,
/// colored by quantity ordered and labelled with the product line
pub fn price_quantity_chart(points: &[CompositePoint]) -> Chart {
    let (cmin, cmax) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.quantity), hi.max(p.quantity))
    });

    let traces = [
        (PriceType::Msrp, "MSRP", "triangle-up"),
        (PriceType::SalePrice, "Sale Price", "circle"),
    ]
    .into_iter()
    .map(|(price_type, name, symbol)| {
        let selected: Vec<&CompositePoint> =
            points.iter().filter(|p| p.price_type == price_type).collect();
        Trace::new(TraceKind::Scatter)
            .name(name)
            .mode("markers+text")
            .x(selected.iter().map(|p| Datum::Number(p.price)).collect())
            .y(selected.iter().map(|p| Datum::Number(p.sales)).collect())
            .text(selected.iter().map(|p| p.product.clone()).collect())
            .text_position("top center")
            .marker(Marker {
                color: Some(MarkerColor::Scale(selected.iter().map(|p| p.quantity).collect())),
                symbol: Some(symbol.to_string()),
                size: Some(18.0),
                opacity: Some(0.8),
                colorscale: Some("Bluered".to_string()),
                cmin: Some(cmin),
                cmax: Some(cmax),
                showscale: Some(price_type == PriceType::Msrp),
                colorbar: Some(ColorBar {
                    title: Title::new("Quantity ordered"),
                }),
                line: Some(Line {
                    color: Some("black".to_string()),
                    width: Some(1.0),
                }),
            })
            .hover_template("%{text}<br>Price = %{x:.2f}<br>Total sales = %{y:,.0f}<extra></extra>")
    })
    .collect();

    Chart::new(
        Layout::titled("MSRP vs. Sale Price with Analysis of Sales and Quantity Ordered")
            .axes("Price [MSRP & Sale Price]", "Total sales")
            .legend_title("Price type"),
        traces,
    )
}

/// Price/quantity composite; also rasterized to `raster_path`
pub fn price_quantity_composite(
    table: &Table,
    products_column: &str,
    quantity_column: &str,
    sales_column: &str,
    msrp_column: &str,
    price_column: &str,
    raster_path: &Path,
) -> crate::Result<Chart> {
    info!("plotting sales, price, quantity ordered");
    let points = price_quantity_summary(
        table,
        products_column,
        quantity_column,
        sales_column,
        msrp_column,
        price_column,
    )?;

    write_composite_png(&points, raster_path)?;
    info!(path = %raster_path.display(), "composite chart rasterized");

    Ok(price_quantity_chart(&points))
}
