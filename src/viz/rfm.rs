//! Customer segmentation by Recency, Frequency and Monetary value (RFM)

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{info, warn};

use super::{frame_with_datetimes, numbers, texts};
use crate::chart::{Chart, ColorBar, Datum, Layout, Marker, MarkerColor, Title, Trace, TraceKind};
use crate::data::{column_values, Table, Value};

/// Recency band edges in days; the last band ends at the observed maximum
pub const RECENCY_EDGES: [f64; 5] = [0.0, 30.0, 90.0, 180.0, 365.0];
/// Frequency band edges in distinct orders
pub const FREQUENCY_EDGES: [f64; 5] = [0.0, 1.0, 3.0, 5.0, 10.0];
/// Monetary band edges in sales currency
pub const MONETARY_EDGES: [f64; 5] = [0.0, 10_000.0, 50_000.0, 100_000.0, 200_000.0];

const LAST_ORDER: &str = "LastOrderDate";
const FREQUENCY: &str = "Frequency";
const MONETARY: &str = "Monetary";

/// RFM features of one customer
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRfm {
    pub customer: String,
    /// Days between the customer's last order and the latest order in the data
    pub recency: i64,
    /// Number of distinct orders
    pub frequency: u32,
    /// Total sales
    pub monetary: f64,
}

/// Number of customers falling in one band
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub label: String,
    pub customers: usize,
}

/// Charts produced by [`rfm`]
#[derive(Debug, Clone)]
pub struct RfmCharts {
    pub scatter: Chart,
    pub recency: Chart,
    pub frequency: Chart,
    pub monetary: Chart,
}

/// Compute RFM features per customer
///
/// Recency is measured against the most recent order date in the whole table,
/// not the wall clock, so reports on historical data stay meaningful.
pub fn rfm_summary(
    table: &Table,
    order_column: &str,
    date_column: &str,
    customer_column: &str,
    sales_column: &str,
) -> crate::Result<Vec<CustomerRfm>> {
    table.require(&[order_column, date_column, customer_column, sales_column])?;

    let grouped = frame_with_datetimes(table, date_column)?
        .lazy()
        .group_by_stable([col(customer_column)])
        .agg([
            // Recency: last purchase date, turned into days below
            col(date_column).max().alias(LAST_ORDER),
            // Frequency: number of unique orders
            col(order_column).n_unique().alias(FREQUENCY),
            // Monetary: total spending
            col(sales_column).sum().alias(MONETARY),
        ])
        .collect()?;

    let last_orders: Vec<Option<NaiveDateTime>> = column_values(&grouped, LAST_ORDER)?
        .into_iter()
        .map(|v| match v {
            Value::DateTime(d) => Some(d),
            _ => None,
        })
        .collect();
    let reference = last_orders.iter().flatten().max().copied();

    let customers = texts(&grouped, customer_column)?;
    let frequency = numbers(&grouped, FREQUENCY)?;
    let monetary = numbers(&grouped, MONETARY)?;

    let mut features = Vec::with_capacity(customers.len());
    for (i, customer) in customers.into_iter().enumerate() {
        let (Some(last), Some(reference)) = (last_orders[i], reference) else {
            warn!(%customer, "customer has no dated orders, skipping");
            continue;
        };
        features.push(CustomerRfm {
            customer,
            recency: (reference - last).num_days(),
            frequency: frequency[i] as u32,
            monetary: monetary[i],
        });
    }

    Ok(features)
}

/// Count values into right-inclusive bands `[e0, e1], (e1, e2], ...`
///
/// The first band starts at the observed minimum when values fall below the
/// first edge, and a final open band `(e_last, max]` is added when the maximum
/// exceeds the last edge, so every value lands in exactly one band. Empty
/// bands are omitted.
pub fn band_counts(values: &[f64], edges: &[f64], unit: &str) -> Vec<Band> {
    let (min, max) = values
        .iter()
        .copied()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let mut bounds: Vec<f64> = edges.to_vec();
    if let Some(first) = bounds.first_mut() {
        if min < *first {
            *first = min;
        }
    }
    if let Some(&last) = edges.last() {
        if max > last {
            bounds.push(max);
        }
    }

    bounds
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let (lo, hi) = (pair[0], pair[1]);
            let customers = values
                .iter()
                .filter(|&&v| (v > lo || (i == 0 && v >= lo)) && v <= hi)
                .count();
            (customers > 0).then(|| Band {
                label: format!("{} {unit}", band_label(lo, hi)),
                customers,
            })
        })
        .collect()
}

/// `lo-hi` label; one decimal when whole numbers would print the same edge twice
fn band_label(lo: f64, hi: f64) -> String {
    let (from, to) = (format_edge(lo, 0), format_edge(hi, 0));
    if from == to {
        format!("{}-{}", format_edge(lo, 1), format_edge(hi, 1))
    } else {
        format!("{from}-{to}")
    }
}

fn format_edge(value: f64, decimals: usize) -> String {
    if value.abs() >= 1_000.0 {
        format!("{:.*}k", decimals, value / 1_000.0)
    } else {
        format!("{:.*}", decimals, value)
    }
}

fn pie(title: &str, bands: Vec<Band>) -> Chart {
    let (labels, values) = bands
        .into_iter()
        .map(|b| (b.label, b.customers as f64))
        .unzip();
    Chart::new(
        Layout::titled(title),
        vec![Trace::new(TraceKind::Pie)
            .slices(labels, values)
            .hover_template("%{label}<br>Customers = %{value} (%{percent})<extra></extra>")],
    )
}

/// 3-D RFM scatter colored by monetary value plus one pie per RFM dimension
pub fn rfm(
    table: &Table,
    order_column: &str,
    date_column: &str,
    customer_column: &str,
    sales_column: &str,
) -> crate::Result<RfmCharts> {
    info!("plotting RFM segmentation");
    let features = rfm_summary(table, order_column, date_column, customer_column, sales_column)?;

    let recency: Vec<f64> = features.iter().map(|f| f.recency as f64).collect();
    let frequency: Vec<f64> = features.iter().map(|f| f64::from(f.frequency)).collect();
    let monetary: Vec<f64> = features.iter().map(|f| f.monetary).collect();

    let scatter_trace = Trace::new(TraceKind::Scatter3d)
        .mode("markers")
        .x(recency.iter().map(|&v| Datum::Number(v)).collect())
        .y(frequency.iter().map(|&v| Datum::Number(v)).collect())
        .z(monetary.iter().map(|&v| Datum::Number(v)).collect())
        .text(features.iter().map(|f| f.customer.clone()).collect())
        .marker(Marker {
            color: Some(MarkerColor::Scale(monetary.clone())),
            size: Some(5.0),
            opacity: Some(0.8),
            colorscale: Some("Viridis".to_string()),
            showscale: Some(true),
            colorbar: Some(ColorBar {
                title: Title::new("Monetary"),
            }),
            ..Default::default()
        })
        .hover_template(
            "%{text}<br>Recency = %{x} days<br>Frequency = %{y}<br>Monetary = %{z:,.2f}<extra></extra>",
        );

    let scatter = Chart::new(
        Layout::titled("Customer RFM Segmentation").scene(
            "Recency (days)",
            "Frequency (orders)",
            "Monetary (sales)",
        ),
        vec![scatter_trace],
    );

    let charts = RfmCharts {
        scatter,
        recency: pie(
            "Customers by Recency",
            band_counts(&recency, &RECENCY_EDGES, "days"),
        ),
        frequency: pie(
            "Customers by Frequency",
            band_counts(&frequency, &FREQUENCY_EDGES, "orders"),
        ),
        monetary: pie(
            "Customers by Monetary Value",
            band_counts(&monetary, &MONETARY_EDGES, "sales"),
        ),
    };

    info!(customers = features.len(), "RFM segmentation plotted successfully");
    Ok(charts)
}
