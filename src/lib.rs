//! SalesForge: a sales analytics pipeline built on Polars
//!
//! Loads a sales CSV, cleans and enriches it, and builds charts on sales
//! trends, regional performance, pricing and customer RFM segmentation. Charts
//! are written as standalone plotly.js HTML pages plus one plotters raster.

pub mod chart;
pub mod clean;
pub mod cli;
pub mod convert;
pub mod countries;
pub mod data;
pub mod derive;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod viz;

// Re-export public items for easier access
pub use chart::Chart;
pub use clean::{clean_data, trim_whitespace};
pub use cli::Args;
pub use convert::{to_categorical, to_datetime};
pub use data::{load_data, Encoding, Row, Table, Value};
pub use derive::{add_column, discount_pct};
pub use error::Error;
pub use pipeline::{prepare_sales, write_reports};
pub use report::{write_html, ReportPaths};
pub use viz::Period;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
