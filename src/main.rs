//! SalesForge: sales analytics CLI
//!
//! Loads the sales CSV, cleans and enriches it, then writes the trend,
//! pricing and RFM reports.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use salesforge::{prepare_sales, write_reports, Args, ReportPaths};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    fmt().with_env_filter(env).with_target(false).init();

    info!("script execution started");
    let start_time = Instant::now();

    // Step 1: load and prepare the data
    let data_start = Instant::now();
    let table = prepare_sales(&args.input, args.encoding)
        .with_context(|| format!("failed to prepare sales data from {}", args.input.display()))?;
    info!(
        rows = table.height(),
        elapsed_ms = data_start.elapsed().as_millis() as u64,
        "data loaded"
    );

    // Step 2: render the reports
    let paths = ReportPaths::new(&args.reports_dir);
    let written = write_reports(&table, &paths)
        .with_context(|| format!("failed to write reports to {}", args.reports_dir.display()))?;

    if args.verbose {
        for path in &written {
            info!(path = %path.display(), "report");
        }
    }

    info!(
        reports = written.len(),
        total_s = %format!("{:.2}", start_time.elapsed().as_secs_f64()),
        "main function execution ended"
    );
    Ok(())
}
