//! Writing charts to disk: standalone HTML pages and the PNG composite

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{debug, info};

use crate::chart::Chart;
use crate::error::Error;
use crate::viz::pricing::{CompositePoint, PriceType};

/// Script the HTML pages load plotly.js from
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const RASTER_SIZE: (u32, u32) = (1600, 1200);

/// Standalone HTML page drawing `chart` with plotly.js
pub fn render_html(chart: &Chart) -> crate::Result<String> {
    let json = chart.to_json()?;
    // a literal "</script>" inside the JSON would end the inline script early
    let json = json.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
const figure = {json};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escape_html(chart.title()),
    ))
}

/// Write `chart` as an HTML page, creating parent directories as needed
pub fn write_html(chart: &Chart, path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, render_html(chart)?)?;
    info!(path = %path.display(), "chart written");
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn ensure_parent(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn render_error(e: impl std::fmt::Display) -> Error {
    Error::Render(e.to_string())
}

/// Blue-white-red ramp for `t` in `[0, 1]`
fn cool_warm(t: f64) -> RGBColor {
    const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 220.0, 220.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let (from, to, s) = if t < 0.5 {
        (COOL, MID, t * 2.0)
    } else {
        (MID, WARM, (t - 0.5) * 2.0)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * s).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Value range padded by 5% on both sides, never empty
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { hi.abs().max(1.0) * 0.05 };
    (lo - pad)..(hi + pad)
}

/// Rasterize the price/quantity composite to a PNG
///
/// MSRP points are triangles, sale price points circles. Marker color follows
/// the quantity ordered on a cool-to-warm ramp and every marker carries its
/// product line as a label.
pub fn write_composite_png(points: &[CompositePoint], path: &Path) -> crate::Result<()> {
    ensure_parent(path)?;
    debug!(points = points.len(), path = %path.display(), "rasterizing composite");

    let (q_min, q_max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.quantity), hi.max(p.quantity))
    });
    let color_of = |quantity: f64| {
        if q_max > q_min {
            cool_warm((quantity - q_min) / (q_max - q_min))
        } else {
            cool_warm(0.5)
        }
    };

    let x_range = padded_range(points.iter().map(|p| p.price));
    let y_range = padded_range(points.iter().map(|p| p.sales));

    let root = BitMapBackend::new(path, RASTER_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "MSRP vs. Sale Price with Analysis of Sales and Quantity Ordered",
            ("sans-serif", 36),
        )
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(110)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc("Price [MSRP & Sale Price]")
        .y_desc("Total sales")
        .axis_desc_style(("sans-serif", 22))
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(render_error)?;

    let msrp: Vec<&CompositePoint> = points
        .iter()
        .filter(|p| p.price_type == PriceType::Msrp)
        .collect();
    let sale: Vec<&CompositePoint> = points
        .iter()
        .filter(|p| p.price_type == PriceType::SalePrice)
        .collect();

    chart
        .draw_series(msrp.iter().map(|p| {
            TriangleMarker::new((p.price, p.sales), 14, color_of(p.quantity).filled())
        }))
        .map_err(render_error)?
        .label("MSRP")
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 8, BLACK.filled()));

    chart
        .draw_series(
            sale.iter()
                .map(|p| Circle::new((p.price, p.sales), 12, color_of(p.quantity).filled())),
        )
        .map_err(render_error)?
        .label("Sale Price")
        .legend(|(x, y)| Circle::new((x + 10, y), 7, BLACK.filled()));

    let label_style = ("sans-serif", 16).into_font().color(&BLACK);
    chart
        .draw_series(points.iter().map(|p| {
            Text::new(p.product.clone(), (p.price, p.sales), label_style.clone())
        }))
        .map_err(render_error)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    info!(path = %path.display(), "composite raster saved");
    Ok(())
}

/// File locations of every report the pipeline produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    dir: PathBuf,
}

impl ReportPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn total_sales(&self) -> PathBuf {
        self.file("plot_total_sales.html")
    }

    pub fn regional_sales(&self) -> PathBuf {
        self.file("plot_regional_sales.html")
    }

    pub fn regional_sales_map(&self) -> PathBuf {
        self.file("plot_avg_regional_sales_map.html")
    }

    pub fn top_products(&self) -> PathBuf {
        self.file("plot_top_selling_products.html")
    }

    pub fn sales_by_msrp(&self) -> PathBuf {
        self.file("plot_total_sales_by_msrp.html")
    }

    pub fn individual_sales_by_msrp(&self) -> PathBuf {
        self.file("plot_individual_sales_by_msrp.html")
    }

    pub fn msrp_vs_price(&self) -> PathBuf {
        self.file("plot_MSRP_vs_actual_price.html")
    }

    pub fn price_quantity_raster(&self) -> PathBuf {
        self.file("plot_sales_prices_quantityordered.png")
    }

    pub fn pricing_strategy(&self) -> PathBuf {
        self.file("plot_pricing_strategy.html")
    }

    pub fn dealsize_trends(&self) -> PathBuf {
        self.file("plot_deal_size_trends.html")
    }

    pub fn rfm(&self) -> PathBuf {
        self.file("plot_rfm.html")
    }

    pub fn rfm_recency(&self) -> PathBuf {
        self.file("plot_rfm_pie_r.html")
    }

    pub fn rfm_frequency(&self) -> PathBuf {
        self.file("plot_rfm_pie_f.html")
    }

    pub fn rfm_monetary(&self) -> PathBuf {
        self.file("plot_rfm_pie_m.html")
    }
}

impl Default for ReportPaths {
    fn default() -> Self {
        Self::new("reports")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Datum, Layout, Trace, TraceKind};
    use tempfile::tempdir;

    fn chart() -> Chart {
        Chart::new(
            Layout::titled("Sales <2003>"),
            vec![Trace::new(TraceKind::Bar)
                .name("</script>")
                .x(vec![Datum::from("a")])
                .y(vec![Datum::Number(1.0)])],
        )
    }

    #[test]
    fn test_render_html_embeds_chart() {
        let html = render_html(&chart()).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>Sales &lt;2003&gt;</title>"));
        assert!(html.contains("\"type\":\"bar\""));
        // only the two real closing script tags remain
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_write_html_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("plot.html");
        write_html(&chart(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_report_paths() {
        let paths = ReportPaths::new("out");
        assert_eq!(paths.total_sales(), Path::new("out/plot_total_sales.html"));
        assert_eq!(
            paths.price_quantity_raster(),
            Path::new("out/plot_sales_prices_quantityordered.png")
        );
        assert_eq!(ReportPaths::default().dir(), Path::new("reports"));
    }

    #[test]
    fn test_cool_warm_ramp() {
        assert_eq!(cool_warm(0.0), RGBColor(59, 76, 192));
        assert_eq!(cool_warm(0.5), RGBColor(221, 220, 220));
        assert_eq!(cool_warm(1.0), RGBColor(180, 4, 38));
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range([10.0, 20.0].into_iter());
        assert!((range.start - 9.5).abs() < 1e-9);
        assert!((range.end - 20.5).abs() < 1e-9);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_write_composite_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("composite.png");
        let points = vec![
            CompositePoint {
                product: "Ships".into(),
                price_type: PriceType::Msrp,
                price: 100.0,
                sales: 5000.0,
                quantity: 40.0,
            },
            CompositePoint {
                product: "Ships".into(),
                price_type: PriceType::SalePrice,
                price: 90.0,
                sales: 5000.0,
                quantity: 40.0,
            },
        ];
        write_composite_png(&points, &path).unwrap();
        assert!(path.exists());
    }
}
