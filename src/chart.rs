//! Immutable chart descriptions
//!
//! A [`Chart`] is a layout plus a list of traces. It serializes to the JSON
//! shape plotly.js expects, so the report writer can embed it in a page
//! without any further translation.

use std::collections::HashMap;

use serde::Serialize;

use crate::data::Value;

/// Qualitative palette assigned to categories in order of first appearance
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Hands out palette colors per category, wrapping after the last color
#[derive(Debug, Default)]
pub struct ColorAssigner {
    assigned: HashMap<String, &'static str>,
}

impl ColorAssigner {
    pub fn color_for(&mut self, category: &str) -> &'static str {
        let next = PALETTE[self.assigned.len() % PALETTE.len()];
        *self.assigned.entry(category.to_string()).or_insert(next)
    }
}

/// One coordinate: a number, a label, or a gap
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datum {
    Number(f64),
    Text(String),
    Null,
}

impl From<&Value> for Datum {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Datum::Null,
            Value::Int(v) => Datum::Number(*v as f64),
            Value::Float(v) => Datum::Number(*v),
            other => Datum::Text(other.to_string()),
        }
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Number(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Text(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Text(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
    Histogram,
    Choropleth,
    Pie,
    Scatter3d,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Fixed(String),
    Scale(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<MarkerColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<ColorBar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// One series of marks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    x: Vec<Datum>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    y: Vec<Datum>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    z: Vec<Datum>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    textposition: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    customdata: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<Line>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locationmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    colorscale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    colorbar: Option<ColorBar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stackgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    histfunc: Option<String>,
}

impl Trace {
    pub fn new(kind: TraceKind) -> Self {
        Self {
            kind,
            name: None,
            mode: None,
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            text: Vec::new(),
            textposition: None,
            customdata: Vec::new(),
            hovertemplate: None,
            marker: None,
            line: None,
            locations: Vec::new(),
            locationmode: None,
            colorscale: None,
            colorbar: None,
            labels: Vec::new(),
            values: Vec::new(),
            stackgroup: None,
            histfunc: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    pub fn x(mut self, x: Vec<Datum>) -> Self {
        self.x = x;
        self
    }

    pub fn y(mut self, y: Vec<Datum>) -> Self {
        self.y = y;
        self
    }

    pub fn z(mut self, z: Vec<Datum>) -> Self {
        self.z = z;
        self
    }

    pub fn text(mut self, text: Vec<String>) -> Self {
        self.text = text;
        self
    }

    pub fn text_position(mut self, position: &str) -> Self {
        self.textposition = Some(position.to_string());
        self
    }

    pub fn custom_data(mut self, data: Vec<String>) -> Self {
        self.customdata = data;
        self
    }

    pub fn hover_template(mut self, template: &str) -> Self {
        self.hovertemplate = Some(template.to_string());
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn line_color(mut self, color: &str) -> Self {
        self.line = Some(Line {
            color: Some(color.to_string()),
            width: None,
        });
        self
    }

    /// Choropleth regions keyed by ISO-3166 alpha-3 code
    pub fn locations(mut self, codes: Vec<String>) -> Self {
        self.locations = codes;
        self.locationmode = Some("ISO-3".to_string());
        self
    }

    pub fn color_scale(mut self, scale: &str, title: &str) -> Self {
        self.colorscale = Some(scale.to_string());
        self.colorbar = Some(ColorBar {
            title: Title::new(title),
        });
        self
    }

    /// Pie slices
    pub fn slices(mut self, labels: Vec<String>, values: Vec<f64>) -> Self {
        self.labels = labels;
        self.values = values;
        self
    }

    pub fn stack_group(mut self, group: &str) -> Self {
        self.stackgroup = Some(group.to_string());
        self
    }

    pub fn hist_func(mut self, func: &str) -> Self {
        self.histfunc = Some(func.to_string());
        self
    }

    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    pub fn trace_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn x_values(&self) -> &[Datum] {
        &self.x
    }

    pub fn y_values(&self) -> &[Datum] {
        &self.y
    }

    pub fn z_values(&self) -> &[Datum] {
        &self.z
    }

    pub fn text_values(&self) -> &[String] {
        &self.text
    }

    pub fn location_codes(&self) -> &[String] {
        &self.locations
    }

    pub fn slice_labels(&self) -> &[String] {
        &self.labels
    }

    pub fn slice_values(&self) -> &[f64] {
        &self.values
    }

    pub fn marker_style(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
}

impl Title {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            x: None,
            xanchor: None,
            yanchor: None,
        }
    }

    fn centered(text: &str) -> Self {
        Self {
            x: Some(0.5),
            xanchor: Some("center".to_string()),
            yanchor: Some("top".to_string()),
            ..Self::new(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[Datum; 2]>,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Self {
            title: Title::new(text),
            tickangle: None,
            range: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub zaxis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bargap: Option<f64>,
}

impl Layout {
    /// Layout with a centered title and nothing else
    pub fn titled(title: &str) -> Self {
        Self {
            title: Title::centered(title),
            xaxis: None,
            yaxis: None,
            scene: None,
            legend: None,
            barmode: None,
            bargap: None,
        }
    }

    pub fn axes(mut self, x_title: &str, y_title: &str) -> Self {
        self.xaxis = Some(Axis::titled(x_title));
        self.yaxis = Some(Axis::titled(y_title));
        self
    }

    pub fn x_tick_angle(mut self, angle: i32) -> Self {
        if let Some(axis) = self.xaxis.as_mut() {
            axis.tickangle = Some(angle);
        }
        self
    }

    pub fn x_range(mut self, from: Datum, to: Datum) -> Self {
        if let Some(axis) = self.xaxis.as_mut() {
            axis.range = Some([from, to]);
        }
        self
    }

    pub fn scene(mut self, x_title: &str, y_title: &str, z_title: &str) -> Self {
        self.scene = Some(Scene {
            xaxis: Axis::titled(x_title),
            yaxis: Axis::titled(y_title),
            zaxis: Axis::titled(z_title),
        });
        self
    }

    pub fn legend_title(mut self, title: &str) -> Self {
        self.legend = Some(Legend {
            title: Title::new(title),
        });
        self
    }

    pub fn bar_mode(mut self, mode: &str) -> Self {
        self.barmode = Some(mode.to_string());
        self
    }

    pub fn bar_gap(mut self, gap: f64) -> Self {
        self.bargap = Some(gap);
        self
    }
}

/// Structured, immutable description of one visualization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    data: Vec<Trace>,
    layout: Layout,
}

impl Chart {
    pub fn new(layout: Layout, traces: Vec<Trace>) -> Self {
        Self {
            data: traces,
            layout,
        }
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }

    pub fn traces(&self) -> &[Trace] {
        &self.data
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Find a trace by its legend name
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|t| t.trace_name() == Some(name))
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
