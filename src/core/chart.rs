//! Geometry for the dashboard bar, pie and line charts.
//!
//! Layout functions are pure: they turn an ordered `ChartDatum` slice into
//! positioned primitives. Hover state lives beside the layout and only
//! changes presentation.

use crate::domain::model::ChartDatum;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::str::FromStr;

pub const MIN_BAR_HEIGHT: f64 = 20.0;
pub const DEFAULT_BAR_COLOR: &str = "#10b981";

pub const PIE_CENTER: (f64, f64) = (100.0, 100.0);
pub const PIE_RADIUS: f64 = 80.0;
/// Twelve o'clock, in SVG degrees (clockwise from the positive x axis).
pub const PIE_START_ANGLE: f64 = -90.0;

pub const LINE_GRADIENT: (&str, &str) = ("#10b981", "#3b82f6");

const BAR_WIDTH: f64 = 40.0;
const BAR_GAP: f64 = 12.0;
const LABEL_BAND: f64 = 24.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    #[default]
    Pie,
    Line,
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "pie" => Ok(ChartKind::Pie),
            "line" => Ok(ChartKind::Line),
            other => Err(format!("unknown chart kind '{}'", other)),
        }
    }
}

/// Renders `data` as a standalone SVG document of the given kind.
pub fn render_svg(kind: ChartKind, data: &[ChartDatum], height: f64) -> String {
    match kind {
        ChartKind::Bar => bar_chart(data, height).to_svg(),
        ChartKind::Pie => pie_chart(data).to_svg(),
        ChartKind::Line => line_chart(data).to_svg(height),
    }
}

/// Index of the datum under the pointer, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    hovered: Option<usize>,
}

impl HoverState {
    pub fn enter(&mut self, index: usize) {
        self.hovered = Some(index);
    }

    pub fn leave(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn is_hovered(&self, index: usize) -> bool {
        self.hovered == Some(index)
    }

    /// Scale factor applied to the hovered element.
    pub fn scale(&self, index: usize) -> f64 {
        if self.is_hovered(index) {
            1.05
        } else {
            1.0
        }
    }

    pub fn tooltip(&self, data: &[ChartDatum]) -> Option<String> {
        self.hovered
            .and_then(|i| data.get(i))
            .map(|d| format!("{}: {}", d.label, format_thousands(d.value)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub height: f64,
    pub color: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub inner_height: f64,
    pub bars: Vec<Bar>,
}

pub fn bar_chart(data: &[ChartDatum], inner_height: f64) -> BarChart {
    let max = data.iter().map(|d| d.value).fold(f64::NEG_INFINITY, f64::max);

    let bars = data
        .iter()
        .map(|d| {
            let scaled = if max > 0.0 && max.is_finite() {
                d.value / max * inner_height
            } else {
                0.0
            };
            let height = if scaled.is_finite() {
                scaled.max(MIN_BAR_HEIGHT)
            } else {
                MIN_BAR_HEIGHT
            };
            Bar {
                label: d.label.clone(),
                value: d.value,
                height,
                color: d.color.clone().unwrap_or_else(|| DEFAULT_BAR_COLOR.to_string()),
                tooltip: format!("{}: {}", d.label, format_thousands(d.value)),
            }
        })
        .collect();

    BarChart { inner_height, bars }
}

impl BarChart {
    pub fn to_svg(&self) -> String {
        if self.bars.is_empty() {
            return empty_svg();
        }
        let plot_height = self
            .bars
            .iter()
            .map(|b| b.height)
            .fold(self.inner_height, f64::max);
        let width = self.bars.len() as f64 * (BAR_WIDTH + BAR_GAP) + BAR_GAP;
        let height = plot_height + LABEL_BAND;

        let mut svg = svg_open(width, height);
        for (i, bar) in self.bars.iter().enumerate() {
            let x = BAR_GAP + i as f64 * (BAR_WIDTH + BAR_GAP);
            let y = plot_height - bar.height;
            let _ = write!(
                svg,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"><title>{}</title></rect>"#,
                num(x),
                num(y),
                num(BAR_WIDTH),
                num(bar.height),
                escape_xml(&bar.color),
                escape_xml(&bar.tooltip)
            );
            let _ = write!(
                svg,
                r#"<text x="{}" y="{}" font-size="10" text-anchor="middle">{}</text>"#,
                num(x + BAR_WIDTH / 2.0),
                num(height - 8.0),
                escape_xml(&bar.label)
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub value: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub percentage: f64,
    pub color: String,
    pub path: String,
}

impl Wedge {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub total: f64,
    pub wedges: Vec<Wedge>,
}

/// Lays out wedges clockwise from [`PIE_START_ANGLE`]. Negative values count
/// as zero. A non-positive total yields no wedges.
pub fn pie_chart(data: &[ChartDatum]) -> PieChart {
    let values: Vec<f64> = data
        .iter()
        .map(|d| if d.value.is_finite() { d.value.max(0.0) } else { 0.0 })
        .collect();
    let total: f64 = values.iter().sum();

    if total <= 0.0 {
        return PieChart {
            total,
            wedges: Vec::new(),
        };
    }

    // Angles come from the running sum so the final edge lands on exactly
    // start + 360 regardless of how the individual sweeps round.
    let mut running = 0.0;
    let wedges = data
        .iter()
        .zip(&values)
        .enumerate()
        .map(|(i, (d, &value))| {
            let start_angle = PIE_START_ANGLE + running / total * 360.0;
            running += value;
            let end_angle = PIE_START_ANGLE + running / total * 360.0;
            Wedge {
                label: d.label.clone(),
                value: d.value,
                start_angle,
                end_angle,
                percentage: value / total * 100.0,
                color: d.color.clone().unwrap_or_else(|| default_color(i)),
                path: wedge_path(start_angle, end_angle),
            }
        })
        .collect();

    PieChart { total, wedges }
}

pub fn default_color(index: usize) -> String {
    format!("hsl({}, 70%, 60%)", (index * 60) % 360)
}

fn point_on_circle(angle: f64) -> (f64, f64) {
    let rad = angle * PI / 180.0;
    (
        PIE_CENTER.0 + PIE_RADIUS * rad.cos(),
        PIE_CENTER.1 + PIE_RADIUS * rad.sin(),
    )
}

fn wedge_path(start_angle: f64, end_angle: f64) -> String {
    let (cx, cy) = PIE_CENTER;
    let sweep = end_angle - start_angle;
    let (x1, y1) = point_on_circle(start_angle);

    if sweep >= 360.0 - 1e-9 {
        // an arc whose endpoints coincide draws nothing, so split the circle
        let (xm, ym) = point_on_circle(start_angle + 180.0);
        return format!(
            "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {} Z",
            num(x1),
            num(y1),
            num(xm),
            num(ym),
            num(x1),
            num(y1),
            r = num(PIE_RADIUS)
        );
    }

    let (x2, y2) = point_on_circle(end_angle);
    let large_arc = if sweep > 180.0 { 1 } else { 0 };
    format!(
        "M {} {} L {} {} A {r} {r} 0 {} 1 {} {} Z",
        num(cx),
        num(cy),
        num(x1),
        num(y1),
        large_arc,
        num(x2),
        num(y2),
        r = num(PIE_RADIUS)
    )
}

impl PieChart {
    pub fn center_label(&self) -> String {
        format_thousands(self.total)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.wedges
            .iter()
            .map(|w| LegendEntry {
                label: w.label.clone(),
                color: w.color.clone(),
                percentage: format!("{:.1}%", w.percentage),
            })
            .collect()
    }

    pub fn to_svg(&self) -> String {
        if self.wedges.is_empty() {
            return empty_svg();
        }
        let mut svg = svg_open(PIE_CENTER.0 * 2.0, PIE_CENTER.1 * 2.0);
        for (wedge, entry) in self.wedges.iter().zip(self.legend()) {
            let _ = write!(
                svg,
                r#"<path d="{}" fill="{}"><title>{} ({})</title></path>"#,
                wedge.path,
                escape_xml(&wedge.color),
                escape_xml(&wedge.label),
                entry.percentage
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" font-size="20" text-anchor="middle">{}</text>"#,
            num(PIE_CENTER.0),
            num(PIE_CENTER.1 + 6.0),
            self.center_label()
        );
        svg.push_str("</svg>");
        svg
    }
}

/// A line-chart vertex; `x` and `y` are percentages of the plot box.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePoint {
    pub label: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub points: Vec<LinePoint>,
}

pub fn line_chart(data: &[ChartDatum]) -> LineChart {
    let n = data.len();
    let min = data.iter().map(|d| d.value).fold(f64::INFINITY, f64::min);
    let max = data.iter().map(|d| d.value).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let points = data
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let x = if n > 1 {
                i as f64 / (n - 1) as f64 * 100.0
            } else {
                0.0
            };
            let y = if range > 0.0 && range.is_finite() && d.value.is_finite() {
                100.0 - (d.value - min) / range * 100.0
            } else {
                50.0
            };
            LinePoint {
                label: d.label.clone(),
                value: d.value,
                x,
                y,
            }
        })
        .collect();

    LineChart { points }
}

impl LineChart {
    /// Straight segments between consecutive points, in percent units.
    pub fn path(&self) -> String {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cmd = if i == 0 { 'M' } else { 'L' };
                format!("{} {}% {}%", cmd, num(p.x), num(p.y))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_svg(&self, height: f64) -> String {
        if self.points.is_empty() {
            return empty_svg();
        }
        let width = (self.points.len().max(2) as f64) * 60.0;
        let mut svg = svg_open(width, height);
        let _ = write!(
            svg,
            r#"<defs><linearGradient id="lineGradient" x1="0%" y1="0%" x2="100%" y2="0%"><stop offset="0%" stop-color="{}"/><stop offset="100%" stop-color="{}"/></linearGradient></defs>"#,
            LINE_GRADIENT.0, LINE_GRADIENT.1
        );
        let coords: Vec<String> = self
            .points
            .iter()
            .map(|p| format!("{},{}", num(p.x / 100.0 * width), num(p.y / 100.0 * height)))
            .collect();
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="url(#lineGradient)" stroke-width="3"/>"#,
            coords.join(" ")
        );
        for p in &self.points {
            let _ = write!(
                svg,
                r#"<circle cx="{}" cy="{}" r="4" fill="{}"><title>{}: {}</title></circle>"#,
                num(p.x / 100.0 * width),
                num(p.y / 100.0 * height),
                LINE_GRADIENT.0,
                escape_xml(&p.label),
                format_thousands(p.value)
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

/// en-US style grouping with at most three fraction digits: `1234.5` -> `1,234.5`.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height)
    )
}

fn empty_svg() -> String {
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="0"></svg>"#.to_string()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
