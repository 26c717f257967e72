//! Shaping backend payloads into chart descriptions.
//!
//! Everything here is a pure function of its inputs: the same payload and
//! parameters always produce an identical [`ChartSpec`].

use crate::backend::{ScanAll, ScanPoint};
use crate::histogram::Histogram;
use ratatui::style::Color;
use serde::Serialize;
use std::fmt;

pub const LINE_WIDTH: f64 = 1.5;
pub const LINE_TENSION: f64 = 0.2;
/// Tick cap for the all-characters overlay.
pub const OVERLAY_MAX_TICKS: usize = 20;
/// Decimal places of x labels in single-character views.
pub const SINGLE_PRECISION: usize = 4;
/// Decimal places of x labels in the overlay and grid views.
pub const MULTI_PRECISION: usize = 2;
/// Decimal places of log|L| in the overlay and grid readouts.
pub const MULTI_VALUE_PRECISION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsla {
    /// Degrees
    pub hue: f64,
    /// Percent
    pub saturation: f64,
    /// Percent
    pub lightness: f64,
    pub alpha: f64,
}

impl Hsla {
    /// Opaque RGB, ignoring alpha.
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let h = self.hue.rem_euclid(360.0);
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h {
            h if h < 60.0 => (c, x, 0.0),
            h if h < 120.0 => (x, c, 0.0),
            h if h < 180.0 => (0.0, c, x),
            h if h < 240.0 => (0.0, x, c),
            h if h < 300.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    pub fn to_color(&self) -> Color {
        let (r, g, b) = self.to_rgb();
        Color::Rgb(r, g, b)
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

/// Color of the `index`-th of `total` series: hues evenly spread around
/// the wheel at 70% saturation, 50% lightness.
pub fn series_color(index: usize, total: usize) -> Hsla {
    let hue = if total == 0 {
        0.0
    } else {
        index as f64 * 360.0 / total as f64
    };
    Hsla {
        hue,
        saturation: 70.0,
        lightness: 50.0,
        alpha: 0.8,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub color: Hsla,
    pub width: f64,
    pub show_points: bool,
    pub tension: f64,
}

impl SeriesStyle {
    pub fn line(color: Hsla) -> Self {
        Self {
            color,
            width: LINE_WIDTH,
            show_points: false,
            tension: LINE_TENSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescriptor {
    pub label: String,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub show_x_axis: bool,
    pub show_legend: bool,
    pub max_x_ticks: Option<usize>,
    /// Decimal places of x in the nearest-point readout.
    pub tooltip_precision: usize,
    /// Decimal places of y in the nearest-point readout.
    pub value_precision: usize,
    pub zoom_on_click: bool,
    pub animation: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            show_x_axis: true,
            show_legend: true,
            max_x_ticks: None,
            tooltip_precision: SINGLE_PRECISION,
            value_precision: SINGLE_PRECISION,
            zoom_on_click: true,
            animation: false,
        }
    }
}

/// Declarative description of one chart, independent of the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub x_labels: Vec<String>,
    pub series: Vec<ChartDescriptor>,
    pub options: ChartOptions,
}

impl ChartSpec {
    pub fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.points.is_empty())
    }

    /// (min, max) over all finite points, or None for an empty chart.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let &(x0, y0) = points.next()?;
        let init = ((x0, x0), (y0, y0));
        Some(points.fold(init, |((xmin, xmax), (ymin, ymax)), &(x, y)| {
            ((xmin.min(x), xmax.max(x)), (ymin.min(y), ymax.max(y)))
        }))
    }

    /// The point whose x is nearest to `x`, with the series it belongs to.
    pub fn nearest_point(&self, x: f64) -> Option<(usize, (f64, f64))> {
        self.series
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.points.iter().map(move |p| (i, *p)))
            .min_by(|(_, a), (_, b)| (a.0 - x).abs().total_cmp(&(b.0 - x).abs()))
    }
}

/// Parameters shared by the single-character builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanContext {
    pub modulus: u64,
    pub character_label: String,
    pub real_part: f64,
}

pub fn format_tick(x: f64, precision: usize) -> String {
    format!("{:.*}", precision, x)
}

fn finite_points(pairs: impl Iterator<Item = (f64, Option<f64>)>) -> Vec<(f64, f64)> {
    pairs
        .filter_map(|(x, y)| match y {
            Some(y) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        })
        .collect()
}

fn line(label: String, points: Vec<(f64, f64)>, color: Hsla) -> ChartDescriptor {
    ChartDescriptor {
        label,
        kind: SeriesKind::Line,
        points,
        style: SeriesStyle::line(color),
    }
}

/// Real part of L(r + it) for one character.
pub fn real_part_chart(points: &[ScanPoint], ctx: &ScanContext) -> ChartSpec {
    let re = finite_points(points.iter().map(|p| (p.t, p.re)));
    ChartSpec {
        kind: ChartKind::Line,
        title: format!(
            "Re L({}+it, chi {}) mod {}",
            ctx.real_part, ctx.character_label, ctx.modulus
        ),
        x_title: "t".to_string(),
        y_title: "Re L".to_string(),
        x_labels: points
            .iter()
            .map(|p| format_tick(p.t, SINGLE_PRECISION))
            .collect(),
        series: vec![line(
            format!("Chi {}", ctx.character_label),
            re,
            series_color(0, 1),
        )],
        options: ChartOptions::default(),
    }
}

/// Real and imaginary parts of L(r + it) for one character.
pub fn complex_chart(points: &[ScanPoint], ctx: &ScanContext) -> ChartSpec {
    let re = finite_points(points.iter().map(|p| (p.t, p.re)));
    let im = finite_points(points.iter().map(|p| (p.t, p.im)));
    ChartSpec {
        kind: ChartKind::Line,
        title: format!(
            "L({}+it, chi {}) mod {}",
            ctx.real_part, ctx.character_label, ctx.modulus
        ),
        x_title: "t".to_string(),
        y_title: "L".to_string(),
        x_labels: points
            .iter()
            .map(|p| format_tick(p.t, SINGLE_PRECISION))
            .collect(),
        series: vec![
            line(
                format!("Re Chi {}", ctx.character_label),
                re,
                series_color(0, 2),
            ),
            line(
                format!("Im Chi {}", ctx.character_label),
                im,
                series_color(1, 2),
            ),
        ],
        options: ChartOptions::default(),
    }
}

/// log|L(1/2 + it)| for every character mod q on one chart.
pub fn overlay_chart(all: &ScanAll, modulus: u64) -> ChartSpec {
    let total = all.datasets.len();
    let series = all
        .datasets
        .iter()
        .enumerate()
        .map(|(i, ds)| {
            let points = finite_points(all.t.iter().copied().zip(ds.data.iter().copied()));
            line(format!("Chi {}", ds.label), points, series_color(i, total))
        })
        .collect();

    ChartSpec {
        kind: ChartKind::Line,
        title: format!("log|L(0.5+it)| for all characters mod {}", modulus),
        x_title: "t".to_string(),
        y_title: "log |L|".to_string(),
        x_labels: all
            .t
            .iter()
            .map(|t| format_tick(*t, MULTI_PRECISION))
            .collect(),
        series,
        options: ChartOptions {
            max_x_ticks: Some(OVERLAY_MAX_TICKS),
            tooltip_precision: MULTI_PRECISION,
            value_precision: MULTI_VALUE_PRECISION,
            ..ChartOptions::default()
        },
    }
}

/// One small chart per character, in dataset order.
///
/// Each chart keeps the color the character has in the overlay. Axes and
/// legends are suppressed; the title names the character.
pub fn grid_charts(all: &ScanAll) -> Vec<ChartSpec> {
    let total = all.datasets.len();
    let x_labels: Vec<String> = all
        .t
        .iter()
        .map(|t| format_tick(*t, MULTI_PRECISION))
        .collect();

    all.datasets
        .iter()
        .enumerate()
        .map(|(i, ds)| {
            let label = format!("Chi {}", ds.label);
            let points = finite_points(all.t.iter().copied().zip(ds.data.iter().copied()));
            ChartSpec {
                kind: ChartKind::Line,
                title: label.clone(),
                x_title: String::new(),
                y_title: String::new(),
                x_labels: x_labels.clone(),
                series: vec![line(label, points, series_color(i, total))],
                options: ChartOptions {
                    show_x_axis: false,
                    show_legend: false,
                    tooltip_precision: MULTI_PRECISION,
                    value_precision: MULTI_VALUE_PRECISION,
                    zoom_on_click: false,
                    ..ChartOptions::default()
                },
            }
        })
        .collect()
}

/// Density bars with the standard normal curve drawn over them.
pub fn histogram_chart(hist: &Histogram, ctx: &ScanContext) -> ChartSpec {
    let bars = ChartDescriptor {
        label: "density".to_string(),
        kind: SeriesKind::Bar,
        points: hist.bins.iter().map(|b| (b.center(), b.density)).collect(),
        style: SeriesStyle {
            width: 1.0,
            ..SeriesStyle::line(series_color(0, 2))
        },
    };
    let reference = line(
        "N(0,1)".to_string(),
        hist.reference_curve(),
        series_color(1, 2),
    );

    ChartSpec {
        kind: ChartKind::Mixed,
        title: format!(
            "Selberg CLT, chi {} mod {} ({})",
            ctx.character_label,
            ctx.modulus,
            hist.summary()
        ),
        x_title: "log|L| / sqrt(0.5 log log t)".to_string(),
        y_title: "density".to_string(),
        x_labels: hist
            .bins
            .iter()
            .map(|b| format_tick(b.center(), 1))
            .collect(),
        series: vec![bars, reference],
        options: ChartOptions {
            tooltip_precision: 2,
            value_precision: 3,
            zoom_on_click: false,
            ..ChartOptions::default()
        },
    }
}
