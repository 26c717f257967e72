//! Draws a [`ChartSpec`] into a terminal region.
//!
//! Tick labels are laid out here rather than by ratatui's axes so the plot
//! rectangle is known exactly; that rectangle is what pointer clicks are
//! mapped through.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph, Widget},
};

use crate::chart_lifecycle::PlotGeometry;
use crate::config::Theme;
use crate::series::{ChartKind, ChartSpec, SeriesKind};

pub struct ChartView<'a> {
    pub spec: &'a ChartSpec,
    pub theme: &'a Theme,
    pub focused: bool,
    /// Data x under the pointer, for the nearest-point readout
    pub hover: Option<f64>,
    /// Tick count when the chart does not set one
    pub default_ticks: usize,
}

fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Bounds padded so that flat or single-point data still spans an interval.
fn padded_bounds(spec: &ChartSpec) -> Option<([f64; 2], [f64; 2])> {
    let ((x_min, x_max), (mut y_min, y_max)) = spec.bounds()?;
    if spec.series.iter().any(|s| s.kind == SeriesKind::Bar) {
        y_min = y_min.min(0.0);
    }
    let x = if x_max > x_min {
        [x_min, x_max]
    } else {
        [x_min - 0.5, x_min + 0.5]
    };
    let y = if y_max > y_min {
        [y_min, y_max]
    } else {
        [y_min - 0.5, y_min + 0.5]
    };
    Some((x, y))
}

/// Label for each of `ticks` evenly spaced columns, taken from the chart's
/// own x labels at the matching fraction of the sample range.
fn tick_labels(spec: &ChartSpec, ticks: usize) -> Vec<String> {
    let n = spec.x_labels.len();
    if n == 0 || ticks == 0 {
        return Vec::new();
    }
    let ticks = ticks.min(n).max(1);
    if ticks == 1 {
        return vec![spec.x_labels[0].clone()];
    }
    (0..ticks)
        .map(|k| spec.x_labels[k * (n - 1) / (ticks - 1)].clone())
        .collect()
}

/// Nearest-point readout for the cursor at `x`.
fn readout(spec: &ChartSpec, x: f64) -> Option<String> {
    let (i, (x, y)) = spec.nearest_point(x)?;
    let xp = spec.options.tooltip_precision;
    let yp = spec.options.value_precision;
    Some(format!(
        " {}: {} = {:.xp$}, y = {:.yp$} ",
        spec.series[i].label, spec.x_title, x, y
    ))
}

/// Render `view` into `area`. Returns where the plot landed, or None when
/// there was nothing to plot.
pub fn render_chart(view: &ChartView, area: Rect, buf: &mut Buffer) -> Option<PlotGeometry> {
    let spec = view.spec;
    let theme = view.theme;
    let text_primary = theme.get("text_primary");
    let text_secondary = theme.get("text_secondary");
    let border = if view.focused {
        theme.get("border_active")
    } else {
        theme.get("border")
    };

    let readout = view.hover.and_then(|x| readout(spec, x));

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", spec.title),
            Style::default().fg(text_primary).add_modifier(Modifier::BOLD),
        ));
    if let Some(readout) = readout {
        block = block.title_bottom(Line::from(readout).right_aligned());
    }
    let inner = block.inner(area);
    block.render(area, buf);

    let Some((x_bounds, y_bounds)) = padded_bounds(spec) else {
        Paragraph::new("No valid data points")
            .style(Style::default().fg(text_secondary))
            .centered()
            .render(inner, buf);
        return None;
    };

    let label_style = Style::default().fg(text_secondary);
    let y_labels = [
        format_axis_label(y_bounds[1]),
        format_axis_label((y_bounds[0] + y_bounds[1]) / 2.0),
        format_axis_label(y_bounds[0]),
    ];
    let y_label_width = y_labels.iter().map(|l| l.len()).max().unwrap_or(0) as u16 + 1;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(if spec.options.show_x_axis { 1 } else { 0 }),
        ])
        .split(inner);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(y_label_width), Constraint::Fill(1)])
        .split(rows[0]);
    let plot = cols[1];
    if plot.width < 2 || plot.height < 1 {
        return None;
    }

    // y labels at top, middle and bottom of the plot
    let y_col = cols[0];
    let y_rows = [y_col.y, y_col.y + y_col.height / 2, y_col.bottom().saturating_sub(1)];
    for (label, row) in y_labels.iter().zip(y_rows) {
        Paragraph::new(label.as_str())
            .style(label_style)
            .render(Rect::new(y_col.x, row, y_col.width.saturating_sub(1), 1), buf);
    }

    if spec.options.show_x_axis {
        let ticks = spec.options.max_x_ticks.unwrap_or(view.default_ticks);
        let labels = tick_labels(spec, ticks);
        let x_row = Rect::new(plot.x, rows[1].y, plot.width, 1);
        let slots = labels.len().max(1) as u16;
        for (k, label) in labels.iter().enumerate() {
            let k = k as u16;
            let col = if slots > 1 {
                plot.x + k * (plot.width - 1) / (slots - 1)
            } else {
                plot.x
            };
            let width = label.len() as u16;
            // keep labels inside the row, right-aligning the last
            let x = col.saturating_sub(width / 2).max(x_row.x);
            let x = x.min(x_row.right().saturating_sub(width));
            Paragraph::new(label.as_str())
                .style(label_style)
                .render(Rect::new(x, x_row.y, width.min(x_row.width), 1), buf);
        }
    }

    let mixed = spec.kind == ChartKind::Mixed;
    let datasets: Vec<Dataset> = spec
        .series
        .iter()
        .filter(|s| !s.points.is_empty())
        .map(|s| {
            let (graph_type, marker) = match s.kind {
                SeriesKind::Line => (GraphType::Line, symbols::Marker::Braille),
                SeriesKind::Bar => (GraphType::Bar, symbols::Marker::HalfBlock),
            };
            let color = match (mixed, s.kind) {
                (true, SeriesKind::Bar) => theme.get("histogram_bar"),
                (true, SeriesKind::Line) => theme.get("reference_curve"),
                _ => theme.rgb(s.style.color.to_rgb()),
            };
            let mut dataset = Dataset::default()
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(color))
                .data(&s.points);
            if spec.options.show_legend {
                dataset = dataset.name(s.label.clone());
            }
            dataset
        })
        .collect();

    let chart = Chart::new(datasets)
        .x_axis(Axis::default().bounds(x_bounds))
        .y_axis(Axis::default().bounds(y_bounds))
        .legend_position(if spec.options.show_legend {
            Some(LegendPosition::TopRight)
        } else {
            None
        })
        .hidden_legend_constraints((Constraint::Ratio(1, 3), Constraint::Ratio(1, 2)));
    chart.render(plot, buf);

    Some(PlotGeometry {
        area: plot,
        x_bounds,
    })
}
