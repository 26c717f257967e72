//! Chart export: PNG (plotters bitmap), SVG (plotters SVG) and the chart
//! description itself as JSON.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::series::{ChartSpec, SeriesKind};
use lscan_cli::{ExportFormat, ViewMode};

/// `lscan-<view>-q<q>.<ext>`
pub fn export_file_name(view: ViewMode, modulus: u64, format: ExportFormat) -> String {
    format!("lscan-{}-q{}.{}", view.as_str(), modulus, format.extension())
}

/// Where an export lands: `dir` if given, else the working directory.
pub fn export_path(
    dir: Option<&Path>,
    view: ViewMode,
    modulus: u64,
    format: ExportFormat,
) -> PathBuf {
    let name = export_file_name(view, modulus, format);
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Write `spec` to `path`. `size` is the image size in pixels and is
/// ignored for JSON.
pub fn export_chart(
    spec: &ChartSpec,
    format: ExportFormat,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    if !spec.has_data() {
        return Err(eyre!("No data to export"));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(spec)?;
            fs::write(path, json)?;
        }
        ExportFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_chart(&root, spec)?;
        }
        ExportFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_chart(&root, spec)?;
        }
    }
    log::info!("exported {} to {}", spec.title, path.display());
    Ok(())
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let ((x_min, x_max), (mut y_min, mut y_max)) =
        spec.bounds().ok_or_else(|| eyre!("No data to export"))?;
    let has_bars = spec.series.iter().any(|s| s.kind == SeriesKind::Bar);
    if has_bars {
        y_min = y_min.min(0.0);
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let (x_min, x_max) = if x_max > x_min {
        (x_min, x_max)
    } else {
        (x_min - 0.5, x_max + 0.5)
    };

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title.as_str(), ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(if spec.options.show_x_axis { 40 } else { 0 })
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let precision = spec.options.tooltip_precision;
    let x_format = |x: &f64| format!("{:.*}", precision, x);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(spec.x_title.as_str())
        .y_desc(spec.y_title.as_str())
        .x_label_formatter(&x_format);
    if let Some(ticks) = spec.options.max_x_ticks {
        mesh.x_labels(ticks);
    }
    if !spec.options.show_x_axis {
        mesh.disable_x_axis();
    }
    mesh.draw()?;

    for s in &spec.series {
        if s.points.is_empty() {
            continue;
        }
        let (r, g, b) = s.style.color.to_rgb();
        let color = RGBColor(r, g, b).mix(s.style.color.alpha);
        match s.kind {
            SeriesKind::Line => {
                let style = ShapeStyle::from(color).stroke_width(s.style.width.ceil() as u32);
                let series = chart.draw_series(LineSeries::new(s.points.iter().copied(), style))?;
                if spec.options.show_legend {
                    series
                        .label(s.label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
            }
            SeriesKind::Bar => {
                let half = match s.points.as_slice() {
                    [a, b, ..] => (b.0 - a.0).abs() / 2.0,
                    _ => 0.5,
                };
                chart.draw_series(s.points.iter().map(|&(x, y)| {
                    Rectangle::new([(x - half, 0.0), (x + half, y)], color.filled())
                }))?;
            }
        }
    }

    if spec.options.show_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{series_color, ChartDescriptor, ChartKind, ChartOptions, SeriesStyle};

    fn spec(points: Vec<(f64, f64)>) -> ChartSpec {
        ChartSpec {
            kind: ChartKind::Line,
            title: "log|L(0.5+it)| for all characters mod 5".into(),
            x_title: "t".into(),
            y_title: "log|L|".into(),
            x_labels: points.iter().map(|p| format!("{:.2}", p.0)).collect(),
            series: vec![ChartDescriptor {
                label: "Chi 1 (Principal)".into(),
                kind: SeriesKind::Line,
                points,
                style: SeriesStyle::line(series_color(0, 1)),
            }],
            options: ChartOptions::default(),
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            export_file_name(ViewMode::Overlay, 5, ExportFormat::Png),
            "lscan-overlay-q5.png"
        );
        let dir = Path::new("/tmp/plots");
        assert_eq!(
            export_path(Some(dir), ViewMode::Clt, 7, ExportFormat::Json),
            dir.join("lscan-clt-q7.json")
        );
    }

    #[test]
    fn test_json_export_is_the_serialized_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("chart.json");
        let spec = spec(vec![(0.0, 1.0), (1.0, 2.0)]);
        export_chart(&spec, ExportFormat::Json, &path, (800, 600)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, serde_json::to_string_pretty(&spec).unwrap());
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["options"]["animation"], false);
    }

    #[test]
    fn test_empty_chart_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        assert!(export_chart(&spec(vec![]), ExportFormat::Json, &path, (800, 600)).is_err());
        assert!(!path.exists());
    }
}
