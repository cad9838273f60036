use crate::error::ReportError::ChartError;
use crate::error::{ReportError, ReportResult};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ChartError(e.to_string())
}

/// Register the font used for every chart label.
///
/// Uses `explicit` when given, otherwise the first readable well-known system
/// font. Must succeed once before any chart is drawn.
pub fn load_font(explicit: Option<&Path>) -> ReportResult<PathBuf> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    for path in candidates {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("font {} not usable: {}", path.display(), e);
                continue;
            }
        };
        // the font table keeps a 'static reference for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        register_font(FONT_FAMILY, FontStyle::Normal, bytes)
            .map_err(|_| ChartError(format!("invalid font {}", path.display())))?;
        info!("Using font {}", path.display());
        return Ok(path);
    }

    Err(ChartError("no usable TrueType font found, pass --font".to_string()))
}

/// Vertical bars, one per labeled value. NaN values leave an empty slot.
pub fn bar_chart(
    path: &Path,
    title: &str,
    y_desc: &str,
    bars: &[(String, f64)],
    size: (u32, u32),
) -> ReportResult<()> {
    if bars.is_empty() {
        return Err(ChartError(format!("no bars for {}", title)));
    }
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let max = bars
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let y_top = if max > 0.0 { max * 1.15 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0..bars.len()).into_segmented(), 0.0..y_top)
        .map_err(chart_err)?;

    let x_label = |x: &SegmentValue<usize>| match x {
        SegmentValue::CenterOf(i) => bars.get(*i).map(|b| b.0.clone()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_desc)
        .x_label_formatter(&x_label)
        .label_style((FONT_FAMILY, 16))
        .draw()
        .map_err(chart_err)?;

    let measured = || {
        bars.iter()
            .enumerate()
            .filter(|(_, (_, v))| v.is_finite())
    };

    chart
        .draw_series(measured().map(|(i, (_, v))| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                Palette99::pick(i).filled(),
            );
            bar.set_margin(0, 0, 30, 30);
            bar
        }))
        .map_err(chart_err)?;

    chart
        .draw_series(measured().map(|(i, (_, v))| {
            Text::new(
                format!("{:.2}", v),
                (SegmentValue::CenterOf(i), *v),
                (FONT_FAMILY, 16).into_font(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!("Wrote chart {}", path.display());
    Ok(())
}

/// One line per labeled series of `(x, y)` points.
pub fn line_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(String, Vec<(f64, f64)>)],
    size: (u32, u32),
) -> ReportResult<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let points = || series.iter().flat_map(|(_, pts)| pts.iter());
    let x_max = points().map(|p| p.0).fold(0.0, f64::max);
    let y_max = points().map(|p| p.1).fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(
            0.0..x_max.max(1.0),
            0.0..if y_max > 0.0 { y_max * 1.1 } else { 1.0 },
        )
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style((FONT_FAMILY, 16))
        .draw()
        .map_err(chart_err)?;

    for (i, (label, pts)) in series.iter().enumerate() {
        let color = Palette99::pick(i);
        chart
            .draw_series(LineSeries::new(
                pts.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(chart_err)?
            .label(label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(i).stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .label_font((FONT_FAMILY, 16))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!("Wrote chart {}", path.display());
    Ok(())
}
