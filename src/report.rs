pub mod charts;
pub mod csv_export;

use crate::aggregator::{RunReport, RunSeries, RunSummary};
use crate::error::ReportResult;
use crate::percentile::PercentileLevel;
use crate::utils::{
    create_directory_if_not_exists, file_label, format_ms, format_number, write_to_file,
};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::{info, warn};

pub const MERGED_CSV: &str = "merged_timeseries.csv";
pub const SUMMARY_CSV: &str = "summary.csv";
pub const AVG_RPS_CHART: &str = "avg_rps.png";
pub const RPS_OVER_TIME_CHART: &str = "rps_over_time.png";
pub const P95_OVER_TIME_CHART: &str = "p95_over_time.png";

const ELAPSED_DESC: &str = "elapsed seconds";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    /// false when no font could be loaded, CSVs are still written
    pub charts: bool,
}

impl ReportOptions {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn path(
        &self,
        file: &str,
    ) -> PathBuf {
        self.out_dir.join(file)
    }
}

pub fn series_file_name(label: &str) -> String {
    format!("{}_timeseries.csv", file_label(label))
}

pub fn percentile_chart_name(level: PercentileLevel) -> String {
    format!("{}.png", level)
}

/// Write every export and chart of a multi-run comparison.
///
/// Time-series outputs only cover runs read from a streaming log.
pub async fn write_comparison(
    opts: &ReportOptions,
    reports: &[RunReport],
) -> ReportResult<Vec<PathBuf>> {
    create_directory_if_not_exists(&opts.out_dir).await?;
    let mut written = Vec::new();

    let series: Vec<&RunSeries> = reports.iter().filter_map(|r| r.series.as_ref()).collect();
    for s in &series {
        written.push(write_series(opts, s).await?);
    }
    if !series.is_empty() {
        let path = opts.path(MERGED_CSV);
        write_to_file(&path, &csv_export::merged_csv(&series)).await?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    let summaries: Vec<RunSummary> = reports.iter().map(|r| r.summary.clone()).collect();
    let path = opts.path(SUMMARY_CSV);
    write_to_file(&path, &csv_export::summary_csv(&summaries)).await?;
    info!("Wrote {}", path.display());
    written.push(path);

    if opts.charts {
        written.extend(summary_charts(opts, &summaries)?);
        if !series.is_empty() {
            written.extend(over_time_charts(opts, &series)?);
        }
    } else {
        warn!("Skipping charts, no font available");
    }

    Ok(written)
}

/// Exports of the single-run report: its time series and the over-time charts.
pub async fn write_single(
    opts: &ReportOptions,
    series: &RunSeries,
) -> ReportResult<Vec<PathBuf>> {
    create_directory_if_not_exists(&opts.out_dir).await?;
    let mut written = vec![write_series(opts, series).await?];
    if opts.charts {
        written.extend(over_time_charts(opts, &[series])?);
    } else {
        warn!("Skipping charts, no font available");
    }
    Ok(written)
}

async fn write_series(
    opts: &ReportOptions,
    series: &RunSeries,
) -> ReportResult<PathBuf> {
    let path = opts.path(&series_file_name(&series.label));
    write_to_file(&path, &csv_export::series_csv(series)).await?;
    info!("Wrote {} ({} rows)", path.display(), series.rows.len());
    Ok(path)
}

fn summary_charts(
    opts: &ReportOptions,
    summaries: &[RunSummary],
) -> ReportResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    let bars: Vec<(String, f64)> = summaries
        .iter()
        .map(|s| (s.label.clone(), s.avg_rps))
        .collect();
    let path = opts.path(AVG_RPS_CHART);
    charts::bar_chart(&path, "Average throughput", "requests / second", &bars, opts.size())?;
    written.push(path);

    for level in PercentileLevel::iter() {
        let bars: Vec<(String, f64)> = summaries
            .iter()
            .map(|s| (s.label.clone(), s.latency.get(level)))
            .collect();
        let path = opts.path(&percentile_chart_name(level));
        let title = format!("{} latency", level.to_string().to_uppercase());
        charts::bar_chart(&path, &title, "milliseconds", &bars, opts.size())?;
        written.push(path);
    }

    Ok(written)
}

fn over_time_charts(
    opts: &ReportOptions,
    series: &[&RunSeries],
) -> ReportResult<Vec<PathBuf>> {
    let rps: Vec<(String, Vec<(f64, f64)>)> = series
        .iter()
        .map(|s| (s.label.clone(), s.elapsed_points(|r| r.rps as f64)))
        .collect();
    let rps_path = opts.path(RPS_OVER_TIME_CHART);
    charts::line_chart(
        &rps_path,
        "Throughput over time",
        ELAPSED_DESC,
        "requests / second",
        &rps,
        opts.size(),
    )?;

    let p95: Vec<(String, Vec<(f64, f64)>)> = series
        .iter()
        .map(|s| (s.label.clone(), s.elapsed_points(|r| r.latency.p95)))
        .collect();
    let p95_path = opts.path(P95_OVER_TIME_CHART);
    charts::line_chart(
        &p95_path,
        "P95 latency over time",
        ELAPSED_DESC,
        "milliseconds",
        &p95,
        opts.size(),
    )?;

    Ok(vec![rps_path, p95_path])
}

/// Plain-text table of a run for the terminal.
pub fn format_table(
    series: &RunSeries,
    summary: &RunSummary,
) -> String {
    if series.rows.is_empty() {
        return format!("{}: no points parsed\n", summary.label);
    }
    let mut out = format!(
        "{:<20} {:>8} {:>12} {:>12} {:>12} {:>12}\n",
        "second", "rps", "p50", "p90", "p95", "p99"
    );
    for row in &series.rows {
        out.push_str(&format!(
            "{:<20} {:>8} {:>12} {:>12} {:>12} {:>12}\n",
            row.second.format(csv_export::SECOND_FORMAT).to_string(),
            format_number(row.rps),
            format_ms(row.latency.p50),
            format_ms(row.latency.p90),
            format_ms(row.latency.p95),
            format_ms(row.latency.p99),
        ));
    }
    out.push_str(&format!(
        "\n{}: {} seconds, avg {:.2} req/s, p50 {}, p90 {}, p95 {}, p99 {}\n",
        summary.label,
        series.rows.len(),
        summary.avg_rps,
        format_ms(summary.latency.p50),
        format_ms(summary.latency.p90),
        format_ms(summary.latency.p95),
        format_ms(summary.latency.p99),
    ));
    if let Some(rate) = summary.error_rate {
        out.push_str(&format!("failed requests: {:.2}%\n", rate * 100.0));
    }
    out
}
