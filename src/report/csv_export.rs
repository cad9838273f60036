use crate::aggregator::{RunSeries, RunSummary, SecondRow};
use crate::error::ReportError::InvalidCsv;
use crate::error::ReportResult;
use crate::percentile::{PercentileLevel, Percentiles};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};
use strum::IntoEnumIterator;

pub const SECOND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SERIES_HEADER: &str = "second,rps,p50_ms,p90_ms,p95_ms,p99_ms";
pub const SUMMARY_HEADER: &str =
    "label,avg_rps,p50_ms,p90_ms,p95_ms,p99_ms,avg_ms,max_ms,error_rate";

/// One run's time series, one row per second.
pub fn series_csv(series: &RunSeries) -> String {
    let mut out = String::new();
    out.push_str(SERIES_HEADER);
    out.push('\n');
    for row in &series.rows {
        out.push_str(&format!(
            "{},{},{}\n",
            row.second.format(SECOND_FORMAT),
            row.rps,
            latency_cells(&row.latency)
        ));
    }
    out
}

/// All runs side by side, outer-joined on the second.
///
/// Runs without a row for a second leave that second's cells empty.
pub fn merged_csv(series: &[&RunSeries]) -> String {
    let mut out = String::from("second");
    for s in series {
        out.push(',');
        out.push_str(&csv_escape(&format!("{}_rps", s.label)));
        for level in PercentileLevel::iter() {
            out.push(',');
            out.push_str(&csv_escape(&format!("{}_{}_ms", s.label, level)));
        }
    }
    out.push('\n');

    let by_second: Vec<BTreeMap<NaiveDateTime, &SecondRow>> = series
        .iter()
        .map(|s| s.rows.iter().map(|r| (r.second, r)).collect())
        .collect();
    let seconds: BTreeSet<NaiveDateTime> = by_second
        .iter()
        .flat_map(|rows| rows.keys().copied())
        .collect();

    for second in seconds {
        out.push_str(&second.format(SECOND_FORMAT).to_string());
        for rows in &by_second {
            match rows.get(&second) {
                Some(row) => {
                    out.push_str(&format!(",{},{}", row.rps, latency_cells(&row.latency)))
                }
                None => out.push_str(",,,,,"),
            }
        }
        out.push('\n');
    }
    out
}

/// Whole-run statistics, one row per run.
pub fn summary_csv(summaries: &[RunSummary]) -> String {
    let mut out = String::new();
    out.push_str(SUMMARY_HEADER);
    out.push('\n');
    for s in summaries {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_escape(&s.label),
            number_cell(s.avg_rps),
            latency_cells(&s.latency),
            number_cell(s.avg_ms),
            number_cell(s.max_ms),
            s.error_rate.map(number_cell).unwrap_or_default()
        ));
    }
    out
}

/// Parse a file written by [`series_csv`] back into a series.
pub fn read_series_csv(
    label: &str,
    text: &str,
) -> ReportResult<RunSeries> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    match lines.next() {
        Some(header) if header.trim() == SERIES_HEADER => {}
        Some(header) => return Err(InvalidCsv(format!("unexpected header: {}", header))),
        None => return Err(InvalidCsv("empty file".to_string())),
    }

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let [second, rps, p50, p90, p95, p99] = cells.as_slice() else {
            return Err(InvalidCsv(format!(
                "row {} has {} cells, expected 6",
                idx + 1,
                cells.len()
            )));
        };
        let second = NaiveDateTime::parse_from_str(second, SECOND_FORMAT)
            .map_err(|e| InvalidCsv(format!("row {}: {}: {}", idx + 1, second, e)))?;
        let rps = rps
            .parse::<u64>()
            .map_err(|e| InvalidCsv(format!("row {}: {}: {}", idx + 1, rps, e)))?;
        let latency = Percentiles {
            p50: parse_cell(p50, idx)?,
            p90: parse_cell(p90, idx)?,
            p95: parse_cell(p95, idx)?,
            p99: parse_cell(p99, idx)?,
        };
        rows.push(SecondRow {
            second,
            rps,
            latency,
        });
    }

    Ok(RunSeries {
        label: label.to_string(),
        rows,
    })
}

fn parse_cell(
    cell: &str,
    idx: usize,
) -> ReportResult<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| InvalidCsv(format!("row {}: {}: {}", idx + 1, cell, e)))
}

fn latency_cells(p: &Percentiles) -> String {
    PercentileLevel::iter()
        .map(|level| number_cell(p.get(level)))
        .collect::<Vec<_>>()
        .join(",")
}

/// NaN is written as an empty cell.
fn number_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{}", v)
    }
}

/// Wrap a field value in quotes and escape any embedded quotes.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
