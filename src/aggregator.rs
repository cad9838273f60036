use crate::bucket::SecondBuckets;
use crate::percentile::Percentiles;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// One row of a run's time series.
#[derive(Debug, Clone)]
pub struct SecondRow {
    pub second: NaiveDateTime,
    pub rps: u64,
    pub latency: Percentiles,
}

/// Whole-run statistics for one labeled run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub label: String,
    pub avg_rps: f64,
    pub latency: Percentiles,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub error_rate: Option<f64>,
}

impl RunSummary {
    /// Stand-in for a run whose artifact could not be read.
    pub fn zero(label: &str) -> Self {
        Self {
            label: label.to_string(),
            avg_rps: 0.0,
            latency: Percentiles::zero(),
            avg_ms: 0.0,
            max_ms: 0.0,
            error_rate: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSeries {
    pub label: String,
    pub rows: Vec<SecondRow>,
}

impl RunSeries {
    pub fn first_second(&self) -> Option<NaiveDateTime> {
        self.rows.first().map(|r| r.second)
    }

    /// `(seconds since the first row, value)` pairs, skipping NaN values.
    pub fn elapsed_points(
        &self,
        value: impl Fn(&SecondRow) -> f64,
    ) -> Vec<(f64, f64)> {
        let Some(start) = self.first_second() else {
            return vec![];
        };
        self.rows
            .iter()
            .map(|r| ((r.second - start).num_seconds() as f64, value(r)))
            .filter(|(_, v)| !v.is_nan())
            .collect()
    }
}

/// A run either as a full time series or as a pre-aggregated summary only.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub series: Option<RunSeries>,
}

/// Reduce completed buckets into ordered rows and the whole-run summary.
///
/// Rows cover the union of seconds seen by either metric, no gaps are filled.
/// Whole-run percentiles are taken over every duration sample of the run,
/// never over the per-second percentiles.
pub fn aggregate(
    label: &str,
    buckets: &SecondBuckets,
) -> RunReport {
    let seconds: BTreeSet<NaiveDateTime> = buckets
        .counts
        .keys()
        .chain(buckets.durations.keys())
        .copied()
        .collect();

    let mut rows = Vec::with_capacity(seconds.len());
    let mut all_samples = Vec::new();
    let mut total_requests: u64 = 0;

    for second in seconds {
        let rps = buckets.counts.get(&second).copied().unwrap_or(0);
        total_requests += rps;

        let latency = match buckets.durations.get(&second) {
            Some(samples) => {
                all_samples.extend_from_slice(samples);
                Percentiles::from_samples(&mut samples.clone())
            }
            None => Percentiles::missing(),
        };

        rows.push(SecondRow {
            second,
            rps,
            latency,
        });
    }

    let avg_rps = if rows.is_empty() {
        0.0
    } else {
        total_requests as f64 / rows.len() as f64
    };

    let (avg_ms, max_ms) = if all_samples.is_empty() {
        (f64::NAN, f64::NAN)
    } else {
        let sum: f64 = all_samples.iter().sum();
        let max = all_samples.iter().copied().fold(f64::MIN, f64::max);
        (sum / all_samples.len() as f64, max)
    };

    let summary = RunSummary {
        label: label.to_string(),
        avg_rps,
        latency: Percentiles::from_samples(&mut all_samples),
        avg_ms,
        max_ms,
        error_rate: buckets.error_rate(),
    };

    RunReport {
        summary,
        series: Some(RunSeries {
            label: label.to_string(),
            rows,
        }),
    }
}
