use crate::aggregator::RunSummary;
use crate::event::{float_value, Metric};
use crate::percentile::{PercentileLevel, Percentiles};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use strum::IntoEnumIterator;
use tracing::warn;

/// A k6 end-of-test summary, either `--summary-export` output or the JSON
/// written from a `handleSummary` hook.
#[derive(Debug, Deserialize)]
pub struct SummaryDocument {
    pub metrics: Map<String, Value>,
}

impl SummaryDocument {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Stats of one metric. `handleSummary` nests them under `values`.
    fn stats(
        &self,
        metric: Metric,
    ) -> Option<&Map<String, Value>> {
        let obj = self.metrics.get(&metric.to_string())?.as_object()?;
        match obj.get("values").and_then(Value::as_object) {
            Some(values) => Some(values),
            None => Some(obj),
        }
    }

    pub fn to_summary(
        &self,
        label: &str,
    ) -> RunSummary {
        let reqs = self.stats(Metric::HttpReqs);
        let durations = self.stats(Metric::HttpReqDuration);

        let avg_rps = reqs.and_then(|s| field(s, "rate")).unwrap_or(0.0);

        let mut latency = Percentiles::zero();
        if let Some(durations) = durations {
            for level in PercentileLevel::iter() {
                latency.set(level, duration_percentile(durations, level).unwrap_or(0.0));
            }
        }

        let error_rate = self
            .stats(Metric::HttpReqFailed)
            .and_then(|s| field(s, "rate").or_else(|| field(s, "value")));

        RunSummary {
            label: label.to_string(),
            avg_rps,
            latency,
            avg_ms: durations.and_then(|s| field(s, "avg")).unwrap_or(0.0),
            max_ms: durations.and_then(|s| field(s, "max")).unwrap_or(0.0),
            error_rate,
        }
    }
}

fn field(
    stats: &Map<String, Value>,
    key: &str,
) -> Option<f64> {
    stats.get(key).and_then(float_value)
}

/// Flat `p(95)` first, then the nested `percentiles` object.
/// The median falls back to `med`, which k6 reports by default.
fn duration_percentile(
    stats: &Map<String, Value>,
    level: PercentileLevel,
) -> Option<f64> {
    let key = level.k6_key();
    field(stats, &key)
        .or_else(|| {
            stats
                .get("percentiles")
                .and_then(Value::as_object)
                .and_then(|nested| field(nested, &key))
        })
        .or_else(|| match level {
            PercentileLevel::P50 => field(stats, "med"),
            _ => None,
        })
}

/// Read a summary artifact. An unreadable or undecodable file yields an
/// all-zero summary so the remaining runs can still be compared.
pub async fn read_summary_file<P>(
    path: P,
    label: &str,
) -> RunSummary
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed reading {}: {}, using zeros for {}", path.display(), e, label);
            return RunSummary::zero(label);
        }
    };
    match SummaryDocument::parse(&text) {
        Ok(doc) => doc.to_summary(label),
        Err(e) => {
            warn!("Failed parsing {}: {}, using zeros for {}", path.display(), e, label);
            RunSummary::zero(label)
        }
    }
}
