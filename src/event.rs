use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use strum_macros::{Display, EnumString};

/// The k6 metrics this tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Metric {
    #[strum(serialize = "http_reqs")]
    HttpReqs,
    #[strum(serialize = "http_req_duration")]
    HttpReqDuration,
    #[strum(serialize = "http_req_failed")]
    HttpReqFailed,
}

/// One line of the k6 `--out json` log.
///
/// Only `type == "Point"` lines carry samples, `Metric` lines describe metrics
/// and are ignored.
#[derive(Debug, Deserialize)]
pub struct K6Line {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub metric: Option<String>,
    pub data: Option<PointData>,
}

#[derive(Debug, Deserialize)]
pub struct PointData {
    pub time: Option<String>,
    pub value: Option<Value>,
}

impl K6Line {
    pub fn is_point(&self) -> bool {
        self.kind.as_deref() == Some("Point")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub second: NaiveDateTime,
    pub metric: Metric,
    pub value: Value,
}

/// Coerce a request-count value to an integer.
///
/// Integers are taken as-is and numeric floats are truncated.
/// Numeric strings that are not integers fall back to round half to even.
pub fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(|v| whole_count(v.trunc()))),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .and_then(|v| whole_count(v.round_ties_even()))
            })
        }
        _ => None,
    }
}

fn whole_count(v: f64) -> Option<u64> {
    if v.is_finite() && v >= 0.0 && v <= u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

/// Coerce a duration (or rate) sample to a float.
pub fn float_value(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}
