use crate::event::{count_value, float_value, Metric, RawEvent};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Per-second accumulators for one run.
///
/// Keys are whole-second instants, so iteration is in time order.
#[derive(Debug, Default, Clone)]
pub struct SecondBuckets {
    pub counts: BTreeMap<NaiveDateTime, u64>,
    pub durations: BTreeMap<NaiveDateTime, Vec<f64>>,
    pub failed_sum: f64,
    pub failed_points: u64,
}

impl SecondBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one event into its bucket. Returns false when the value could
    /// not be coerced and the event was dropped.
    pub fn record(
        &mut self,
        event: &RawEvent,
    ) -> bool {
        match event.metric {
            Metric::HttpReqs => match count_value(&event.value) {
                Some(count) => {
                    self.add_count(event.second, count);
                    true
                }
                None => false,
            },
            Metric::HttpReqDuration => match float_value(&event.value) {
                Some(ms) => {
                    self.add_duration(event.second, ms);
                    true
                }
                None => false,
            },
            Metric::HttpReqFailed => match float_value(&event.value) {
                Some(v) => {
                    self.failed_sum += v;
                    self.failed_points += 1;
                    true
                }
                None => false,
            },
        }
    }

    pub fn add_count(
        &mut self,
        second: NaiveDateTime,
        count: u64,
    ) {
        *self.counts.entry(second).or_insert(0) += count;
    }

    pub fn add_duration(
        &mut self,
        second: NaiveDateTime,
        ms: f64,
    ) {
        self.durations.entry(second).or_default().push(ms);
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty() && self.durations.is_empty()
    }

    pub fn error_rate(&self) -> Option<f64> {
        if self.failed_points == 0 {
            None
        } else {
            Some(self.failed_sum / self.failed_points as f64)
        }
    }
}
