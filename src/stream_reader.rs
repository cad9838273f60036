use crate::bucket::SecondBuckets;
use crate::error::ReportResult;
use crate::event::{K6Line, Metric, RawEvent};
use crate::timestamp::normalize;
use futures::stream::Stream;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing::{debug, trace};

/// What happened to the lines of one streaming log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: u64,
    pub recorded: u64,
    pub malformed: u64,
    pub not_points: u64,
    pub missing_fields: u64,
    pub other_metrics: u64,
    pub bad_timestamps: u64,
    pub bad_values: u64,
}

impl ReadStats {
    pub fn dropped(&self) -> u64 {
        self.malformed
            + self.not_points
            + self.missing_fields
            + self.other_metrics
            + self.bad_timestamps
            + self.bad_values
    }
}

/// Non-blank lines of a reader, as raw bytes so invalid UTF-8 only costs its line.
pub fn non_blank_lines<R>(reader: R) -> impl Stream<Item = Result<Vec<u8>, io::Error>>
where
    R: AsyncBufRead + Unpin,
{
    tokio_stream::wrappers::SplitStream::new(reader.split(b'\n')).filter(|res| match res {
        Ok(line) => !line.iter().all(u8::is_ascii_whitespace),
        Err(_) => true,
    })
}

/// Classify one log line into an event, or `None` when it is skipped.
pub fn parse_line(
    line: &[u8],
    stats: &mut ReadStats,
) -> Option<RawEvent> {
    let record: K6Line = match serde_json::from_slice(line) {
        Ok(record) => record,
        Err(e) => {
            trace!("dropping malformed line: {}", e);
            stats.malformed += 1;
            return None;
        }
    };

    if !record.is_point() {
        stats.not_points += 1;
        return None;
    }

    let (Some(metric_name), Some(data)) = (record.metric, record.data) else {
        stats.missing_fields += 1;
        return None;
    };
    let (Some(time), Some(value)) = (data.time, data.value) else {
        stats.missing_fields += 1;
        return None;
    };

    let Ok(metric) = Metric::from_str(&metric_name) else {
        stats.other_metrics += 1;
        return None;
    };

    match normalize(&time) {
        Ok(second) => Some(RawEvent {
            second,
            metric,
            value,
        }),
        Err(e) => {
            trace!("dropping point with bad timestamp: {}", e);
            stats.bad_timestamps += 1;
            None
        }
    }
}

/// Consume a whole k6 json log into per-second buckets.
pub async fn read_stream<R>(reader: R) -> ReportResult<(SecondBuckets, ReadStats)>
where
    R: AsyncBufRead + Unpin,
{
    let mut buckets = SecondBuckets::new();
    let mut stats = ReadStats::default();

    let mut lines = Box::pin(non_blank_lines(reader));
    while let Some(line) = lines.next().await {
        let line = line?;
        stats.lines += 1;
        if let Some(event) = parse_line(&line, &mut stats) {
            if buckets.record(&event) {
                stats.recorded += 1;
            } else {
                stats.bad_values += 1;
            }
        }
    }

    debug!(
        "read {} lines, recorded {}, dropped {}",
        stats.lines,
        stats.recorded,
        stats.dropped()
    );
    Ok((buckets, stats))
}

pub async fn read_stream_file<P>(path: P) -> ReportResult<(SecondBuckets, ReadStats)>
where
    P: AsRef<Path>,
{
    let file = File::open(path).await?;
    read_stream(BufReader::new(file)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;

    const REQ: &str = r#"{"type":"Point","metric":"http_reqs","data":{"time":"2025-01-01T00:00:00.000000Z","value":1}}"#;
    const DUR: &str = r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2025-01-01T00:00:00.100000Z","value":42.0}}"#;

    #[tokio::test]
    async fn test_two_records_make_one_row() {
        let input = format!("{}\n{}\n", REQ, DUR);
        let (buckets, stats) = read_stream(input.as_bytes()).await.unwrap();
        assert_eq!(stats.recorded, 2);

        let report = aggregate("run", &buckets);
        let rows = report.series.unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].second.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2025-01-01T00:00:00"
        );
        assert_eq!(rows[0].rps, 1);
        assert_eq!(rows[0].latency.p50, 42.0);
        assert_eq!(rows[0].latency.p90, 42.0);
        assert_eq!(rows[0].latency.p95, 42.0);
        assert_eq!(rows[0].latency.p99, 42.0);
    }

    #[tokio::test]
    async fn test_noise_lines_do_not_change_output() {
        let clean = format!("{}\n{}\n", REQ, DUR);
        let noisy = format!("\n{}\n   \nthis is not json\n{}\n{{broken\n", REQ, DUR);

        let (clean_buckets, _) = read_stream(clean.as_bytes()).await.unwrap();
        let (noisy_buckets, stats) = read_stream(noisy.as_bytes()).await.unwrap();

        assert_eq!(clean_buckets.counts, noisy_buckets.counts);
        assert_eq!(clean_buckets.durations, noisy_buckets.durations);
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.malformed, 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_dropped() {
        let mut input = Vec::new();
        input.extend_from_slice(REQ.as_bytes());
        input.extend_from_slice(b"\n\xff\xfe garbage\r\n");
        input.extend_from_slice(DUR.as_bytes());

        let (buckets, stats) = read_stream(input.as_slice()).await.unwrap();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.recorded, 2);
        assert_eq!(buckets.counts.len(), 1);
    }

    #[tokio::test]
    async fn test_skipped_records() {
        let input = [
            r#"{"type":"Metric","data":{"name":"http_reqs","type":"counter"},"metric":"http_reqs"}"#,
            r#"{"type":"Point","metric":"vus","data":{"time":"2025-01-01T00:00:00Z","value":10}}"#,
            r#"{"type":"Point","metric":"http_reqs","data":{"value":1}}"#,
            r#"{"type":"Point","metric":"http_reqs","data":{"time":"2025-01-01T00:00:00Z"}}"#,
            r#"{"type":"Point","data":{"time":"2025-01-01T00:00:00Z","value":1}}"#,
            r#"{"type":"Point","metric":"http_reqs","data":{"time":"yesterday","value":1}}"#,
            r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2025-01-01T00:00:00Z","value":"fast"}}"#,
        ]
        .join("\n");

        let (buckets, stats) = read_stream(input.as_bytes()).await.unwrap();
        assert!(buckets.is_empty());
        assert_eq!(stats.not_points, 1);
        assert_eq!(stats.other_metrics, 1);
        assert_eq!(stats.missing_fields, 3);
        assert_eq!(stats.bad_timestamps, 1);
        assert_eq!(stats.bad_values, 1);
        assert_eq!(stats.dropped(), 7);
    }

    #[tokio::test]
    async fn test_float_counts_truncate() {
        let input = [
            r#"{"type":"Point","metric":"http_reqs","data":{"time":"2025-01-01 00:00:00","value":1.6}}"#,
            r#"{"type":"Point","metric":"http_reqs","data":{"time":"2025-01-01 00:00:00","value":"2.5"}}"#,
        ]
        .join("\n");
        let (buckets, _) = read_stream(input.as_bytes()).await.unwrap();
        // 1.6 -> 1, "2.5" -> 2
        assert_eq!(buckets.counts.values().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn test_failed_requests_tracked() {
        let input = [
            r#"{"type":"Point","metric":"http_req_failed","data":{"time":"2025-01-01T00:00:00Z","value":0}}"#,
            r#"{"type":"Point","metric":"http_req_failed","data":{"time":"2025-01-01T00:00:00Z","value":1}}"#,
        ]
        .join("\n");
        let (buckets, _) = read_stream(input.as_bytes()).await.unwrap();
        assert_eq!(buckets.error_rate(), Some(0.5));
        assert!(aggregate("a", &buckets).series.unwrap().rows.is_empty());
    }
}
