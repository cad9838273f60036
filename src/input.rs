use crate::aggregator::{aggregate, RunReport, RunSummary};
use crate::error::ReportResult;
use crate::stream_reader::read_stream;
use crate::summary_reader::{read_summary_file, SummaryDocument};
use clap::ValueEnum;
use std::path::Path;
use strum_macros::Display;
use tracing::{info, warn};

/// Shape of an input artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum InputFormat {
    /// decide from the content
    Auto,
    /// k6 `--out json` log, one point per line
    Stream,
    /// k6 end-of-test summary document
    Summary,
}

/// Load and aggregate one labeled run.
///
/// `Auto` decodes the whole artifact as a summary document first; a streaming
/// log never decodes as a single object with a `metrics` map, so anything that
/// fails that decode is read as a stream.
/// `Stream` artifacts must be readable. Under `Auto` or `Summary` an artifact
/// that cannot be read degrades to a zero summary so other runs still compare.
pub async fn load_run(
    path: &Path,
    label: &str,
    format: InputFormat,
) -> ReportResult<RunReport> {
    match format {
        InputFormat::Auto => {
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Failed reading {}: {}, using zeros for {}", path.display(), e, label);
                    return Ok(RunReport {
                        summary: RunSummary::zero(label),
                        series: None,
                    });
                }
            };
            match serde_json::from_slice::<SummaryDocument>(&bytes) {
                Ok(doc) => {
                    info!("{} detected as summary input", path.display());
                    Ok(RunReport {
                        summary: doc.to_summary(label),
                        series: None,
                    })
                }
                Err(_) => {
                    info!("{} detected as stream input", path.display());
                    load_stream_text(bytes.as_slice(), label).await
                }
            }
        }
        InputFormat::Summary => Ok(RunReport {
            summary: read_summary_file(path, label).await,
            series: None,
        }),
        InputFormat::Stream => {
            let file = tokio::fs::File::open(path).await?;
            load_stream_text(tokio::io::BufReader::new(file), label).await
        }
    }
}

async fn load_stream_text<R>(
    reader: R,
    label: &str,
) -> ReportResult<RunReport>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let (buckets, stats) = read_stream(reader).await?;
    info!(
        "{}: {} points recorded, {} lines dropped",
        label,
        stats.recorded,
        stats.dropped()
    );
    Ok(aggregate(label, &buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_stream_with_metrics_word_is_still_a_stream() {
        let mut stream = NamedTempFile::new().unwrap();
        writeln!(
            stream,
            r#"{{"type":"Metric","data":{{"name":"metrics"}},"metric":"http_reqs"}}"#
        )
        .unwrap();
        writeln!(
            stream,
            r#"{{"type":"Point","metric":"http_req_duration","data":{{"time":"2025-01-01T00:00:00Z","value":5}}}}"#
        )
        .unwrap();
        let report = load_run(stream.path(), "s", InputFormat::Auto).await.unwrap();
        let series = report.series.unwrap();
        assert_eq!(series.rows.len(), 1);
        assert_eq!(series.rows[0].latency.p50, 5.0);
    }

    #[tokio::test]
    async fn test_load_run_auto() {
        let mut stream = NamedTempFile::new().unwrap();
        writeln!(
            stream,
            r#"{{"type":"Point","metric":"http_reqs","data":{{"time":"2025-01-01T00:00:00Z","value":1}}}}"#
        )
        .unwrap();
        let report = load_run(stream.path(), "s", InputFormat::Auto).await.unwrap();
        assert!(report.series.is_some());
        assert_eq!(report.summary.avg_rps, 1.0);

        let mut summary = NamedTempFile::new().unwrap();
        write!(summary, r#"{{"metrics":{{"http_reqs":{{"rate":7}}}}}}"#).unwrap();
        let report = load_run(summary.path(), "m", InputFormat::Auto).await.unwrap();
        assert!(report.series.is_none());
        assert_eq!(report.summary.avg_rps, 7.0);
    }

    #[tokio::test]
    async fn test_missing_stream_is_an_error() {
        let missing = Path::new("/definitely/not/here.ndjson");
        assert!(load_run(missing, "x", InputFormat::Stream).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_artifact_degrades_to_zero_summary() {
        let missing = Path::new("/definitely/not/here.json");
        for format in [InputFormat::Auto, InputFormat::Summary] {
            let report = load_run(missing, "x", format).await.unwrap();
            assert!(report.series.is_none());
            assert_eq!(report.summary.label, "x");
            assert_eq!(report.summary.avg_rps, 0.0);
            assert_eq!(report.summary.latency.p99, 0.0);
        }
    }
}
