pub type ReportResult<T> = Result<T, ReportError>;
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Invalid csv: {0}")]
    InvalidCsv(String),
    #[error("Chart error: {0}")]
    ChartError(String),
    #[error("Usage error: {0}")]
    UsageError(String),
}
