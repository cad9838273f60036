use crate::error::ReportResult;
use std::path::Path;
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub async fn create_directory_if_not_exists(dir_path: &Path) -> ReportResult<()> {
    if fs::metadata(dir_path).await.is_err() {
        info!("Creating directory: {}", dir_path.display());
        fs::create_dir_all(dir_path).await?;
    }
    Ok(())
}

pub async fn write_to_file(
    file_path: &Path,
    content: &str,
) -> ReportResult<()> {
    let mut file = File::create(file_path).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// A label made safe to embed in a file name.
pub fn file_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "run".to_string()
    } else {
        cleaned
    }
}

/// Default label for an input: its file stem.
pub fn label_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_number(num: u64) -> String {
    let mut s = String::new();
    let num_str = num.to_string();
    let a = num_str.chars().rev().enumerate();
    for (i, c) in a {
        if i != 0 && i % 3 == 0 {
            s.insert(0, ',');
        }
        s.insert(0, c);
    }
    s
}

/// Milliseconds for display, `-` when there is no measurement.
pub fn format_ms(ms: f64) -> String {
    if ms.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}ms", ms)
    }
}
