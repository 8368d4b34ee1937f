//! Portfolio backup download and restore.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiResult;
use super::request::{ApiRequest, MultipartForm};
use super::response::Payload;

/// Multipart field the ingest endpoint reads the file from.
const INGEST_FIELD: &str = "file";

/// Fetches the full portfolio backup document.
pub async fn download(client: &ApiClient) -> ApiResult<Value> {
    client
        .send(&ApiRequest::get("/admin/backup"))
        .await
        .map(Payload::into_value)
}

/// Uploads a backup file to restore the portfolio.
pub async fn ingest(client: &ApiClient, file_name: &str, contents: Vec<u8>) -> ApiResult<Value> {
    let form = MultipartForm::new().file(
        INGEST_FIELD,
        file_name,
        Some("application/json"),
        contents,
    );
    client
        .send(&ApiRequest::post("/admin/ingest").multipart(form))
        .await
        .map(Payload::into_value)
}

/// `portfolio-backup-YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("portfolio-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Writes the backup as pretty JSON into `dir` and returns the file path.
pub fn write_backup(dir: &Path, backup: &Value, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let path = dir.join(backup_file_name(date));
    let json = serde_json::to_string_pretty(backup).context("Failed to serialize backup")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_backup_written_as_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let path = write_backup(dir.path(), &json!({"projects": []}), date).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "portfolio-backup-2025-03-09.json"
        );
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"projects\": []\n}");
    }
}
