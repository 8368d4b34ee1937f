//! Portfolio PDF rendering.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::NaiveDate;

use super::client::ApiClient;
use super::error::ApiResult;
use super::request::ApiRequest;

/// Setting that names the template used for PDF export.
pub const PDF_TEMPLATE_SETTING: &str = "DEFAULT_PDF_TEMPLATE";

/// Renders the portfolio with `template` and returns the PDF bytes.
pub async fn download_pdf(client: &ApiClient, template: &str) -> ApiResult<Bytes> {
    let request = ApiRequest::get("/portfolio/pdf")
        .public()
        .query("template", template);
    client.bytes(&request).await
}

/// `<FullNameWithoutWhitespace>-Resume-YYYY-MM-DD.pdf`, or `Portfolio-...`
/// when no name is known.
pub fn pdf_file_name(full_name: Option<&str>, date: NaiveDate) -> String {
    let name: String = full_name
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let name = if name.is_empty() { "Portfolio" } else { &name };
    format!("{name}-Resume-{}.pdf", date.format("%Y-%m-%d"))
}

pub fn write_pdf(dir: &Path, pdf: &[u8], full_name: Option<&str>, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let path = dir.join(pdf_file_name(full_name, date));
    fs::write(&path, pdf).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
