//! Backup and PDF export.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use fmf_core::api::{backup, portfolio};
use fmf_core::services::Services;
use serde_json::Value;

use super::{print_json, require_session};

pub async fn download(services: &Services, out: &Path) -> Result<()> {
    require_session(services).await?;
    let document = backup::download(&services.client)
        .await
        .context("download backup")?;
    let path = backup::write_backup(out, &document, Local::now().date_naive())?;
    println!("Saved backup to {}", path.display());
    Ok(())
}

pub async fn ingest(services: &Services, file: &Path) -> Result<()> {
    let contents = fs::read(file).with_context(|| format!("read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map_or_else(|| "backup.json".into(), |n| n.to_string_lossy());

    require_session(services).await?;
    let result = backup::ingest(&services.client, &file_name, contents)
        .await
        .context("restore backup")?;
    if result.is_null() {
        println!("Backup restored.");
        Ok(())
    } else {
        print_json(&result)
    }
}

/// Renders the portfolio with the configured template.
pub async fn pdf(services: &Services, out: &Path) -> Result<()> {
    services.settings.fetch_settings().await;
    let template = services
        .settings
        .value(portfolio::PDF_TEMPLATE_SETTING)
        .filter(|t| !t.trim().is_empty())
        .with_context(|| {
            format!(
                "No PDF template configured ({} is not set)",
                portfolio::PDF_TEMPLATE_SETTING
            )
        })?;

    let full_name = match services.public.profile().await {
        Ok(profile) => full_name(&profile),
        Err(err) => {
            tracing::warn!("Failed to fetch profile for file name: {err}");
            None
        }
    };

    let pdf = portfolio::download_pdf(&services.client, &template)
        .await
        .context("download PDF")?;
    let path = portfolio::write_pdf(out, &pdf, full_name.as_deref(), Local::now().date_naive())?;
    println!("Saved PDF to {}", path.display());
    Ok(())
}

/// `fullName`, or `firstName lastName` when only the halves are present.
fn full_name(profile: &Value) -> Option<String> {
    if let Some(name) = profile.get("fullName").and_then(Value::as_str) {
        return Some(name.to_string());
    }
    let parts: Vec<&str> = ["firstName", "lastName"]
        .iter()
        .filter_map(|key| profile.get(*key).and_then(Value::as_str))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}
