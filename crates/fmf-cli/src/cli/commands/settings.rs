//! Feature settings.

use anyhow::{Context, Result};
use fmf_core::services::Services;
use serde_json::Value;

use super::{print_json, require_session};

pub async fn list(services: &Services) -> Result<()> {
    services.settings.fetch_settings().await;
    print_json(&services.settings.snapshot())
}

pub async fn enabled(services: &Services, name: &str) -> Result<()> {
    services.settings.fetch_settings().await;
    println!("{}", services.settings.is_enabled(name));
    Ok(())
}

/// Updates one admin setting record, then folds the server's answer back
/// into the local settings.
pub async fn set(services: &Services, name: &str, value: &str) -> Result<()> {
    require_session(services).await?;

    let records = services
        .admin
        .settings()
        .await
        .context("fetch admin settings")?;
    let mut record = records
        .into_iter()
        .find(|r| r.get("name").and_then(Value::as_str) == Some(name))
        .with_context(|| format!("Unknown setting '{name}'"))?;

    apply_value(&mut record, value);

    let updated = services
        .admin
        .update_settings(std::slice::from_ref(&record))
        .await
        .with_context(|| format!("update setting '{name}'"))?;
    services.settings.update_settings(updated);

    println!(
        "{name} = {}",
        services.settings.value(name).as_deref().unwrap_or(value)
    );
    Ok(())
}

/// Admin records carry a boolean `enabled`; anything else keeps a `value`.
fn apply_value(record: &mut Value, value: &str) {
    let Some(fields) = record.as_object_mut() else {
        return;
    };
    if fields.contains_key("enabled") {
        fields.insert("enabled".to_string(), Value::Bool(value == "true"));
    } else {
        fields.insert("value".to_string(), Value::String(value.to_string()));
    }
}
