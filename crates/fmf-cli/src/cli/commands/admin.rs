//! Admin content management.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fmf_core::api::ContentKind;
use fmf_core::services::Services;
use serde_json::Value;

use super::{print_json, require_session};

pub async fn account(services: &Services) -> Result<()> {
    require_session(services).await?;
    let account = services.admin.account().await.context("fetch account")?;
    print_json(&account)
}

pub async fn stats(services: &Services) -> Result<()> {
    require_session(services).await?;
    let stats = services.admin.stats().await.context("fetch stats")?;
    print_json(&stats)
}

pub async fn list(services: &Services, kind: ContentKind) -> Result<()> {
    require_session(services).await?;
    let items = services
        .admin
        .list(kind)
        .await
        .with_context(|| format!("list {kind}"))?;
    print_json(&items)
}

pub async fn create(services: &Services, kind: ContentKind, file: &Path) -> Result<()> {
    let item = read_item(file)?;
    require_session(services).await?;
    let created = services
        .admin
        .create(kind, &item)
        .await
        .with_context(|| format!("create {kind}"))?;
    print_json(&created)
}

pub async fn update(services: &Services, kind: ContentKind, uuid: &str, file: &Path) -> Result<()> {
    let item = read_item(file)?;
    require_session(services).await?;
    let updated = services
        .admin
        .update(kind, uuid, &item)
        .await
        .with_context(|| format!("update {kind} '{uuid}'"))?;
    print_json(&updated)
}

pub async fn delete(services: &Services, kind: ContentKind, uuid: &str) -> Result<()> {
    require_session(services).await?;
    services
        .admin
        .delete(kind, uuid)
        .await
        .with_context(|| format!("delete {kind} '{uuid}'"))?;
    println!("Deleted {kind} {uuid}");
    Ok(())
}

fn read_item(file: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse JSON in {}", file.display()))
}
