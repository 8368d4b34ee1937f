//! CLI command handlers.

use anyhow::{Context, Result};
use fmf_core::services::Services;
use serde::Serialize;

pub mod admin;
pub mod auth;
pub mod backup;
pub mod config;
pub mod content;
pub mod route;
pub mod settings;
pub mod theme;

/// Pretty-prints `value` as JSON on stdout.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}

/// Restores the stored session and fails when there is none.
async fn require_session(services: &Services) -> Result<()> {
    services.auth.init_auth().await;
    if !services.auth.is_authenticated() {
        anyhow::bail!("Not logged in. Run `fmf login` first.");
    }
    Ok(())
}
