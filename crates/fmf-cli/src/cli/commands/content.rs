//! Public portfolio content.

use anyhow::{Context, Result};
use fmf_core::models::ContactMessage;
use fmf_core::services::Services;

use super::print_json;

pub async fn profile(services: &Services) -> Result<()> {
    let profile = services.public.profile().await.context("fetch profile")?;
    print_json(&profile)
}

pub async fn projects(services: &Services, id: Option<&str>) -> Result<()> {
    let projects = match id {
        Some(id) => services
            .public
            .project(id)
            .await
            .with_context(|| format!("fetch project '{id}'"))?,
        None => services.public.projects().await.context("fetch projects")?,
    };
    print_json(&projects)
}

pub async fn skills(services: &Services) -> Result<()> {
    let skills = services.public.skills().await.context("fetch skills")?;
    print_json(&skills)
}

pub async fn contact(services: &Services, message: &ContactMessage) -> Result<()> {
    services
        .public
        .submit_contact(message)
        .await
        .context("send message")?;
    println!("Message sent.");
    Ok(())
}
