//! Session command handlers.

use anyhow::{Context, Result};
use fmf_core::models::{Credentials, Registration, User};
use fmf_core::services::Services;

use super::{print_json, require_session};

pub async fn login(services: &Services, email: String, password: String) -> Result<()> {
    services
        .auth
        .login(&Credentials { email, password })
        .await
        .context("login")?;
    report_signed_in(services.auth.user().as_ref());
    Ok(())
}

pub async fn register(services: &Services, registration: &Registration) -> Result<()> {
    services
        .auth
        .register(registration)
        .await
        .context("register")?;
    report_signed_in(services.auth.user().as_ref());
    Ok(())
}

pub async fn logout(services: &Services) -> Result<()> {
    services.auth.init_auth().await;
    services.auth.logout().await;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(services: &Services) -> Result<()> {
    require_session(services).await?;
    match services.auth.user() {
        Some(user) => print_json(&user),
        None => anyhow::bail!("Session has no user"),
    }
}

fn report_signed_in(user: Option<&User>) {
    match user {
        Some(user) => println!("Logged in as {}", user.display_name()),
        None => println!("Logged in."),
    }
}
