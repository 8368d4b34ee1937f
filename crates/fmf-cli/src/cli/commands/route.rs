//! Route guard preview.

use anyhow::Result;
use fmf_core::router::Decision;
use fmf_core::services::Services;

pub async fn decide(services: &Services, path: &str) -> Result<()> {
    services.auth.init_auth().await;
    let decision = services.guard.decide(path, &services.auth.session());
    let location = decision.location(path);
    match decision {
        Decision::Allow { route } => println!("allow {route} -> {location}"),
        Decision::RedirectToLogin { .. } => println!("login required -> {location}"),
        Decision::RedirectUnauthorized => println!("unauthorized -> {location}"),
    }
    Ok(())
}
