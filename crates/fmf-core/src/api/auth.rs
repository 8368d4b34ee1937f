//! Authentication endpoints.
//!
//! None of these take part in the refresh-then-retry cycle: a 401 from
//! login or refresh is an answer, not an expired token.

use super::client::ApiClient;
use super::error::ApiResult;
use super::request::ApiRequest;
use crate::models::{AuthResponse, Credentials, Registration};

pub async fn login(client: &ApiClient, credentials: &Credentials) -> ApiResult<AuthResponse> {
    let request = ApiRequest::post("/auth/login").public().json(credentials)?;
    client.json(&request).await
}

pub async fn register(client: &ApiClient, registration: &Registration) -> ApiResult<AuthResponse> {
    let request = ApiRequest::post("/auth/register")
        .public()
        .json(registration)?;
    client.json(&request).await
}

/// Exchanges the refresh cookie for a new access token.
pub async fn refresh_token(client: &ApiClient) -> ApiResult<AuthResponse> {
    client
        .json(&ApiRequest::post("/auth/refresh-token").public())
        .await
}

pub async fn logout(client: &ApiClient) -> ApiResult<()> {
    client.send(&ApiRequest::post("/auth/logout").public()).await?;
    Ok(())
}
