//! Endpoints visible to anonymous visitors.

use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiResult;
use super::request::ApiRequest;
use super::response::Payload;
use crate::models::{ContactMessage, Setting, SettingsPayload};

/// Public portfolio content. Calls never trigger a token refresh.
#[derive(Debug, Clone)]
pub struct PublicApi {
    client: ApiClient,
}

impl PublicApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> ApiResult<Value> {
        self.get("/profile").await
    }

    pub async fn projects(&self) -> ApiResult<Value> {
        self.get("/projects").await
    }

    pub async fn project(&self, id: &str) -> ApiResult<Value> {
        self.get(&format!("/projects/{id}")).await
    }

    pub async fn skills(&self) -> ApiResult<Value> {
        self.get("/skills").await
    }

    pub async fn submit_contact(&self, message: &ContactMessage) -> ApiResult<Value> {
        let request = ApiRequest::post("/contact").public().json(message)?;
        self.client.send(&request).await.map(Payload::into_value)
    }

    /// Public feature settings, normalized to a list.
    pub async fn settings(&self) -> ApiResult<Vec<Setting>> {
        let payload: Option<SettingsPayload> = self
            .client
            .json(&ApiRequest::get("/settings").public())
            .await?;
        Ok(payload.map(SettingsPayload::into_settings).unwrap_or_default())
    }

    async fn get(&self, path: &str) -> ApiResult<Value> {
        self.client
            .send(&ApiRequest::get(path).public())
            .await
            .map(Payload::into_value)
    }
}
