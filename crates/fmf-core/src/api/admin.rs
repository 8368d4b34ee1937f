//! Admin endpoints. All of them require a session and take part in the
//! refresh-then-retry cycle.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::client::ApiClient;
use super::error::{ApiError, ApiResult};
use super::request::ApiRequest;
use super::response::Payload;
use crate::models::Setting;

/// Operation on an admin content collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOp {
    List,
    Create,
    Update,
    Delete,
}

impl fmt::Display for ContentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentOp::List => "list",
            ContentOp::Create => "create",
            ContentOp::Update => "update",
            ContentOp::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Admin-managed content collections under `/admin/<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Projects,
    Skills,
    Experience,
    Testimonials,
    Qualifications,
    ContactMessages,
}

impl ContentKind {
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Projects,
        ContentKind::Skills,
        ContentKind::Experience,
        ContentKind::Testimonials,
        ContentKind::Qualifications,
        ContentKind::ContactMessages,
    ];

    /// Path segment, also accepted on the command line.
    pub fn segment(self) -> &'static str {
        match self {
            ContentKind::Projects => "projects",
            ContentKind::Skills => "skills",
            ContentKind::Experience => "experience",
            ContentKind::Testimonials => "testimonials",
            ContentKind::Qualifications => "qualifications",
            ContentKind::ContactMessages => "contact-messages",
        }
    }

    /// Operations the backend exposes for this collection.
    pub fn supports(self, op: ContentOp) -> bool {
        use ContentOp::{Create, Delete, List, Update};
        match self {
            ContentKind::Projects => true,
            ContentKind::Skills => matches!(op, Create | Delete),
            ContentKind::Experience | ContentKind::Testimonials | ContentKind::Qualifications => {
                matches!(op, Create | Update | Delete)
            }
            ContentKind::ContactMessages => matches!(op, List | Delete),
        }
    }

    fn collection_path(self) -> String {
        format!("/admin/{}", self.segment())
    }

    fn item_path(self, uuid: &str) -> String {
        format!("/admin/{}/{uuid}", self.segment())
    }

    fn check(self, op: ContentOp) -> ApiResult<()> {
        if self.supports(op) {
            Ok(())
        } else {
            Err(ApiError::invalid_request(format!(
                "'{op}' is not supported for {}",
                self.segment()
            )))
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.segment() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = ContentKind::ALL.iter().map(|k| k.segment()).collect();
                format!("unknown content kind '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Admin API wrapper.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn account(&self) -> ApiResult<Value> {
        self.value(ApiRequest::get("/admin/account")).await
    }

    pub async fn update_account(&self, account: &Value) -> ApiResult<Value> {
        self.value(ApiRequest::put("/admin/account").json(account)?)
            .await
    }

    pub async fn portfolio_profile(&self) -> ApiResult<Value> {
        self.value(ApiRequest::get("/admin/portfolio-profile")).await
    }

    pub async fn create_portfolio_profile(&self, profile: &Value) -> ApiResult<Value> {
        self.value(ApiRequest::post("/admin/portfolio-profile").json(profile)?)
            .await
    }

    pub async fn update_portfolio_profile(&self, profile: &Value) -> ApiResult<Value> {
        self.value(ApiRequest::put("/admin/portfolio-profile").json(profile)?)
            .await
    }

    pub async fn list(&self, kind: ContentKind) -> ApiResult<Value> {
        kind.check(ContentOp::List)?;
        self.value(ApiRequest::get(kind.collection_path())).await
    }

    pub async fn create(&self, kind: ContentKind, item: &Value) -> ApiResult<Value> {
        kind.check(ContentOp::Create)?;
        self.value(ApiRequest::post(kind.collection_path()).json(item)?)
            .await
    }

    pub async fn update(&self, kind: ContentKind, uuid: &str, item: &Value) -> ApiResult<Value> {
        kind.check(ContentOp::Update)?;
        self.value(ApiRequest::put(kind.item_path(uuid)).json(item)?)
            .await
    }

    pub async fn delete(&self, kind: ContentKind, uuid: &str) -> ApiResult<()> {
        kind.check(ContentOp::Delete)?;
        self.client
            .send(&ApiRequest::delete(kind.item_path(uuid)))
            .await?;
        Ok(())
    }

    /// Full settings records (`uuid`, `name`, `enabled`, `description`).
    pub async fn settings(&self) -> ApiResult<Vec<Value>> {
        self.client
            .json::<Option<Vec<Value>>>(&ApiRequest::get("/admin/settings"))
            .await
            .map(Option::unwrap_or_default)
    }

    /// Saves settings records and returns the full updated list.
    pub async fn update_settings(&self, records: &[Value]) -> ApiResult<Vec<Setting>> {
        let request = ApiRequest::put("/admin/settings").json(records)?;
        self.client
            .json::<Option<Vec<Setting>>>(&request)
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn stats(&self) -> ApiResult<Value> {
        self.value(ApiRequest::get("/admin/stats")).await
    }

    async fn value(&self, request: ApiRequest) -> ApiResult<Value> {
        self.client.send(&request).await.map(Payload::into_value)
    }
}
