//! HTTP client for the portfolio API.
//!
//! Every call goes through [`ApiClient::send`]: the bearer token (if any) is
//! attached, cookies are replayed from the jar, the response envelope is
//! normalized, and a 401 on a retry-eligible call triggers one token refresh
//! followed by one replay.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiResult};
use super::request::{ApiRequest, RequestBody};
use super::response::{Payload, interpret};
use crate::cookies::CookieJar;

const USER_AGENT: &str = concat!("fmf/", env!("CARGO_PKG_VERSION"));

/// Source of the bearer token and the refresh operation.
///
/// Implemented by the auth store; the client only keeps a weak reference so
/// the two can point at each other without leaking.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, if a session exists.
    fn access_token(&self) -> Option<String>;

    /// Obtains a new access token. Concurrent callers share one attempt.
    async fn refresh(&self) -> ApiResult<()>;
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    cookies: Arc<CookieJar>,
    token_provider: OnceLock<Weak<dyn TokenProvider>>,
}

/// Cheap to clone; clones share the connection pool, cookie jar and token
/// provider.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field(
                "token_provider",
                &self.inner.token_provider.get().is_some(),
            )
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` (no trailing slash expected).
    pub fn new(
        base_url: impl Into<String>,
        cookies: Arc<CookieJar>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&cookies));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                cookies,
                token_provider: OnceLock::new(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.inner.cookies
    }

    /// Installs the token provider. Only the first call has an effect.
    pub fn set_token_provider(&self, provider: Weak<dyn TokenProvider>) {
        if self.inner.token_provider.set(provider).is_err() {
            tracing::warn!("Token provider already installed; ignoring replacement");
        }
    }

    fn token_provider(&self) -> Option<Arc<dyn TokenProvider>> {
        self.inner.token_provider.get().and_then(Weak::upgrade)
    }

    /// Sends a request and returns the normalized payload.
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<Payload> {
        self.dispatch(request).await.map(|(_, payload)| payload)
    }

    /// Sends a request and deserializes the payload into `T`.
    pub async fn json<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApiResult<T> {
        let (status, payload) = self.dispatch(request).await?;
        payload.deserialize(status)
    }

    /// Sends a request expecting a raw body.
    pub async fn bytes(&self, request: &ApiRequest) -> ApiResult<Bytes> {
        let request = request.clone().binary();
        self.send(&request).await.map(Payload::into_bytes)
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<(u16, Payload)> {
        let provider = self.token_provider();
        let sent_token = provider.as_ref().and_then(|p| p.access_token());
        let (status, body) = self.execute(request, sent_token.as_deref()).await?;

        if status == StatusCode::UNAUTHORIZED
            && request.retry_on_unauthorized
            && let Some(provider) = provider
        {
            // A refresh may have finished while this request was in flight.
            let current = provider.access_token();
            if current.is_some() && current != sent_token {
                tracing::debug!(path = %request.path, "401 with a superseded token; replaying");
            } else {
                tracing::debug!(path = %request.path, "401 received; refreshing session");
                provider.refresh().await?;
            }

            let token = provider.access_token();
            let (status, body) = self.execute(request, token.as_deref()).await?;
            return interpret(status, &body, request.response_kind)
                .map(|payload| (status.as_u16(), payload));
        }

        interpret(status, &body, request.response_kind).map(|payload| (status.as_u16(), payload))
    }

    /// Performs one HTTP exchange. Only transport failures are errors here.
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> ApiResult<(StatusCode, Bytes)> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Multipart(form)) => builder.multipart(form.build()?),
            None => builder,
        };

        tracing::debug!(method = %request.method, path = %request.path, "api request");

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(path = %request.path, "request failed: {e}");
            ApiError::network(&e)
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| ApiError::network(&e))?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            bytes = body.len(),
            "api response"
        );

        Ok((status, body))
    }
}
