//! Request description handed to [`ApiClient`](super::ApiClient).
//!
//! Requests are plain data so the client can replay one after a token
//! refresh. Multipart forms are therefore kept as owned parts and turned into
//! a `reqwest` form for every send.

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiResult};

/// How a successful response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// Envelope-aware JSON
    #[default]
    Json,
    /// Raw bytes (PDF, backup archives)
    Binary,
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    pub data: Bytes,
}

/// Multipart form made of owned parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            file_name: None,
            mime: None,
            data: Bytes::from(value.into()),
        });
        self
    }

    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            file_name: Some(file_name.into()),
            mime: mime.map(str::to_string),
            data: data.into(),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Builds a fresh `reqwest` form; called once per attempt.
    pub(crate) fn build(&self) -> ApiResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            let mut built = reqwest::multipart::Part::bytes(part.data.to_vec());
            if let Some(file_name) = &part.file_name {
                built = built.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                built = built.mime_str(mime).map_err(|e| {
                    ApiError::invalid_request(format!("Invalid MIME type '{mime}': {e}"))
                })?;
            }
            form = form.part(part.name.clone(), built);
        }
        Ok(form)
    }
}

/// A single API call: method, path relative to the base URL, body and
/// response handling.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) retry_on_unauthorized: bool,
    pub(crate) response_kind: ResponseKind,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retry_on_unauthorized: true,
            response_kind: ResponseKind::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Opts out of the refresh-then-retry cycle on 401.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.retry_on_unauthorized = false;
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serializes `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::invalid_request(format!("Failed to encode request body: {e}")))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    #[must_use]
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Returns the 2xx body as raw bytes instead of parsing it.
    #[must_use]
    pub fn binary(mut self) -> Self {
        self.response_kind = ResponseKind::Binary;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn retries_on_unauthorized(&self) -> bool {
        self.retry_on_unauthorized
    }
}
