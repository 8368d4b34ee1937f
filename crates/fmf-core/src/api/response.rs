//! Response envelope normalization.
//!
//! The backend wraps most payloads as `{status, data, errors}`; a few
//! endpoints return bare JSON. Both end up as a [`Payload`] or an
//! [`ApiError`].

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, ApiResult, ApiStatus, FieldError};
use super::request::ResponseKind;

/// Result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 204, empty body, or envelope without data
    Empty,
    Json(Value),
    Binary(Bytes),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// JSON view of the payload; `Empty` reads as `null`.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Json(value) => value,
            Payload::Binary(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Deserializes the payload into `T`. `Empty` is offered as `null`, so
    /// `Option<T>` and `()` targets accept it.
    pub fn deserialize<T: DeserializeOwned>(self, http_status: u16) -> ApiResult<T> {
        let value = match self {
            Payload::Empty => Value::Null,
            Payload::Json(value) => value,
            Payload::Binary(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::parse(http_status, e))?,
        };
        serde_json::from_value(value).map_err(|e| ApiError::parse(http_status, e))
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Empty => Bytes::new(),
            Payload::Json(value) => Bytes::from(value.to_string()),
            Payload::Binary(bytes) => bytes,
        }
    }
}

/// Turns a raw response into a payload or an error.
///
/// 401 handling happens in the client before this point; here a 401 is just
/// another non-2xx status.
pub(crate) fn interpret(status: StatusCode, body: &[u8], kind: ResponseKind) -> ApiResult<Payload> {
    let code = status.as_u16();

    if status == StatusCode::NO_CONTENT {
        return Ok(Payload::Empty);
    }

    if !status.is_success() {
        return Err(error_from_body(code, body));
    }

    if body.is_empty() {
        return Ok(Payload::Empty);
    }

    if kind == ResponseKind::Binary {
        return Ok(Payload::Binary(Bytes::copy_from_slice(body)));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(status = code, "response body is not JSON: {e}");
        ApiError::new(
            "Invalid response format from server.",
            code,
            ApiStatus::ParseError,
        )
    })?;

    unwrap_envelope(code, value)
}

fn unwrap_envelope(code: u16, value: Value) -> ApiResult<Payload> {
    let Value::Object(mut map) = value else {
        return Ok(Payload::Json(value));
    };
    let Some(status) = map.remove("status") else {
        return Ok(Payload::Json(Value::Object(map)));
    };

    if status.as_str() == Some("success") {
        return Ok(match map.remove("data") {
            None | Some(Value::Null) => Payload::Empty,
            Some(data) => Payload::Json(data),
        });
    }

    let errors = field_errors(map.get("errors"));
    let tag = status
        .as_str()
        .filter(|s| !s.is_empty())
        .map_or(ApiStatus::ApiLogicError, ApiStatus::from_tag);
    let message = first_message(&errors).unwrap_or("API operation failed despite HTTP OK.");
    Err(ApiError::new(message, code, tag).with_errors(errors))
}

/// Best-effort error extraction from a non-2xx body.
fn error_from_body(code: u16, body: &[u8]) -> ApiError {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let object = parsed.as_ref().and_then(Value::as_object);

    let errors = field_errors(object.and_then(|o| o.get("errors")));
    let tag = object
        .and_then(|o| o.get("status"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map_or(ApiStatus::Error, ApiStatus::from_tag);

    let message = first_message(&errors).map_or_else(
        || format!("API request failed with HTTP status {code}"),
        str::to_string,
    );
    ApiError::new(message, code, tag).with_errors(errors)
}

fn field_errors(raw: Option<&Value>) -> Vec<FieldError> {
    raw.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn first_message(errors: &[FieldError]) -> Option<&str> {
    errors
        .first()
        .map(|e| e.message.as_str())
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn json_body(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_success_envelope_returns_data() {
        let body = json_body(&json!({"status": "success", "data": {"id": 1}}));
        let payload = interpret(StatusCode::OK, &body, ResponseKind::Json).unwrap();
        assert_eq!(payload, Payload::Json(json!({"id": 1})));
    }

    #[test]
    fn test_success_envelope_without_data_is_empty() {
        let body = json_body(&json!({"status": "success", "data": null}));
        assert!(
            interpret(StatusCode::OK, &body, ResponseKind::Json)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_no_content_and_empty_bodies_are_empty() {
        assert!(
            interpret(StatusCode::NO_CONTENT, b"", ResponseKind::Json)
                .unwrap()
                .is_empty()
        );
        assert!(
            interpret(StatusCode::OK, b"", ResponseKind::Json)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_unstructured_body_passes_through() {
        let body = json_body(&json!([{"name": "Rust"}]));
        let payload = interpret(StatusCode::OK, &body, ResponseKind::Json).unwrap();
        assert_eq!(payload, Payload::Json(json!([{"name": "Rust"}])));

        let body = json_body(&json!({"totalProjects": 3}));
        let payload = interpret(StatusCode::OK, &body, ResponseKind::Json).unwrap();
        assert_eq!(payload, Payload::Json(json!({"totalProjects": 3})));
    }

    #[test]
    fn test_logic_error_on_http_ok() {
        let body = json_body(&json!({
            "status": "validation_failed",
            "errors": [{"field": "email", "message": "invalid"}]
        }));
        let err = interpret(StatusCode::OK, &body, ResponseKind::Json).unwrap_err();
        assert_eq!(err.message, "invalid");
        assert_eq!(err.http_status, 200);
        assert_eq!(
            err.api_status,
            ApiStatus::Server("validation_failed".to_string())
        );
        assert_eq!(err.field_message("email"), Some("invalid"));
    }

    #[test]
    fn test_logic_error_without_tag_or_messages() {
        let body = json_body(&json!({"status": null}));
        let err = interpret(StatusCode::OK, &body, ResponseKind::Json).unwrap_err();
        assert_eq!(err.api_status, ApiStatus::ApiLogicError);
        assert_eq!(err.message, "API operation failed despite HTTP OK.");
    }

    #[test]
    fn test_non_json_success_is_parse_error() {
        let err = interpret(StatusCode::OK, b"<html>", ResponseKind::Json).unwrap_err();
        assert_eq!(err.api_status, ApiStatus::ParseError);
        assert_eq!(err.http_status, 200);
    }

    #[test]
    fn test_http_error_uses_server_tag_and_message() {
        let body = json_body(&json!({
            "status": "not_found",
            "errors": [{"message": "Project not found"}]
        }));
        let err = interpret(StatusCode::NOT_FOUND, &body, ResponseKind::Json).unwrap_err();
        assert_eq!(err.message, "Project not found");
        assert_eq!(err.http_status, 404);
        assert_eq!(err.api_status.as_str(), "not_found");
    }

    #[test]
    fn test_http_error_with_unreadable_body() {
        let err = interpret(StatusCode::BAD_GATEWAY, b"upstream down", ResponseKind::Json)
            .unwrap_err();
        assert_eq!(err.message, "API request failed with HTTP status 502");
        assert_eq!(err.api_status, ApiStatus::Error);
        assert!(err.errors.is_empty());
    }

    #[test]
    fn test_binary_keeps_bytes_but_not_errors() {
        let payload = interpret(StatusCode::OK, b"%PDF-1.7", ResponseKind::Binary).unwrap();
        assert_eq!(payload.into_bytes(), Bytes::from_static(b"%PDF-1.7"));

        let err = interpret(StatusCode::FORBIDDEN, b"", ResponseKind::Binary).unwrap_err();
        assert_eq!(err.http_status, 403);
    }

    #[test]
    fn test_deserialize_mismatch_is_parse_error() {
        let err = Payload::Json(json!({"id": 1}))
            .deserialize::<Vec<String>>(200)
            .unwrap_err();
        assert_eq!(err.api_status, ApiStatus::ParseError);

        let unit: Option<Value> = Payload::Empty.deserialize(204).unwrap();
        assert_eq!(unit, None);
    }
}
