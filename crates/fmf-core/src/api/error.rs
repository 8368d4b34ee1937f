//! Error type shared by every API call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status tag attached to a failed call.
///
/// The fixed variants are produced locally; any tag the server puts in the
/// envelope (`validation_failed`, `not_found`, ...) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    /// Connection refused, DNS failure, timeout
    NetworkError,
    /// Response body could not be interpreted
    ParseError,
    /// A 401 triggered a refresh and the refresh failed
    TokenRefreshFailed,
    /// Non-success envelope without a status tag
    ApiLogicError,
    /// Non-2xx response without a status tag
    Error,
    /// Tag supplied by the server
    Server(String),
}

impl ApiStatus {
    /// Maps a wire tag onto a status, folding known local tags back.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "network_error" => ApiStatus::NetworkError,
            "parse_error" => ApiStatus::ParseError,
            "token_refresh_failed" => ApiStatus::TokenRefreshFailed,
            "api_logic_error" => ApiStatus::ApiLogicError,
            "error" => ApiStatus::Error,
            other => ApiStatus::Server(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ApiStatus::NetworkError => "network_error",
            ApiStatus::ParseError => "parse_error",
            ApiStatus::TokenRefreshFailed => "token_refresh_failed",
            ApiStatus::ApiLogicError => "api_logic_error",
            ApiStatus::Error => "error",
            ApiStatus::Server(tag) => tag,
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-level message from the server's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Failure of an API call, either reported by the server or raised locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status of the failing response (0 when no response arrived)
    pub http_status: u16,
    pub api_status: ApiStatus,
    /// Field-level messages, in server order
    pub errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, http_status: u16, api_status: ApiStatus) -> Self {
        Self {
            message: message.into(),
            http_status,
            api_status,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    /// Transport failure; no HTTP status is available.
    pub fn network(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {err}")
        } else {
            format!("Network error: {err}")
        };
        Self::new(message, 0, ApiStatus::NetworkError)
    }

    pub fn parse(http_status: u16, detail: impl fmt::Display) -> Self {
        Self::new(
            format!("Failed to parse response: {detail}"),
            http_status,
            ApiStatus::ParseError,
        )
    }

    /// Wraps the error that made a refresh fail, keeping its status and
    /// field errors.
    pub fn refresh_failed(cause: &ApiError) -> Self {
        Self {
            message: format!("Session refresh failed: {}", cause.message),
            http_status: cause.http_status,
            api_status: ApiStatus::TokenRefreshFailed,
            errors: cause.errors.clone(),
        }
    }

    /// Local rejection before any request is sent.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(message, 0, ApiStatus::Error)
    }

    /// First message reported for `field`.
    pub fn field_message(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field.as_deref() == Some(field))
            .map(|e| e.message.as_str())
    }

    pub fn is_unauthorized(&self) -> bool {
        self.http_status == 401
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for error in &self.errors {
            match &error.field {
                Some(field) if error.message != self.message => {
                    write!(f, "\n  {field}: {}", error.message)?;
                }
                None if error.message != self.message => write!(f, "\n  {}", error.message)?,
                _ => {}
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
