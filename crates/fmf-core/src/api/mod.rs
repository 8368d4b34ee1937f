//! REST API access: the client, its error type, and typed endpoint wrappers.

pub mod admin;
pub mod auth;
pub mod backup;
mod client;
pub mod error;
pub mod portfolio;
pub mod public;
mod request;
mod response;
pub mod user;

pub use admin::{AdminApi, ContentKind, ContentOp};
pub use client::{ApiClient, TokenProvider};
pub use error::{ApiError, ApiResult, ApiStatus, FieldError};
pub use public::PublicApi;
pub use request::{ApiRequest, FormPart, MultipartForm, RequestBody, ResponseKind};
pub use response::Payload;
