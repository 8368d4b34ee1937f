//! Endpoints for the signed-in user.

use super::client::ApiClient;
use super::error::ApiResult;
use super::request::ApiRequest;
use crate::models::UserPatch;

/// Fetches the current user's profile as a patch for the session user.
/// An empty body yields an empty patch.
pub async fn current_user_profile(client: &ApiClient) -> ApiResult<UserPatch> {
    client
        .json::<Option<UserPatch>>(&ApiRequest::get("/me/profile"))
        .await
        .map(Option::unwrap_or_default)
}
