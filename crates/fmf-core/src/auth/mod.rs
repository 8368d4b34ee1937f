//! Session ownership and token refresh.
//!
//! [`AuthStore`] is the only writer of the [`Session`]. It doubles as the
//! client's [`TokenProvider`]: every 401 on an authenticated call funnels into
//! [`AuthStore::refresh_token`], which runs at most one refresh request at a
//! time and hands the same outcome to every caller.

pub mod claims;

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;

use crate::api::{self, ApiClient, ApiError, ApiResult, ApiStatus, TokenProvider};
use crate::models::{AuthResponse, Credentials, Registration, User, UserPatch};

/// Where the session user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Explicit user payload from the server
    Server,
    /// Decoded from the access token
    TokenClaims,
}

/// Snapshot of the authentication state.
///
/// A token is present exactly when a user is present.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
    user: Option<User>,
    is_loading: bool,
    identity_source: Option<IdentitySource>,
}

impl Session {
    fn loading() -> Self {
        Self {
            access_token: None,
            user: None,
            is_loading: true,
            identity_source: None,
        }
    }

    fn signed_out() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn identity_source(&self) -> Option<IdentitySource> {
        self.identity_source
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("is_loading", &self.is_loading)
            .field("identity_source", &self.identity_source)
            .finish()
    }
}

type SharedRefresh = Shared<BoxFuture<'static, ApiResult<()>>>;

/// Owner of the current session.
pub struct AuthStore {
    client: ApiClient,
    session: watch::Sender<Session>,
    in_flight: Mutex<Option<SharedRefresh>>,
    refresh_timeout: Option<Duration>,
    self_ref: Weak<AuthStore>,
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStore")
            .field("session", &*self.session.borrow())
            .field("refresh_timeout", &self.refresh_timeout)
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Creates the store and installs it as `client`'s token provider.
    pub fn new(client: ApiClient, refresh_timeout: Option<Duration>) -> Arc<Self> {
        let store = Arc::new_cyclic(|self_ref: &Weak<AuthStore>| Self {
            client: client.clone(),
            session: watch::Sender::new(Session::loading()),
            in_flight: Mutex::new(None),
            refresh_timeout,
            self_ref: self_ref.clone(),
        });
        let provider: Weak<dyn TokenProvider> = store.self_ref.clone();
        client.set_token_provider(provider);
        store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.session.borrow().is_loading
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<()> {
        let response = api::auth::login(&self.client, credentials).await?;
        self.install(response)
    }

    pub async fn register(&self, registration: &Registration) -> ApiResult<()> {
        let response = api::auth::register(&self.client, registration).await?;
        self.install(response)
    }

    /// Ends the session. The backend call is best effort; local state and
    /// stored cookies are dropped regardless of its outcome.
    pub async fn logout(&self) {
        if let Err(err) = api::auth::logout(&self.client).await {
            tracing::warn!("Backend logout failed, clearing session anyway: {err}");
        }
        self.clear();
        self.client.cookies().clear();
    }

    /// Exchanges the refresh cookie for a new access token.
    ///
    /// Only one refresh request is outstanding at a time; callers arriving
    /// while one runs wait for it and receive the same outcome. On failure
    /// the session is cleared and the error is `token_refresh_failed`.
    pub async fn refresh_token(&self) -> ApiResult<()> {
        let refresh = {
            let mut slot = self.lock_in_flight();
            if let Some(existing) = slot.as_ref() {
                tracing::debug!("Token refresh already in progress; waiting");
                existing.clone()
            } else {
                tracing::debug!("Starting token refresh");
                let refresh = self.start_refresh().shared();
                *slot = Some(refresh.clone());
                refresh
            }
        };
        refresh.await
    }

    /// Restores a session from the stored refresh cookie, then loads the
    /// full profile. Failures leave the session signed out.
    pub async fn init_auth(&self) {
        match self.refresh_token().await {
            Ok(()) if self.is_authenticated() => {
                match api::user::current_user_profile(&self.client).await {
                    Ok(profile) => self.merge_user(profile, Some(IdentitySource::Server)),
                    Err(err) => tracing::warn!("Failed to load user profile: {err}"),
                }
            }
            Ok(()) => {}
            Err(err) => tracing::debug!("No session restored: {err}"),
        }

        self.session.send_if_modified(|session| {
            let was_loading = session.is_loading;
            session.is_loading = false;
            was_loading
        });
        tracing::debug!(authenticated = self.is_authenticated(), "Auth initialized");
    }

    /// Merges `patch` into the current user. No-op when signed out.
    pub fn update_local_user(&self, patch: UserPatch) {
        self.merge_user(patch, None);
    }

    fn merge_user(&self, patch: UserPatch, source: Option<IdentitySource>) {
        self.session.send_if_modified(|session| {
            let Some(user) = session.user.as_mut() else {
                return false;
            };
            user.apply(patch);
            if source.is_some() {
                session.identity_source = source;
            }
            true
        });
    }

    fn start_refresh(&self) -> BoxFuture<'static, ApiResult<()>> {
        let client = self.client.clone();
        let store = self.self_ref.clone();
        let timeout = self.refresh_timeout;

        async move {
            let request = api::auth::refresh_token(&client);
            let attempt = async move {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, request)
                        .await
                        .unwrap_or_else(|_| {
                            Err(ApiError::new(
                                format!("Token refresh timed out after {}s", limit.as_secs_f32()),
                                0,
                                ApiStatus::NetworkError,
                            ))
                        }),
                    None => request.await,
                }
            };

            let outcome = AssertUnwindSafe(attempt)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(ApiError::new("Token refresh panicked", 0, ApiStatus::Error))
                });

            match store.upgrade() {
                Some(store) => store.finish_refresh(outcome),
                None => outcome.map(drop).map_err(|err| ApiError::refresh_failed(&err)),
            }
        }
        .boxed()
    }

    /// Resets the in-flight slot, then applies the outcome. Waiters observe
    /// the result only after both have happened.
    fn finish_refresh(&self, outcome: ApiResult<AuthResponse>) -> ApiResult<()> {
        let finished = self.lock_in_flight().take();
        drop(finished);

        let result = outcome.and_then(|response| self.install(response));
        match result {
            Ok(()) => {
                tracing::debug!("Token refresh succeeded");
                Ok(())
            }
            Err(err) => {
                tracing::debug!("Token refresh failed: {err}");
                self.clear();
                Err(ApiError::refresh_failed(&err))
            }
        }
    }

    /// Installs a token and its user. An explicit user wins over claims;
    /// an undecodable token without a user clears the session.
    pub(crate) fn install(&self, response: AuthResponse) -> ApiResult<()> {
        let AuthResponse { access_token, user } = response;
        if access_token.is_empty() {
            self.clear();
            return Err(ApiError::new(
                "Server returned an empty access token",
                200,
                ApiStatus::ParseError,
            ));
        }

        let (user, source) = match user {
            Some(user) => (user, IdentitySource::Server),
            None => match claims::user_from_token(&access_token) {
                Ok(user) => (user, IdentitySource::TokenClaims),
                Err(reason) => {
                    tracing::warn!("Failed to decode access token: {reason}");
                    self.clear();
                    return Err(ApiError::new(
                        format!("Access token could not be decoded: {reason}"),
                        200,
                        ApiStatus::ParseError,
                    ));
                }
            },
        };

        tracing::debug!(user_id = %user.id, source = ?source, "Session updated");
        self.session.send_replace(Session {
            access_token: Some(access_token),
            user: Some(user),
            is_loading: false,
            identity_source: Some(source),
        });
        Ok(())
    }

    fn clear(&self) {
        tracing::debug!("Clearing session");
        self.session.send_replace(Session::signed_out());
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<SharedRefresh>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenProvider for AuthStore {
    fn access_token(&self) -> Option<String> {
        self.session.borrow().access_token.clone()
    }

    async fn refresh(&self) -> ApiResult<()> {
        self.refresh_token().await
    }
}
