//! Process-wide service container.
//!
//! Everything is built once at startup and passed around explicitly; the
//! client is shared by every store and the auth store is its token provider.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{AdminApi, ApiClient, PublicApi};
use crate::auth::AuthStore;
use crate::config::{Config, paths};
use crate::cookies::CookieJar;
use crate::router::RouteGuard;
use crate::settings::SettingsStore;
use crate::theme::ThemeStore;

#[derive(Debug)]
pub struct Services {
    pub client: ApiClient,
    pub auth: Arc<AuthStore>,
    pub settings: SettingsStore,
    pub theme: ThemeStore,
    pub guard: RouteGuard,
    pub public: PublicApi,
    pub admin: AdminApi,
}

impl Services {
    /// Builds services from config, persisting cookies and theme under
    /// `FMF_HOME`. `base_url_flag` is the command-line override.
    pub fn new(config: &Config, base_url_flag: Option<&str>) -> Result<Self> {
        let base_url = config.resolve_base_url(base_url_flag)?;
        let cookies_path = paths::cookies_path();
        let cookies = CookieJar::load(&cookies_path)
            .with_context(|| format!("load cookies from {}", cookies_path.display()))?;
        let theme = ThemeStore::load(paths::theme_path());
        Self::from_parts(config, &base_url, cookies, theme)
    }

    /// Builds services around an explicit cookie jar and theme store.
    pub fn from_parts(
        config: &Config,
        base_url: &str,
        cookies: CookieJar,
        theme: ThemeStore,
    ) -> Result<Self> {
        tracing::debug!(base_url, "Creating API client");
        let client = ApiClient::new(base_url, Arc::new(cookies), config.request_timeout())?;
        let auth = AuthStore::new(client.clone(), config.refresh_timeout());
        let public = PublicApi::new(client.clone());

        Ok(Self {
            settings: SettingsStore::new(public.clone()),
            admin: AdminApi::new(client.clone()),
            public,
            auth,
            theme,
            guard: RouteGuard::default(),
            client,
        })
    }
}
