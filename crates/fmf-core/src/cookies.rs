//! Persistent cookie jar.
//!
//! The backend keeps the refresh credential in an HTTP-only cookie. Browsers
//! replay it automatically; here the jar is handed to reqwest as its cookie
//! provider and mirrored to `<base>/cookies.json` with restricted permissions
//! (0600) so a session survives between CLI invocations.
//!
//! Matching rules (Domain, Path, Secure, expiry) come from `cookie_store`.
//! Session cookies are written to disk too; a CLI session outlives the
//! process. Cookie values are never logged.

use std::fs::{self, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result, anyhow};
use cookie_store::{CookieStore as Store, RawCookie};
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use url::Url;

/// Cookie jar, optionally backed by a file.
#[derive(Debug, Default)]
pub struct CookieJar {
    path: Option<PathBuf>,
    store: Mutex<Store>,
}

impl CookieJar {
    /// A jar that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the jar from disk; a missing file yields an empty jar that will
    /// be created on the first `Set-Cookie`. Expired entries are dropped.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = if path.exists() {
            let file = fs::File::open(&path)
                .with_context(|| format!("Failed to read cookie jar from {}", path.display()))?;
            cookie_store::serde::json::load(BufReader::new(file)).map_err(|err| {
                anyhow!("Failed to parse cookie jar from {}: {err}", path.display())
            })?
        } else {
            Store::default()
        };

        Ok(Self {
            path: Some(path),
            store: Mutex::new(store),
        })
    }

    /// Value of the live cookie `name` that a request to `url` would carry.
    pub fn get(&self, url: &Url, name: &str) -> Option<String> {
        self.lock()
            .get_request_values(url)
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().iter_unexpired().next().is_none()
    }

    /// Drops every cookie (used on logout).
    pub fn clear(&self) {
        let mut store = self.lock();
        if store.iter_any().next().is_none() {
            return;
        }
        store.clear();
        self.persist(&store);
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, store: &Store) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if let Err(err) = save_store(path, store) {
            tracing::warn!("Failed to persist cookies: {err:#}");
        }
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies: Vec<RawCookie<'static>> = cookie_headers
            .filter_map(|header| header.to_str().ok())
            .filter_map(|header| RawCookie::parse(header.to_string()).ok())
            .collect();
        if cookies.is_empty() {
            return;
        }
        for cookie in &cookies {
            tracing::debug!(host = url.host_str(), name = cookie.name(), "storing cookie");
        }

        let mut store = self.lock();
        store.store_response_cookies(cookies.into_iter(), url);
        self.persist(&store);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .lock()
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            HeaderValue::from_str(&header).ok()
        }
    }
}

fn save_store(path: &Path, store: &Store) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut contents = Vec::new();
    cookie_store::serde::json::save_incl_expired_and_nonpersistent(store, &mut contents)
        .map_err(|err| anyhow!("Failed to serialize cookie jar: {err}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;
        file.write_all(&contents)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }

    Ok(())
}
