//! Public feature settings.
//!
//! Settings are fetched once per store and kept as a name -> value map.
//! A feature counts as enabled only when its value is exactly `"true"`.

use std::collections::BTreeMap;

use tokio::sync::{OnceCell, watch};

use crate::api::PublicApi;
use crate::models::Setting;

/// Observable settings state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsState {
    pub values: BTreeMap<String, String>,
    pub is_loading: bool,
}

#[derive(Debug)]
pub struct SettingsStore {
    api: PublicApi,
    state: watch::Sender<SettingsState>,
    fetched: OnceCell<()>,
}

impl SettingsStore {
    pub fn new(api: PublicApi) -> Self {
        Self {
            api,
            state: watch::Sender::new(SettingsState {
                values: BTreeMap::new(),
                is_loading: true,
            }),
            fetched: OnceCell::new(),
        }
    }

    /// Loads settings from the server. Only the first call hits the network;
    /// concurrent callers wait for it. On failure the map is emptied, so
    /// every feature reads as disabled.
    pub async fn fetch_settings(&self) {
        self.fetched
            .get_or_init(|| async {
                self.state.send_modify(|s| s.is_loading = true);
                let values = match self.api.settings().await {
                    Ok(list) => {
                        tracing::debug!(count = list.len(), "Settings loaded");
                        into_map(list)
                    }
                    Err(err) => {
                        tracing::warn!("Failed to fetch settings: {err}");
                        BTreeMap::new()
                    }
                };
                self.state.send_modify(|s| {
                    s.values = values;
                    s.is_loading = false;
                });
            })
            .await;
    }

    /// True only when `name` is stored with the exact value `"true"`.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.state
            .borrow()
            .values
            .get(name)
            .is_some_and(|v| v == "true")
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.state.borrow().values.get(name).cloned()
    }

    /// Merges `settings` into the map; later entries win.
    pub fn update_settings(&self, settings: impl IntoIterator<Item = Setting>) {
        let updates = into_map(settings);
        if updates.is_empty() {
            return;
        }
        self.state.send_modify(|s| s.values.extend(updates));
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.state.borrow().values.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn subscribe(&self) -> watch::Receiver<SettingsState> {
        self.state.subscribe()
    }
}

fn into_map(settings: impl IntoIterator<Item = Setting>) -> BTreeMap<String, String> {
    settings.into_iter().map(|s| (s.name, s.value)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::ApiClient;
    use crate::cookies::CookieJar;

    fn offline_store() -> SettingsStore {
        let client = ApiClient::new(
            "http://127.0.0.1:1",
            Arc::new(CookieJar::in_memory()),
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        SettingsStore::new(PublicApi::new(client))
    }

    #[test]
    fn test_is_enabled_requires_exact_true() {
        let store = offline_store();
        store.update_settings([
            Setting::new("A", "true"),
            Setting::new("B", "false"),
            Setting::new("C", "1"),
            Setting::new("D", ""),
            Setting::new("E", "TRUE"),
        ]);

        assert!(store.is_enabled("A"));
        for name in ["B", "C", "D", "E", "MISSING"] {
            assert!(!store.is_enabled(name), "{name} should be disabled");
        }
    }

    #[test]
    fn test_update_merges() {
        let store = offline_store();
        store.update_settings([Setting::new("SHOW_SKILLS", "true")]);
        store.update_settings([Setting::new("SHOW_PROJECTS", "false")]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("SHOW_SKILLS").map(String::as_str), Some("true"));
        assert_eq!(snapshot.get("SHOW_PROJECTS").map(String::as_str), Some("false"));
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_everything_disabled() {
        let store = offline_store();
        assert!(store.is_loading());
        store.fetch_settings().await;
        assert!(!store.is_loading());
        assert!(store.snapshot().is_empty());
        assert!(!store.is_enabled("SHOW_PROJECTS"));
    }
}
