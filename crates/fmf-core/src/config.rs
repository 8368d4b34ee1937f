//! Configuration management for fmf.
//!
//! Loads configuration from ${FMF_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;

/// Default base URL used when nothing else is configured (local backend).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Environment variable that overrides the API base URL.
pub const BASE_URL_ENV: &str = "FMF_API_BASE_URL";

/// Commented template shipped with the binary; `fmf config init` writes it
/// verbatim.
const CONFIG_TEMPLATE: &str = include_str!("../default_config.toml");

/// Writes the values of `defaults` over `template`, keeping the template's
/// comments and layout. Keys missing from the template are appended.
fn overlay_defaults(template: &mut toml_edit::Table, defaults: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, item) in defaults {
        let Some(existing) = template.get_mut(key) else {
            template.insert(key, item.clone());
            continue;
        };
        match (existing, item) {
            (Item::Table(section), Item::Table(values)) => overlay_defaults(section, values),
            (Item::Value(current), Item::Value(value)) => {
                let decor = current.decor().clone();
                *current = value.clone();
                *current.decor_mut() = decor;
            }
            (existing, item) => *existing = item.clone(),
        }
    }
}

pub mod paths {
    //! Path resolution for fmf configuration and data files.
    //!
    //! FMF_HOME resolution order:
    //! 1. FMF_HOME environment variable (if set)
    //! 2. ~/.config/fmf (default)

    use std::path::PathBuf;

    /// Returns the fmf home directory.
    pub fn fmf_home() -> PathBuf {
        if let Ok(home) = std::env::var("FMF_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".fmf"),
            |h| h.join(".config").join("fmf"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        fmf_home().join("config.toml")
    }

    /// Returns the path of the persisted cookie jar (refresh credential).
    pub fn cookies_path() -> PathBuf {
        fmf_home().join("cookies.json")
    }

    /// Returns the path of the persisted theme preference.
    pub fn theme_path() -> PathBuf {
        fmf_home().join("theme")
    }
}

/// API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API
    pub base_url: Option<String>,
    /// Per-request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,
    /// Token refresh timeout in seconds (0 disables)
    pub refresh_timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            request_timeout_secs: 30,
            refresh_timeout_secs: 15,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: env > flag > config > default.
    ///
    /// Empty values and unsubstituted `##...` deploy placeholders are skipped.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Result<String> {
        let env_value = std::env::var(BASE_URL_ENV).ok();
        let candidates = [env_value.as_deref(), flag, self.api.base_url.as_deref()];

        for candidate in candidates.into_iter().flatten() {
            let trimmed = candidate.trim();
            if trimmed.is_empty() || trimmed.starts_with("##") {
                continue;
            }
            url::Url::parse(trimmed).with_context(|| format!("Invalid API base URL: {trimmed}"))?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }

        Ok(DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        secs_to_duration(self.api.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        secs_to_duration(self.api.refresh_timeout_secs)
    }

    /// Writes the commented template to `path`; an existing file is never
    /// overwritten.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!(
                "{} already exists; edit it or remove it first",
                path.display()
            );
        }
        write_atomically(path, CONFIG_TEMPLATE)
    }

    /// Renders the template with the current built-in defaults filled in.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let defaults: DocumentMut = toml::to_string(&Config::default())
            .context("serialize built-in fmf defaults")?
            .parse()
            .context("re-read built-in fmf defaults")?;
        let mut rendered: DocumentMut = CONFIG_TEMPLATE
            .parse()
            .context("parse bundled config template")?;

        overlay_defaults(rendered.as_table_mut(), defaults.as_table());
        Ok(rendered.to_string())
    }
}

/// Writes through a sibling `.tmp` file and renames it into place, so a
/// crash never leaves a half-written config behind.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create FMF_HOME at {}", dir.display()))?;
    }

    let staging = path.with_extension("toml.tmp");
    fs::write(&staging, content).with_context(|| format!("stage config in {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("move staged config into {}", path.display()))
}

fn secs_to_duration(secs: u32) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(u64::from(secs)))
}
