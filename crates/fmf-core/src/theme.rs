//! Light/dark theme preference, persisted as a one-word file.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}' (expected light or dark)")),
        }
    }
}

/// Current theme plus change notifications.
#[derive(Debug)]
pub struct ThemeStore {
    path: Option<PathBuf>,
    current: watch::Sender<Theme>,
}

impl ThemeStore {
    /// Loads the stored theme; a missing or unreadable file means light.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = match fs::read_to_string(&path) {
            Ok(contents) => contents.parse().unwrap_or_else(|err| {
                tracing::warn!("Ignoring stored theme: {err}");
                Theme::default()
            }),
            Err(_) => Theme::default(),
        };
        Self {
            path: Some(path),
            current: watch::Sender::new(theme),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: watch::Sender::new(Theme::default()),
        }
    }

    pub fn current(&self) -> Theme {
        *self.current.borrow()
    }

    /// Stores and broadcasts `theme`.
    pub fn set(&self, theme: Theme) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            fs::write(path, theme.as_str())
                .with_context(|| format!("Failed to write theme to {}", path.display()))?;
        }
        self.current.send_replace(theme);
        tracing::debug!(%theme, "Theme changed");
        Ok(())
    }

    pub fn toggle(&self) -> Result<Theme> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.current.subscribe()
    }
}
