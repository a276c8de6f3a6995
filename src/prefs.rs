use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::storage::{KeyValueStore, StorageError};

pub const THEME_KEY: &str = "achot.theme";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// Process-wide UI state: loaded once at start-up, written back on change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiState {
    pub theme: Theme,
    pub online: bool,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            theme: Theme::default(),
            online: true,
        }
    }
}

impl UiState {
    /// Read the persisted theme; unknown or missing values fall back to light.
    pub fn load(store: &impl KeyValueStore) -> Result<Self, StorageError> {
        let theme = store
            .get(THEME_KEY)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        Ok(UiState {
            theme,
            online: true,
        })
    }

    pub fn set_theme(&mut self, theme: Theme, store: &impl KeyValueStore) -> Result<(), StorageError> {
        self.theme = theme;
        store.put(THEME_KEY, &theme.to_string())
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            log::info!("connectivity changed: online={}", online);
        }
        self.online = online;
    }
}
