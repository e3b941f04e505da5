//! Display theme preference

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SaverError};
use crate::storage::KeyValueStore;

/// Persisted key holding the theme preference.
pub const THEME_KEY: &str = "popupTheme";

/// Control surface colour scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark background
    Dark,
    /// Light background
    Light,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Theme matching a system dark-mode preference.
    pub fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

impl FromStr for Theme {
    type Err = SaverError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(SaverError::Config(format!("Unknown theme: {}", other))),
        }
    }
}

/// Read the stored theme. Unknown values count as unset.
pub async fn load_theme(kv: &dyn KeyValueStore) -> Result<Option<Theme>> {
    let Some(value) = kv.get(THEME_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_value::<Theme>(value.clone()) {
        Ok(theme) => Ok(Some(theme)),
        Err(_) => {
            tracing::warn!(value = %value, "Ignoring unrecognized stored theme");
            Ok(None)
        }
    }
}

/// Persist `theme`.
pub async fn save_theme(kv: &dyn KeyValueStore, theme: Theme) -> Result<()> {
    let value = serde_json::to_value(theme).map_err(SaverError::Serialization)?;
    kv.set(THEME_KEY, value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_toggle_and_parse() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!(Theme::from_system(true), Theme::Dark);
    }

    #[tokio::test]
    async fn test_persisted_as_lowercase_string() {
        let kv = MemoryStore::new();
        save_theme(&kv, Theme::Light).await.unwrap();
        assert_eq!(kv.get(THEME_KEY).await.unwrap(), Some(json!("light")));
        assert_eq!(load_theme(&kv).await.unwrap(), Some(Theme::Light));
    }

    #[tokio::test]
    async fn test_unknown_stored_value_is_unset() {
        let kv = MemoryStore::new();
        kv.set(THEME_KEY, json!("sepia")).await.unwrap();
        assert_eq!(load_theme(&kv).await.unwrap(), None);
    }
}
