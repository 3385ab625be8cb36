//! Theme selection.
//!
//! The recognized themes and their palettes are a fixed table; the selection
//! is an explicit value loaded from and saved to any [`KeyValueStore`].

use crate::errors::ValidationError;
use crate::models::UserId;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKey {
    #[default]
    Light,
    Dark,
    Forest,
    Ocean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#f8f3e6",
    surface: "#ffffff",
    text: "#2b2a28",
    muted: "#8b857d",
    accent: "#ff6b4a",
};

const DARK: Palette = Palette {
    background: "#16181d",
    surface: "#22252c",
    text: "#e8e6e3",
    muted: "#8f96a3",
    accent: "#7aa2f7",
};

const FOREST: Palette = Palette {
    background: "#eef3ea",
    surface: "#ffffff",
    text: "#1f2d1f",
    muted: "#6b7f67",
    accent: "#3f7d3a",
};

const OCEAN: Palette = Palette {
    background: "#e8f1f8",
    surface: "#ffffff",
    text: "#17293a",
    muted: "#62798f",
    accent: "#2f6fa3",
};

impl ThemeKey {
    pub const ALL: [ThemeKey; 4] = [
        ThemeKey::Light,
        ThemeKey::Dark,
        ThemeKey::Forest,
        ThemeKey::Ocean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeKey::Light => "light",
            ThemeKey::Dark => "dark",
            ThemeKey::Forest => "forest",
            ThemeKey::Ocean => "ocean",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or(ValidationError::UnknownTheme(value))
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            ThemeKey::Light => &LIGHT,
            ThemeKey::Dark => &DARK,
            ThemeKey::Forest => &FOREST,
            ThemeKey::Ocean => &OCEAN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeSettings {
    pub theme: ThemeKey,
    pub palette: &'static Palette,
}

impl ThemeSettings {
    pub fn new(theme: ThemeKey) -> Self {
        Self {
            theme,
            palette: theme.palette(),
        }
    }

    fn storage_key(user_id: UserId) -> String {
        format!("theme:{user_id}")
    }

    /// Unknown stored values fall back to the default theme.
    pub fn load(store: &impl KeyValueStore, user_id: UserId) -> Self {
        let theme = match store.get(&Self::storage_key(user_id)) {
            Some(value) => ThemeKey::parse(&value).unwrap_or_else(|err| {
                warn!(user_id, "ignoring stored theme: {err}");
                ThemeKey::default()
            }),
            None => ThemeKey::default(),
        };
        Self::new(theme)
    }

    pub fn save(&self, store: &mut impl KeyValueStore, user_id: UserId) {
        store.set(&Self::storage_key(user_id), self.theme.as_str().to_string());
    }
}
