/// User interface preferences
///
/// Language and theme, persisted independently under their own storage keys.
/// Unknown or missing stored values fall back to the defaults rather than
/// erroring - a stale key must never break startup.
use crate::error::{AppError, AppResult};
use crate::storage::{keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Interface languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Yoruba,
    Igbo,
    Hausa,
    Pidgin,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Yoruba => "yo",
            Language::Igbo => "ig",
            Language::Hausa => "ha",
            Language::Pidgin => "pcm",
        }
    }

    pub fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "en" => Ok(Language::English),
            "yo" => Ok(Language::Yoruba),
            "ig" => Ok(Language::Igbo),
            "ha" => Ok(Language::Hausa),
            "pcm" => Ok(Language::Pidgin),
            _ => Err(AppError::Validation(format!("Invalid language: {}", s))),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Yoruba => "Yorùbá",
            Language::Igbo => "Igbo",
            Language::Hausa => "Hausa",
            Language::Pidgin => "Naijá",
        }
    }
}

/// Interface theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(AppError::Validation(format!("Invalid theme: {}", s))),
        }
    }
}

/// Persisted preference state
pub struct PrefsStore {
    storage: Arc<dyn KeyValueStore>,
    language: RwLock<Language>,
    theme: RwLock<Theme>,
}

impl PrefsStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            language: RwLock::new(Language::default()),
            theme: RwLock::new(Theme::default()),
        }
    }

    /// Hydrate from storage. Unknown values are logged and replaced with
    /// defaults; the bad keys are left in place until the next set.
    pub async fn load(&self) -> AppResult<()> {
        if let Some(stored) = self.storage.get(keys::LANGUAGE).await? {
            match Language::from_str(&stored) {
                Ok(language) => *self.language.write().await = language,
                Err(_) => {
                    tracing::warn!(value = %stored, "Ignoring unknown stored language");
                }
            }
        }

        if let Some(stored) = self.storage.get(keys::THEME).await? {
            match Theme::from_str(&stored) {
                Ok(theme) => *self.theme.write().await = theme,
                Err(_) => {
                    tracing::warn!(value = %stored, "Ignoring unknown stored theme");
                }
            }
        }

        Ok(())
    }

    pub async fn language(&self) -> Language {
        *self.language.read().await
    }

    pub async fn theme(&self) -> Theme {
        *self.theme.read().await
    }

    pub async fn set_language(&self, language: Language) -> AppResult<()> {
        *self.language.write().await = language;
        self.storage.set(keys::LANGUAGE, language.as_str()).await
    }

    pub async fn set_theme(&self, theme: Theme) -> AppResult<()> {
        *self.theme.write().await = theme;
        self.storage.set(keys::THEME, theme.as_str()).await
    }
}
