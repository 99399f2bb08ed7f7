use crate::store::{Edit, KeyValueCollection, KeyValueStore};
use anyhow::{Result, anyhow};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

pub const COLLECTION: &str = "settings";

const UI_THEME_KEY: &str = "ui_theme";
const CURRENCY_KEY: &str = "currency_symbol";
const LANGUAGE_KEY: &str = "app_language";

pub const DEFAULT_CURRENCY: &str = "€";
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppTheme {
    Light,
    Dark,
    #[default]
    System,
}

impl AppTheme {
    pub fn key(&self) -> &'static str {
        match self {
            AppTheme::Light => "light",
            AppTheme::Dark => "dark",
            AppTheme::System => "system",
        }
    }

    /// Unknown keys fall back to following the system theme.
    pub fn from_key(key: &str) -> Self {
        key.parse().unwrap_or_default()
    }
}

impl Display for AppTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for AppTheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(AppTheme::Light),
            "dark" => Ok(AppTheme::Dark),
            "system" => Ok(AppTheme::System),
            _ => Err(anyhow!("Invalid theme: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub theme: AppTheme,
    pub currency: String,
    pub language: String,
}

/// User preferences with live reads and atomic writes.
pub struct SettingsStore {
    collection: Arc<dyn KeyValueCollection>,
    settings: watch::Sender<Settings>,
    currency: watch::Sender<String>,
    writes: Mutex<()>,
}

impl SettingsStore {
    pub fn open(store: &KeyValueStore) -> Result<Self> {
        let collection = store.collection(COLLECTION)?;
        let initial = load(collection.as_ref())?;
        let (currency, _) = watch::channel(initial.currency.clone());
        let (settings, _) = watch::channel(initial);
        Ok(Self {
            collection,
            settings,
            currency,
            writes: Mutex::new(()),
        })
    }

    pub fn observe(&self) -> watch::Receiver<Settings> {
        self.settings.subscribe()
    }

    /// Live display currency; only notifies when the value actually changes.
    pub fn observe_display_currency(&self) -> watch::Receiver<String> {
        self.currency.subscribe()
    }

    pub fn current(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub async fn set_theme(&self, theme: AppTheme) -> Result<()> {
        self.write(UI_THEME_KEY, theme.key())
    }

    pub async fn set_display_currency(&self, currency: &str) -> Result<()> {
        let currency = currency.trim();
        if currency.is_empty() {
            return Err(anyhow!("Display currency cannot be empty"));
        }
        self.write(CURRENCY_KEY, currency)
    }

    pub async fn set_language(&self, language: &str) -> Result<()> {
        let language = language.trim();
        if language.is_empty() {
            return Err(anyhow!("Language cannot be empty"));
        }
        self.write(LANGUAGE_KEY, language)
    }

    /// Applies one key and publishes both live reads while holding the write lock.
    fn write(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.collection
            .apply(vec![Edit::Put(key.to_string(), value.as_bytes().to_vec())])?;
        debug!("Saved setting {} = {}", key, value);

        let settings = load(self.collection.as_ref())?;
        self.currency.send_if_modified(|current| {
            if *current == settings.currency {
                return false;
            }
            current.clone_from(&settings.currency);
            true
        });
        self.settings.send_replace(settings);
        Ok(())
    }
}

fn read(collection: &dyn KeyValueCollection, key: &str) -> Result<Option<String>> {
    Ok(collection
        .get(key)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

fn load(collection: &dyn KeyValueCollection) -> Result<Settings> {
    Ok(Settings {
        theme: read(collection, UI_THEME_KEY)?
            .map(|key| AppTheme::from_key(&key))
            .unwrap_or_default(),
        currency: read(collection, CURRENCY_KEY)?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        language: read(collection, LANGUAGE_KEY)?.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
    })
}
