//! User settings access
//!
//! Stored JSON is read over [`AppSettings`] defaults, so payloads written
//! before a setting existed still load.

use std::sync::Arc;

use storage::{AppSettings, Preferences, StorageError, StorageKey};

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Settings service
pub struct SettingsService {
    store: Arc<Preferences>,
}

impl SettingsService {
    /// Create a new settings service
    pub fn new(store: Arc<Preferences>) -> Self {
        Self { store }
    }

    /// Current settings; defaults when nothing readable is stored
    pub async fn get(&self) -> Result<AppSettings> {
        match self.store.get_json::<AppSettings>(StorageKey::Settings).await {
            Ok(settings) => Ok(settings.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Stored settings unreadable, using defaults: {}", e);
                Ok(AppSettings::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Persist settings
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        self.store.set_json(StorageKey::Settings, settings).await
    }

    /// Read, modify and persist settings
    pub async fn update<F>(&self, f: F) -> Result<AppSettings>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut settings = self.get().await?;
        f(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }
}
