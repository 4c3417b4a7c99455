//! Persisted user settings schema
//!
//! Every field carries a serde default so that payloads written by older
//! releases keep loading after new settings are introduced.

use serde::{Deserialize, Serialize};

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Turkish
    #[default]
    Tr,
    /// English
    En,
}

/// User settings stored under the `settings` key
///
/// # Example
///
/// ```rust
/// use storage::app_state::{AppSettings, Language};
///
/// let settings: AppSettings = serde_json::from_str(r#"{"enableNotifications":true}"#).unwrap();
/// assert_eq!(settings.language, Language::Tr);
/// assert!(settings.enable_notifications);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Interface language
    pub language: Language,

    /// Daily reminder time as `HH:MM`, if reminders are configured
    pub daily_reminder_time: Option<String>,

    /// Whether local notifications are enabled
    pub enable_notifications: bool,
}

impl AppSettings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a daily reminder should be scheduled
    pub fn reminder_active(&self) -> bool {
        self.enable_notifications && self.daily_reminder_time.is_some()
    }
}
