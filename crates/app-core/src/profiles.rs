//! The local user profile
//!
//! Exactly one profile exists per device. It is created with defaults on
//! first run and rewritten whenever the streak, badges or personal details
//! change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::sanitize::normalize_escaped;
use storage::{Preferences, StorageError, StorageKey};

/// Result type for profile operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Default profile id
pub const DEFAULT_PROFILE_ID: &str = "user_1";
/// Default display name
pub const DEFAULT_NAME: &str = "Misafir";
/// Default title
pub const DEFAULT_TITLE: &str = "Şükür Yolcusu";
/// Default avatar
pub const DEFAULT_AVATAR: &str = "avatar_1";

/// User profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Profile id
    pub id: String,
    /// Display name
    pub name: String,
    /// Display title
    pub title: String,
    /// Selected avatar
    pub avatar_id: String,
    /// ISO-8601 time the profile was created
    pub joined_date: String,
    /// Current streak in days
    #[serde(default)]
    pub streak: u32,
    /// Earned badge ids in the order they were earned
    #[serde(default)]
    pub badges: Vec<String>,
}

impl UserProfile {
    /// Default profile for a user joining at `joined`
    pub fn new_default(joined: DateTime<Utc>) -> Self {
        Self {
            id: DEFAULT_PROFILE_ID.to_string(),
            name: DEFAULT_NAME.to_string(),
            title: DEFAULT_TITLE.to_string(),
            avatar_id: DEFAULT_AVATAR.to_string(),
            joined_date: joined.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            streak: 0,
            badges: Vec::new(),
        }
    }

    /// Append badges that are not already present
    pub fn award_badges<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for id in ids {
            if !self.badges.contains(&id) {
                self.badges.push(id);
            }
        }
    }

    /// Check if a badge has been earned
    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|badge| badge == id)
    }

    /// Drop repeated badge ids, keeping the first occurrence
    fn dedup_badges(&mut self) {
        let badges = std::mem::take(&mut self.badges);
        self.award_badges(badges);
    }
}

/// Profile service
pub struct ProfileService {
    store: Arc<Preferences>,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The stored profile, if any
    ///
    /// An unreadable payload is logged and treated as absent.
    pub async fn get(&self) -> Result<Option<UserProfile>> {
        match self.store.get_json(StorageKey::Profile).await {
            Ok(profile) => Ok(profile),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable profile: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The stored profile, or a fresh default one (not persisted)
    pub async fn get_or_default(&self) -> Result<UserProfile> {
        Ok(self
            .get()
            .await?
            .unwrap_or_else(|| UserProfile::new_default(self.clock.now())))
    }

    /// Persist `profile`, returning the stored form
    ///
    /// Name and title are escaped and repeated badges dropped before writing.
    pub async fn save(&self, mut profile: UserProfile) -> Result<UserProfile> {
        profile.name = normalize_escaped(profile.name.trim());
        profile.title = normalize_escaped(profile.title.trim());
        profile.dedup_badges();

        self.store.set_json(StorageKey::Profile, &profile).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn service() -> (Arc<Preferences>, ProfileService) {
        let store = Arc::new(Preferences::in_memory().unwrap());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        (Arc::clone(&store), ProfileService::new(store, clock))
    }

    #[tokio::test]
    async fn test_default_profile() {
        let (_, service) = service();

        assert!(service.get().await.unwrap().is_none());
        let profile = service.get_or_default().await.unwrap();
        assert_eq!(profile.id, DEFAULT_PROFILE_ID);
        assert_eq!(profile.name, DEFAULT_NAME);
        assert_eq!(profile.joined_date, "2025-01-01T00:00:00.000Z");
        assert_eq!(profile.streak, 0);
        assert!(profile.badges.is_empty());

        // Defaults are not written until saved
        assert!(service.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_dedups_and_escapes() {
        let (_, service) = service();
        let mut profile = service.get_or_default().await.unwrap();
        profile.name = " <Ayşe> ".to_string();
        profile.badges = vec![
            "start_journey".to_string(),
            "week_streak".to_string(),
            "start_journey".to_string(),
        ];

        let saved = service.save(profile).await.unwrap();
        assert_eq!(saved.name, "&lt;Ayşe&gt;");
        assert_eq!(saved.badges, vec!["start_journey", "week_streak"]);
        assert_eq!(service.get().await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_unreadable_profile_is_absent() {
        let (store, service) = service();
        store.set(StorageKey::Profile, "[1,2,3]").await.unwrap();
        assert!(service.get().await.unwrap().is_none());
    }

    #[test]
    fn test_award_badges() {
        let mut profile = UserProfile::new_default(Utc::now());
        profile.award_badges(vec!["start_journey".to_string()]);
        profile.award_badges(vec!["start_journey".to_string(), "week_streak".to_string()]);

        assert_eq!(profile.badges, vec!["start_journey", "week_streak"]);
        assert!(profile.has_badge("week_streak"));
        assert!(!profile.has_badge("master_streak"));
    }

    #[test]
    fn test_camel_case_fields() {
        let profile = UserProfile::new_default(Utc::now());
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("avatarId").is_some());
        assert!(json.get("joinedDate").is_some());
    }
}
