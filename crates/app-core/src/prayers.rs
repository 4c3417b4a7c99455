//! User-authored prayers

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::ids::generate_id;
use crate::records::{Record, RecordCollection, RecordError, Result};
use crate::sanitize::{escape_html, normalize_escaped};
use storage::{Preferences, StorageKey};

/// A prayer written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPrayer {
    /// Unique id
    pub id: String,
    /// Escaped prayer text
    pub text: String,
    /// ISO-8601 creation time
    pub timestamp: String,
}

impl Record for CustomPrayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn sanitize(&mut self) {
        self.text = normalize_escaped(&self.text);
    }
}

/// Service for the user's own prayers
pub struct CustomPrayerService {
    prayers: RecordCollection<CustomPrayer>,
    clock: Arc<dyn Clock>,
}

impl CustomPrayerService {
    /// Create a new prayer service
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>) -> Self {
        Self { prayers: RecordCollection::new(store, StorageKey::CustomPrayers), clock }
    }

    /// All prayers, newest first
    pub async fn list(&self) -> Result<Vec<CustomPrayer>> {
        self.prayers.list().await
    }

    /// Add a prayer
    pub async fn add(&self, text: &str) -> Result<Vec<CustomPrayer>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RecordError::EmptyText("prayer"));
        }

        let now = self.clock.now();
        let prayer = CustomPrayer {
            id: generate_id(now),
            text: escape_html(text),
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };

        self.prayers.prepend(prayer).await
    }

    /// Replace a prayer's text by id
    ///
    /// The stored timestamp is kept; unknown ids are ignored.
    pub async fn update(&self, prayer: CustomPrayer) -> Result<Vec<CustomPrayer>> {
        let text = prayer.text.trim();
        if text.is_empty() {
            return Err(RecordError::EmptyText("prayer"));
        }

        let text = text.to_string();
        self.prayers.modify(&prayer.id, move |existing| existing.text = text).await
    }

    /// Delete a prayer by id
    pub async fn delete(&self, id: &str) -> Result<Vec<CustomPrayer>> {
        self.prayers.remove(id).await
    }

    /// Overwrite the whole list
    pub async fn replace_all(&self, prayers: &[CustomPrayer]) -> Result<()> {
        self.prayers.replace_all(prayers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, Utc};

    fn service() -> (Arc<FixedClock>, CustomPrayerService) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let store = Arc::new(Preferences::in_memory().unwrap());
        (Arc::clone(&clock), CustomPrayerService::new(store, clock))
    }

    #[tokio::test]
    async fn test_add_escapes_script() {
        let (_, service) = service();

        let prayers = service.add("<script>x</script>").await.unwrap();
        assert_eq!(prayers[0].text, "&lt;script&gt;x&lt;/script&gt;");

        let stored = service.list().await.unwrap();
        assert!(!stored[0].text.contains('<'));
    }

    #[tokio::test]
    async fn test_add_blank_rejected() {
        let (_, service) = service();
        assert!(matches!(service.add("   ").await, Err(RecordError::EmptyText(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_timestamp() {
        let (clock, service) = service();
        let mut prayer = service.add("İlk hâli").await.unwrap().remove(0);
        let timestamp = prayer.timestamp.clone();

        clock.advance(Duration::hours(1));
        prayer.text = "<b>Yeni</b> hâli".to_string();
        prayer.timestamp = "2000-01-01T00:00:00.000Z".to_string();
        let prayers = service.update(prayer).await.unwrap();

        assert_eq!(prayers[0].text, "&lt;b&gt;Yeni&lt;/b&gt; hâli");
        assert_eq!(prayers[0].timestamp, timestamp);

        let missing = CustomPrayer {
            id: "missing".to_string(),
            text: "x".to_string(),
            timestamp: timestamp.clone(),
        };
        assert_eq!(service.update(missing).await.unwrap(), prayers);
    }

    #[tokio::test]
    async fn test_newest_first_and_delete() {
        let (clock, service) = service();

        service.add("Rabbim kolaylaştır").await.unwrap();
        clock.advance(Duration::minutes(5));
        let prayers = service.add("Rabbim sabır ver").await.unwrap();
        assert_eq!(prayers[0].text, "Rabbim sabır ver");

        let id = prayers[1].id.clone();
        let prayers = service.delete(&id).await.unwrap();
        assert_eq!(prayers.len(), 1);
        assert_eq!(service.list().await.unwrap(), prayers);
    }
}
