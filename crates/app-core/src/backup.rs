//! Whole-state backup, restore and wipe
//!
//! A backup is a single pretty-printed JSON document holding the journal,
//! the profile, the settings and the custom prayers. Restoring validates the
//! whole document before anything is written, so a rejected file leaves
//! storage exactly as it was.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::clock::Clock;
use crate::journal::{JournalEntry, DEFAULT_CATEGORY};
use crate::prayers::CustomPrayer;
use crate::profiles::{ProfileService, UserProfile};
use crate::records::{parse_timestamp, Record, RecordCollection, RecordError};
use crate::settings::SettingsService;
use storage::{AppSettings, Preferences, StorageError, StorageKey};

/// Default import size limit (5 MiB)
pub const DEFAULT_MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

/// Errors that can occur while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Record list could not be read
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while importing
///
/// Every variant except [`ImportError::Storage`] is raised before any write.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Payload exceeds the configured size limit
    #[error("Backup is {size} bytes, limit is {max}")]
    PayloadTooLarge {
        /// Payload size in bytes
        size: usize,
        /// Configured limit in bytes
        max: usize,
    },

    /// Payload is not JSON
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// Payload is JSON but not a backup document
    #[error("Invalid backup schema: {0}")]
    InvalidSchema(String),

    /// Storage error while writing the restored state
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ImportError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PayloadTooLarge { .. } => "The backup file is too large.",
            Self::MalformedJson(_) => "The backup file is unreadable.",
            Self::InvalidSchema(_) => "The file is not a valid backup.",
            Self::Storage(_) => "The backup could not be saved. Please try again.",
        }
    }
}

/// Result type for import operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Backup configuration
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Largest accepted import payload in bytes
    pub max_import_bytes: usize,

    /// Version written into exported documents
    pub app_version: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl BackupConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the import size limit
    pub fn with_max_import_bytes(mut self, max: usize) -> Self {
        self.max_import_bytes = max;
        self
    }

    /// Set the version written into exports
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }
}

/// Exported document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    /// Journal entries, newest first
    pub entries: Vec<JournalEntry>,
    /// Profile, if one was ever saved
    pub profile: Option<UserProfile>,
    /// Settings merged over defaults
    pub settings: AppSettings,
    /// Custom prayers, newest first
    pub custom_prayers: Vec<CustomPrayer>,
    /// ISO-8601 export time
    pub export_date: String,
    /// Version of the exporting application
    pub app_version: String,
}

/// What a successful import restored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Entries written
    pub entries_imported: usize,
    /// Entries skipped for missing or malformed required fields
    pub entries_dropped: usize,
    /// Whether the profile was replaced
    pub profile_restored: bool,
    /// Whether the settings were replaced
    pub settings_restored: bool,
    /// Custom prayers written, if the document carried them
    pub prayers_imported: Option<usize>,
}

/// UI-facing import result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Whether the import succeeded
    pub success: bool,
    /// Message to show
    pub message: String,
}

impl From<std::result::Result<ImportSummary, ImportError>> for ImportOutcome {
    fn from(result: std::result::Result<ImportSummary, ImportError>) -> Self {
        match result {
            Ok(summary) => Self {
                success: true,
                message: format!(
                    "Backup restored: {} entries imported.",
                    summary.entries_imported
                ),
            },
            Err(e) => Self { success: false, message: e.user_message().to_string() },
        }
    }
}

/// Everything an import will write, built before the first write
#[derive(Debug, Default)]
struct ImportPlan {
    entries: Vec<JournalEntry>,
    dropped: usize,
    profile: Option<UserProfile>,
    settings: Option<AppSettings>,
    prayers: Option<Vec<CustomPrayer>>,
}

impl ImportPlan {
    fn from_document(document: &Map<String, Value>) -> Result<Self> {
        let raw_entries = document
            .get("entries")
            .and_then(Value::as_array)
            .ok_or_else(|| ImportError::InvalidSchema("missing entries array".to_string()))?;

        let entries: Vec<JournalEntry> = raw_entries.iter().filter_map(entry_from_value).collect();
        let dropped = raw_entries.len() - entries.len();
        if dropped > 0 {
            tracing::warn!("Dropping {} malformed entries from backup", dropped);
        }

        let profile = match document.get("profile") {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value::<UserProfile>(value.clone()) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Ignoring malformed profile in backup: {}", e);
                    None
                }
            },
        };

        let settings = match document.get("settings") {
            Some(value @ Value::Object(_)) => {
                match serde_json::from_value::<AppSettings>(value.clone()) {
                    Ok(settings) => Some(settings),
                    Err(e) => {
                        tracing::warn!("Ignoring malformed settings in backup: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let prayers = document
            .get("customPrayers")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().filter_map(prayer_from_value).collect());

        Ok(Self { entries, dropped, profile, settings, prayers })
    }
}

fn string_field<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    object.get(field).and_then(Value::as_str)
}

/// Rebuild an entry, keeping it only if `id`, `title` and `timestamp` are
/// strings and the timestamp parses
///
/// Optional fields of the wrong type fall back to their defaults.
fn entry_from_value(value: &Value) -> Option<JournalEntry> {
    let object = value.as_object()?;
    let id = string_field(object, "id")?;
    let title = string_field(object, "title")?;
    let timestamp = string_field(object, "timestamp")?;
    parse_timestamp(timestamp)?;

    let mut entry = JournalEntry {
        id: id.to_string(),
        title: title.to_string(),
        content: string_field(object, "content").unwrap_or_default().to_string(),
        mood: object
            .get("mood")
            .and_then(|mood| serde_json::from_value(mood.clone()).ok())
            .unwrap_or_default(),
        prompt_type: object
            .get("promptType")
            .and_then(|prompt| serde_json::from_value(prompt.clone()).ok())
            .unwrap_or_default(),
        category: string_field(object, "category")
            .filter(|category| !category.trim().is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        timestamp: timestamp.to_string(),
        is_favorite: object.get("isFavorite").and_then(Value::as_bool).unwrap_or(false),
    };
    entry.sanitize();
    Some(entry)
}

fn prayer_from_value(value: &Value) -> Option<CustomPrayer> {
    let object = value.as_object()?;
    let mut prayer = CustomPrayer {
        id: string_field(object, "id")?.to_string(),
        text: string_field(object, "text")?.to_string(),
        timestamp: string_field(object, "timestamp")?.to_string(),
    };
    prayer.sanitize();
    Some(prayer)
}

/// Backup service
pub struct BackupService {
    store: Arc<Preferences>,
    clock: Arc<dyn Clock>,
    config: BackupConfig,
    entries: RecordCollection<JournalEntry>,
    prayers: RecordCollection<CustomPrayer>,
    profiles: ProfileService,
    settings: SettingsService,
}

impl BackupService {
    /// Create a new backup service
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>, config: BackupConfig) -> Self {
        Self {
            entries: RecordCollection::new(Arc::clone(&store), StorageKey::Entries),
            prayers: RecordCollection::new(Arc::clone(&store), StorageKey::CustomPrayers),
            profiles: ProfileService::new(Arc::clone(&store), Arc::clone(&clock)),
            settings: SettingsService::new(Arc::clone(&store)),
            store,
            clock,
            config,
        }
    }

    /// Backup configuration
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> std::result::Result<BackupDocument, ExportError> {
        Ok(BackupDocument {
            entries: self.entries.list().await?,
            profile: self.profiles.get().await?,
            settings: self.settings.get().await?,
            custom_prayers: self.prayers.list().await?,
            export_date: self
                .clock
                .now()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            app_version: self.config.app_version.clone(),
        })
    }

    /// Export the current state as pretty-printed JSON
    pub async fn export_all_data(&self) -> std::result::Result<String, ExportError> {
        let document = self.snapshot().await?;
        let json = serde_json::to_string_pretty(&document)?;

        tracing::info!(
            "Exported {} entries and {} custom prayers",
            document.entries.len(),
            document.custom_prayers.len()
        );
        Ok(json)
    }

    /// Restore state from an exported document
    ///
    /// The entry list is always replaced, even when every entry was dropped.
    /// Profile, settings and custom prayers are replaced only when present and
    /// well-shaped.
    pub async fn import_all_data(&self, json: &str) -> Result<ImportSummary> {
        if json.len() > self.config.max_import_bytes {
            return Err(ImportError::PayloadTooLarge {
                size: json.len(),
                max: self.config.max_import_bytes,
            });
        }

        let value: Value = serde_json::from_str(json).map_err(ImportError::MalformedJson)?;
        let document = value
            .as_object()
            .ok_or_else(|| ImportError::InvalidSchema("backup is not a JSON object".to_string()))?;
        let plan = ImportPlan::from_document(document)?;

        let mut summary = ImportSummary {
            entries_imported: plan.entries.len(),
            entries_dropped: plan.dropped,
            ..ImportSummary::default()
        };

        self.store.set_json(StorageKey::Entries, &plan.entries).await?;

        if let Some(profile) = plan.profile {
            self.profiles.save(profile).await?;
            summary.profile_restored = true;
        }

        if let Some(settings) = plan.settings {
            self.settings.save(&settings).await?;
            summary.settings_restored = true;
        }

        if let Some(prayers) = plan.prayers {
            self.store.set_json(StorageKey::CustomPrayers, &prayers).await?;
            summary.prayers_imported = Some(prayers.len());
        }

        tracing::info!(
            "Imported {} entries ({} dropped)",
            summary.entries_imported,
            summary.entries_dropped
        );
        Ok(summary)
    }

    /// Import and convert the result for display
    pub async fn import_for_display(&self, json: &str) -> ImportOutcome {
        let result = self.import_all_data(json).await;
        if let Err(e) = &result {
            tracing::warn!("Import failed: {}", e);
        }
        result.into()
    }

    /// Remove every stored key except the agreement flag
    pub async fn delete_all_data(&self) -> std::result::Result<(), StorageError> {
        for key in StorageKey::wipeable() {
            self.store.remove(key).await?;
        }

        tracing::info!("All local data deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::journal::{EntryDraft, JournalService, Mood};
    use crate::prayers::CustomPrayerService;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct Fixture {
        store: Arc<Preferences>,
        journal: JournalService,
        prayers: CustomPrayerService,
        backup: BackupService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(Preferences::in_memory().unwrap());
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()));
        Fixture {
            journal: JournalService::new(Arc::clone(&store), Arc::clone(&clock)),
            prayers: CustomPrayerService::new(Arc::clone(&store), Arc::clone(&clock)),
            backup: BackupService::new(
                Arc::clone(&store),
                clock,
                BackupConfig::new().with_app_version("1.2.3"),
            ),
            store,
        }
    }

    #[tokio::test]
    async fn test_export_shape() {
        let f = fixture();
        f.journal.add(EntryDraft::new("Sabah", "Güneş")).await.unwrap();
        f.prayers.add("Rabbim kolaylaştır").await.unwrap();

        let json = f.backup.export_all_data().await.unwrap();
        assert!(json.contains('\n'));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entries"].as_array().unwrap().len(), 1);
        assert!(value["profile"].is_null());
        assert_eq!(value["settings"]["language"], "tr");
        assert_eq!(value["customPrayers"].as_array().unwrap().len(), 1);
        assert_eq!(value["exportDate"], "2025-03-01T12:00:00.000Z");
        assert_eq!(value["appVersion"], "1.2.3");
    }

    #[tokio::test]
    async fn test_round_trip_restores_state() {
        let source = fixture();
        source
            .journal
            .add(EntryDraft::new("Aile", "Sofra").mood(Mood::Joyful))
            .await
            .unwrap();
        source.prayers.add("Şifa ver").await.unwrap();
        let json = source.backup.export_all_data().await.unwrap();

        let target = fixture();
        let summary = target.backup.import_all_data(&json).await.unwrap();
        assert_eq!(summary.entries_imported, 1);
        assert_eq!(summary.entries_dropped, 0);
        assert!(summary.settings_restored);
        assert!(!summary.profile_restored);
        assert_eq!(summary.prayers_imported, Some(1));

        assert_eq!(target.journal.list().await.unwrap(), source.journal.list().await.unwrap());
        assert_eq!(target.prayers.list().await.unwrap(), source.prayers.list().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_entries_rejected_without_writes() {
        let f = fixture();
        f.journal.add(EntryDraft::new("Kalsın", "x")).await.unwrap();

        for payload in [r#"{"profile":null}"#, r#"{"entries":{}}"#, "[]", "42"] {
            let err = f.backup.import_all_data(payload).await.unwrap_err();
            assert!(matches!(err, ImportError::InvalidSchema(_)), "{payload}");
        }
        assert_eq!(f.journal.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let f = fixture();
        let err = f.backup.import_all_data("{entries: [").await.unwrap_err();
        assert!(matches!(err, ImportError::MalformedJson(_)));
        assert_eq!(err.user_message(), "The backup file is unreadable.");
        assert!(f.store.get(StorageKey::Entries).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let store = Arc::new(Preferences::in_memory().unwrap());
        let backup = BackupService::new(
            store,
            Arc::new(crate::clock::SystemClock),
            BackupConfig::new().with_max_import_bytes(16),
        );

        let err = backup.import_all_data(r#"{"entries":[],"pad":"xxxx"}"#).await.unwrap_err();
        assert!(matches!(err, ImportError::PayloadTooLarge { max: 16, .. }));
    }

    #[tokio::test]
    async fn test_payload_at_limit_accepted() {
        let payload = r#"{"entries":[],"pad":"xx"}"#;
        let limited = |max: usize| {
            BackupService::new(
                Arc::new(Preferences::in_memory().unwrap()),
                Arc::new(crate::clock::SystemClock),
                BackupConfig::new().with_max_import_bytes(max),
            )
        };

        let summary = limited(payload.len()).import_all_data(payload).await.unwrap();
        assert_eq!(summary.entries_imported, 0);

        let err = limited(payload.len() - 1).import_all_data(payload).await.unwrap_err();
        assert!(matches!(err, ImportError::PayloadTooLarge { size, .. } if size == payload.len()));
    }

    #[tokio::test]
    async fn test_malformed_entries_dropped_and_escaped() {
        let f = fixture();
        f.journal.add(EntryDraft::new("Eski", "silinecek")).await.unwrap();

        let payload = json!({
            "entries": [
                {"id": "a", "title": "<i>Yağmur</i>", "timestamp": "2025-02-01T08:00:00.000Z",
                 "mood": "unknown", "isFavorite": "yes"},
                {"id": 7, "title": "bad id", "timestamp": "2025-02-02T08:00:00.000Z"},
                {"id": "c", "timestamp": "2025-02-03T08:00:00.000Z"},
                {"id": "d", "title": "bad time", "timestamp": "yesterday"},
                "not an object"
            ],
            "settings": "dark",
            "customPrayers": null
        })
        .to_string();

        let summary = f.backup.import_all_data(&payload).await.unwrap();
        assert_eq!(summary.entries_imported, 1);
        assert_eq!(summary.entries_dropped, 4);
        assert!(!summary.settings_restored);
        assert_eq!(summary.prayers_imported, None);

        let entries = f.journal.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "&lt;i&gt;Yağmur&lt;/i&gt;");
        assert_eq!(entries[0].mood, Mood::Grateful);
        assert_eq!(entries[0].category, DEFAULT_CATEGORY);
        assert!(!entries[0].is_favorite);
    }

    #[tokio::test]
    async fn test_empty_entries_replace_existing() {
        let f = fixture();
        f.journal.add(EntryDraft::new("Gidecek", "x")).await.unwrap();

        let summary = f.backup.import_all_data(r#"{"entries":[]}"#).await.unwrap();
        assert_eq!(summary.entries_imported, 0);
        assert!(f.journal.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_restored_and_sanitized() {
        let f = fixture();
        let payload = json!({
            "entries": [],
            "profile": {
                "id": "user_1", "name": "<Ali>", "title": "Yolcu", "avatarId": "avatar_3",
                "joinedDate": "2024-01-01T00:00:00.000Z", "streak": 4,
                "badges": ["start_journey", "start_journey"]
            }
        })
        .to_string();

        let summary = f.backup.import_all_data(&payload).await.unwrap();
        assert!(summary.profile_restored);

        let profile: UserProfile = f.store.get_json(StorageKey::Profile).await.unwrap().unwrap();
        assert_eq!(profile.name, "&lt;Ali&gt;");
        assert_eq!(profile.badges, vec!["start_journey"]);
    }

    #[tokio::test]
    async fn test_outcome_messages() {
        let f = fixture();
        let ok = f.backup.import_for_display(r#"{"entries":[]}"#).await;
        assert!(ok.success);

        let failed = f.backup.import_for_display("nope").await;
        assert!(!failed.success);
        assert_eq!(failed.message, "The backup file is unreadable.");
    }

    #[tokio::test]
    async fn test_delete_all_keeps_agreement() {
        let f = fixture();
        for key in storage::StorageKey::ALL {
            f.store.set(key, "[]").await.unwrap();
        }

        f.backup.delete_all_data().await.unwrap();

        for key in storage::StorageKey::ALL {
            let present = f.store.get(key).await.unwrap().is_some();
            assert_eq!(present, key == StorageKey::AgreementAccepted, "{key}");
        }
    }
}
