//! Journal entries
//!
//! This module owns the canonical list of gratitude and good-deed notes:
//! creation from a draft, full-replace edits, favourites, deletion and the
//! archive filters.

use chrono::{Datelike, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::ids::generate_id;
use crate::records::{parse_timestamp, Record, RecordCollection, RecordError, Result};
use crate::sanitize::{escape_html, normalize_escaped};
use storage::{Preferences, StorageKey};

/// Category assigned when the author does not pick one
pub const DEFAULT_CATEGORY: &str = "general";

/// How the author felt when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Peaceful
    Peaceful,
    /// Grateful
    #[default]
    Grateful,
    /// Hopeful
    Hopeful,
    /// Joyful
    Joyful,
    /// Reflective
    Reflective,
    /// Somber
    Somber,
}

/// Which prompt the entry answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    /// Something the author is grateful for
    #[default]
    Gratitude,
    /// A good deed the author saw as a divine action
    AllahAction,
}

/// A journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Unique id
    pub id: String,

    /// Short title
    pub title: String,

    /// Body text
    #[serde(default)]
    pub content: String,

    /// Mood at the time of writing
    #[serde(default, deserialize_with = "or_default")]
    pub mood: Mood,

    /// Prompt answered by this entry
    #[serde(default, deserialize_with = "or_default")]
    pub prompt_type: PromptType,

    /// Free-form category
    #[serde(default = "default_category")]
    pub category: String,

    /// ISO-8601 creation time
    pub timestamp: String,

    /// Whether the entry is marked as a favourite
    #[serde(default)]
    pub is_favorite: bool,
}

impl JournalEntry {
    /// Local calendar date of the entry, if its timestamp is readable
    pub fn local_date(&self) -> Option<chrono::NaiveDate> {
        parse_timestamp(&self.timestamp).map(|ts| ts.with_timezone(&Local).date_naive())
    }
}

impl Record for JournalEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn sanitize(&mut self) {
        self.title = normalize_escaped(&self.title);
        self.content = normalize_escaped(&self.content);
        self.category = normalize_escaped(&self.category);
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Deserialize a value, substituting the default when it has the wrong shape
fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Data collected by the entry form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    /// Short title
    pub title: String,
    /// Body text
    pub content: String,
    /// Mood
    #[serde(default)]
    pub mood: Mood,
    /// Prompt answered
    #[serde(default)]
    pub prompt_type: PromptType,
    /// Category, `general` when empty
    #[serde(default)]
    pub category: String,
}

impl EntryDraft {
    /// Create a draft with default mood, prompt and category
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            mood: Mood::default(),
            prompt_type: PromptType::default(),
            category: String::new(),
        }
    }

    /// Set the mood
    pub fn mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    /// Set the prompt type
    pub fn prompt_type(mut self, prompt_type: PromptType) -> Self {
        self.prompt_type = prompt_type;
        self
    }

    /// Set the category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(RecordError::EmptyText("title"));
        }
        if self.content.trim().is_empty() {
            return Err(RecordError::EmptyText("content"));
        }
        Ok(())
    }
}

/// Archive filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries answering this prompt
    pub prompt_type: Option<PromptType>,
    /// Case-insensitive text searched in title and content
    pub query: Option<String>,
    /// Only entries from this local year
    pub year: Option<i32>,
    /// Only entries from this local month (1-12)
    pub month: Option<u32>,
    /// Only favourites
    pub favorites_only: bool,
}

impl EntryFilter {
    /// Check whether `entry` passes the filter
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(prompt_type) = self.prompt_type {
            if entry.prompt_type != prompt_type {
                return false;
            }
        }

        if self.favorites_only && !entry.is_favorite {
            return false;
        }

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let query = escape_html(query).to_lowercase();
            if !entry.title.to_lowercase().contains(&query)
                && !entry.content.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        if self.year.is_some() || self.month.is_some() {
            let Some(date) = entry.local_date() else {
                return false;
            };
            if self.year.is_some_and(|year| date.year() != year) {
                return false;
            }
            if self.month.is_some_and(|month| date.month() != month) {
                return false;
            }
        }

        true
    }

    /// Filter `entries`, keeping their order
    pub fn apply<'a>(&self, entries: &'a [JournalEntry]) -> Vec<&'a JournalEntry> {
        entries.iter().filter(|entry| self.matches(entry)).collect()
    }
}

/// Distinct local years with at least one entry, newest first
pub fn available_years(entries: &[JournalEntry]) -> Vec<i32> {
    let mut years: Vec<i32> = entries
        .iter()
        .filter_map(|entry| entry.local_date().map(|date| date.year()))
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Journal service for managing entries
pub struct JournalService {
    entries: RecordCollection<JournalEntry>,
    clock: Arc<dyn Clock>,
}

impl JournalService {
    /// Create a new journal service
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>) -> Self {
        Self { entries: RecordCollection::new(store, StorageKey::Entries), clock }
    }

    /// All entries, newest first
    pub async fn list(&self) -> Result<Vec<JournalEntry>> {
        self.entries.list().await
    }

    /// Look up one entry
    pub async fn get(&self, id: &str) -> Result<Option<JournalEntry>> {
        Ok(self.list().await?.into_iter().find(|entry| entry.id == id))
    }

    /// Create an entry from a draft
    ///
    /// # Example
    ///
    /// ```rust
    /// # use app_core::journal::{EntryDraft, JournalService, Mood};
    /// # use app_core::clock::SystemClock;
    /// # use storage::Preferences;
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let service = JournalService::new(Arc::new(Preferences::in_memory()?), Arc::new(SystemClock));
    ///
    /// let entries = service
    ///     .add(EntryDraft::new("Sabah", "Güzel bir gün için şükür").mood(Mood::Peaceful))
    ///     .await?;
    /// assert_eq!(entries.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add(&self, draft: EntryDraft) -> Result<Vec<JournalEntry>> {
        draft.validate()?;

        let now = self.clock.now();
        let category = match draft.category.trim() {
            "" => default_category(),
            category => escape_html(category),
        };

        let entry = JournalEntry {
            id: generate_id(now),
            title: escape_html(draft.title.trim()),
            content: escape_html(draft.content.trim()),
            mood: draft.mood,
            prompt_type: draft.prompt_type,
            category,
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            is_favorite: false,
        };

        self.entries.prepend(entry).await
    }

    /// Replace an entry by id
    ///
    /// The stored id and timestamp are kept; unknown ids are ignored.
    pub async fn update(&self, entry: JournalEntry) -> Result<Vec<JournalEntry>> {
        let id = entry.id.clone();
        self.entries
            .modify(&id, move |existing| {
                let timestamp = std::mem::take(&mut existing.timestamp);
                *existing = entry;
                existing.timestamp = timestamp;
            })
            .await
    }

    /// Delete an entry by id
    pub async fn delete(&self, id: &str) -> Result<Vec<JournalEntry>> {
        self.entries.remove(id).await
    }

    /// Flip the favourite flag of an entry
    pub async fn toggle_favorite(&self, id: &str) -> Result<Vec<JournalEntry>> {
        self.entries
            .modify(id, |entry| entry.is_favorite = !entry.is_favorite)
            .await
    }

    /// Overwrite the whole list
    pub async fn replace_all(&self, entries: &[JournalEntry]) -> Result<()> {
        self.entries.replace_all(entries).await
    }
}
