//! Shared list persistence for timestamped records
//!
//! Entries, custom prayers and user messages are all stored the same way: a
//! JSON array under one key, read back newest first, rewritten in full on
//! every change.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

use storage::{Preferences, StorageError, StorageKey};

/// Errors that can occur during record operations
#[derive(Debug, Error)]
pub enum RecordError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A required text field was blank
    #[error("{0} must not be empty")]
    EmptyText(&'static str),

    /// A text field exceeded its length limit
    #[error("{field} exceeds {max} characters")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Maximum length in graphemes
        max: usize,
    },
}

/// Result type for record operations
pub type Result<T> = std::result::Result<T, RecordError>;

/// A record kept in a timestamped list
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Unique id
    fn id(&self) -> &str;

    /// ISO-8601 creation time
    fn timestamp(&self) -> &str;

    /// Bring user-entered text fields into escaped stored form in place
    fn sanitize(&mut self);
}

/// Parse an ISO-8601 timestamp
///
/// Offsets are honoured; timestamps without one are read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

/// Sort newest first; records with unreadable timestamps go last
pub fn sort_newest_first<T: Record>(records: &mut [T]) {
    records.sort_by_cached_key(|record| std::cmp::Reverse(parse_timestamp(record.timestamp())));
}

/// A JSON array of records stored under one key
pub struct RecordCollection<T> {
    store: Arc<Preferences>,
    key: StorageKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> RecordCollection<T> {
    /// Create a collection stored under `key`
    pub fn new(store: Arc<Preferences>, key: StorageKey) -> Self {
        Self { store, key, _marker: PhantomData }
    }

    /// The key this collection is stored under
    pub fn key(&self) -> StorageKey {
        self.key
    }

    /// Read every record, newest first
    ///
    /// An unreadable payload is logged and treated as an empty list.
    pub async fn list(&self) -> Result<Vec<T>> {
        let mut records = match self.store.get_json::<Vec<T>>(self.key).await {
            Ok(records) => records.unwrap_or_default(),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable {} payload: {}", self.key, e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Overwrite the stored list
    pub async fn replace_all(&self, records: &[T]) -> Result<()> {
        self.store.set_json(self.key, records).await?;
        Ok(())
    }

    /// Sanitize `record`, store it at the front of the list, return the list
    pub async fn prepend(&self, mut record: T) -> Result<Vec<T>> {
        record.sanitize();

        let mut records = self.list().await?;
        records.insert(0, record);
        self.replace_all(&records).await?;

        Ok(records)
    }

    /// Apply `f` to the record with `id` and persist
    ///
    /// A missing id leaves storage untouched and returns the current list.
    pub async fn modify<F>(&self, id: &str, f: F) -> Result<Vec<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut records = self.list().await?;

        match records.iter_mut().find(|record| record.id() == id) {
            Some(record) => {
                f(record);
                record.sanitize();
            }
            None => {
                tracing::debug!("No record {} in {}, nothing to update", id, self.key);
                return Ok(records);
            }
        }

        self.replace_all(&records).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Remove the record with `id` and persist
    pub async fn remove(&self, id: &str) -> Result<Vec<T>> {
        let mut records = self.list().await?;
        let before = records.len();
        records.retain(|record| record.id() != id);

        if records.len() == before {
            tracing::debug!("No record {} in {}, nothing to delete", id, self.key);
            return Ok(records);
        }

        self.replace_all(&records).await?;
        Ok(records)
    }
}
