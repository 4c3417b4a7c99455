//! User-authored occasion messages
//!
//! Short texts the user keeps for sharing on religious holidays, stored next
//! to the built-in message table.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::clock::Clock;
use crate::ids::generate_id;
use crate::records::{Record, RecordCollection, RecordError, Result};
use crate::sanitize::{escape_html, normalize_escaped};
use storage::{Preferences, StorageKey};

/// Maximum message length in graphemes
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// A message written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    /// Unique id
    pub id: String,
    /// Escaped message text
    pub text: String,
    /// Optional occasion category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// ISO-8601 creation time
    pub timestamp: String,
}

impl Record for UserMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn sanitize(&mut self) {
        self.text = normalize_escaped(&self.text);
        if let Some(category) = self.category.as_mut() {
            *category = normalize_escaped(category);
        }
    }
}

fn validate_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RecordError::EmptyText("message"));
    }
    if text.graphemes(true).count() > MAX_MESSAGE_LENGTH {
        return Err(RecordError::TooLong { field: "message", max: MAX_MESSAGE_LENGTH });
    }
    Ok(text)
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string)
}

/// Service for the user's own messages
pub struct UserMessageService {
    messages: RecordCollection<UserMessage>,
    clock: Arc<dyn Clock>,
}

impl UserMessageService {
    /// Create a new message service
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>) -> Self {
        Self { messages: RecordCollection::new(store, StorageKey::UserMessages), clock }
    }

    /// All messages, newest first
    pub async fn list(&self) -> Result<Vec<UserMessage>> {
        self.messages.list().await
    }

    /// Add a message
    ///
    /// Text is trimmed and must hold 1 to [`MAX_MESSAGE_LENGTH`] graphemes.
    pub async fn add(&self, text: &str, category: Option<&str>) -> Result<Vec<UserMessage>> {
        let text = validate_text(text)?;

        let now = self.clock.now();
        let message = UserMessage {
            id: generate_id(now),
            text: escape_html(text),
            category: normalize_category(category).as_deref().map(escape_html),
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };

        self.messages.prepend(message).await
    }

    /// Replace a message's text and category by id
    ///
    /// The same limits as [`UserMessageService::add`] apply. The stored
    /// timestamp is kept; unknown ids are ignored.
    pub async fn update(&self, message: UserMessage) -> Result<Vec<UserMessage>> {
        let text = validate_text(&message.text)?.to_string();
        let category = normalize_category(message.category.as_deref());

        self.messages
            .modify(&message.id, move |existing| {
                existing.text = text;
                existing.category = category;
            })
            .await
    }

    /// Delete a message by id
    pub async fn delete(&self, id: &str) -> Result<Vec<UserMessage>> {
        self.messages.remove(id).await
    }
}
