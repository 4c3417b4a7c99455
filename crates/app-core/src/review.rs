//! Store review prompt eligibility
//!
//! Decides when the app may ask for a store rating. The user is asked only
//! after a week of use and five entries, never more than three times, never
//! within two weeks of the previous ask and never again after rating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::records::parse_timestamp;
use storage::{Preferences, StorageError, StorageKey};

/// Store listing opened by the rating action
pub const PLAY_STORE_URL: &str = "https://play.google.com/store/apps/details?id=com.yalcin.sukurolsun";

/// Days of use before the first prompt
pub const MIN_DAYS_SINCE_FIRST_OPEN: i64 = 7;

/// Entries recorded before the first prompt
pub const MIN_ENTRY_COUNT: u32 = 5;

/// Days between prompts
pub const MIN_DAYS_BETWEEN_PROMPTS: i64 = 14;

/// Prompts shown at most
pub const MAX_PROMPTS: u32 = 3;

/// Result type for review operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Persisted review bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewState {
    /// ISO-8601 time the app was first opened
    pub first_open_date: Option<String>,
    /// Entries recorded since tracking began
    pub entry_count: u32,
    /// ISO-8601 time the prompt was last shown
    pub last_prompt_date: Option<String>,
    /// Whether the user has rated the app
    pub has_rated: bool,
    /// Number of prompts shown
    pub prompt_count: u32,
}

fn whole_days_since(raw: &str, now: DateTime<Utc>) -> Option<i64> {
    parse_timestamp(raw).map(|then| (now - then).num_days())
}

/// Review prompt service
pub struct ReviewService {
    store: Arc<Preferences>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stored state; fresh state when absent or unreadable
    pub async fn state(&self) -> Result<ReviewState> {
        match self.store.get_json::<ReviewState>(StorageKey::ReviewState).await {
            Ok(state) => Ok(state.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Resetting unreadable review state: {}", e);
                Ok(ReviewState::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, state: &ReviewState) -> Result<()> {
        self.store.set_json(StorageKey::ReviewState, state).await
    }

    fn now_iso(&self) -> String {
        self.clock.now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    /// Record the first launch time if it is not yet known
    pub async fn track_first_open(&self) -> Result<()> {
        let mut state = self.state().await?;
        if state.first_open_date.is_none() {
            state.first_open_date = Some(self.now_iso());
            self.save(&state).await?;
        }
        Ok(())
    }

    /// Count a new entry and report whether the prompt may be shown now
    pub async fn increment_and_check(&self) -> Result<bool> {
        let mut state = self.state().await?;
        if state.has_rated || state.prompt_count >= MAX_PROMPTS {
            return Ok(false);
        }

        state.entry_count += 1;

        let Some(first_open) = state.first_open_date.clone() else {
            state.first_open_date = Some(self.now_iso());
            self.save(&state).await?;
            return Ok(false);
        };
        self.save(&state).await?;

        let now = self.clock.now();
        // Unreadable dates count as just now
        let days_in_use = whole_days_since(&first_open, now).unwrap_or(0);
        if days_in_use < MIN_DAYS_SINCE_FIRST_OPEN || state.entry_count < MIN_ENTRY_COUNT {
            return Ok(false);
        }

        if let Some(last_prompt) = state.last_prompt_date.as_deref() {
            let days_since_prompt = whole_days_since(last_prompt, now).unwrap_or(0);
            if days_since_prompt < MIN_DAYS_BETWEEN_PROMPTS {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Record that the prompt was shown
    pub async fn mark_prompt_shown(&self) -> Result<()> {
        let mut state = self.state().await?;
        state.last_prompt_date = Some(self.now_iso());
        state.prompt_count += 1;
        self.save(&state).await
    }

    /// Record that the user rated the app
    pub async fn mark_as_rated(&self) -> Result<()> {
        let mut state = self.state().await?;
        state.has_rated = true;
        self.save(&state).await?;
        tracing::info!("User rated the app; review prompts disabled");
        Ok(())
    }

    /// Store listing URL
    pub fn play_store_url(&self) -> &'static str {
        PLAY_STORE_URL
    }
}
