//! Application context
//!
//! Wires every service to one store and one clock, and runs the entry flows
//! that keep the profile's streak and badges in step with the journal.

use std::sync::{Arc, Mutex};

use crate::ads::AdCadence;
use crate::backup::{BackupConfig, BackupService};
use crate::clock::{Clock, SystemClock};
use crate::duas::DuaFavoritesService;
use crate::gamification::{check_new_badges, streak_as_of};
use crate::journal::{EntryDraft, JournalEntry, JournalService};
use crate::messages::UserMessageService;
use crate::prayers::CustomPrayerService;
use crate::profiles::{ProfileService, UserProfile};
use crate::records::Result;
use crate::review::ReviewService;
use crate::security::SecurityService;
use crate::settings::SettingsService;
use storage::{KvConfig, KvStore, Preferences, StorageError};

/// State after an entry was added, edited or deleted
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySaved {
    /// All entries, newest first
    pub entries: Vec<JournalEntry>,
    /// Profile with the recomputed streak
    pub profile: UserProfile,
    /// Badges earned by this change, in catalog order
    pub new_badges: Vec<String>,
    /// Whether the store review prompt may be shown
    pub review_due: bool,
}

/// Every service over one store and clock
pub struct AppContext {
    store: Arc<Preferences>,
    clock: Arc<dyn Clock>,
    journal: JournalService,
    prayers: CustomPrayerService,
    messages: UserMessageService,
    profiles: ProfileService,
    settings: SettingsService,
    security: SecurityService,
    backup: BackupService,
    review: ReviewService,
    duas: DuaFavoritesService,
    ads: Mutex<AdCadence>,
}

impl AppContext {
    /// Create a context with the default backup configuration
    pub fn new(store: Arc<Preferences>, clock: Arc<dyn Clock>) -> Self {
        Self::with_backup_config(store, clock, BackupConfig::default())
    }

    /// Create a context with a custom backup configuration
    pub fn with_backup_config(
        store: Arc<Preferences>,
        clock: Arc<dyn Clock>,
        backup: BackupConfig,
    ) -> Self {
        Self {
            journal: JournalService::new(Arc::clone(&store), Arc::clone(&clock)),
            prayers: CustomPrayerService::new(Arc::clone(&store), Arc::clone(&clock)),
            messages: UserMessageService::new(Arc::clone(&store), Arc::clone(&clock)),
            profiles: ProfileService::new(Arc::clone(&store), Arc::clone(&clock)),
            settings: SettingsService::new(Arc::clone(&store)),
            security: SecurityService::new(Arc::clone(&store)),
            backup: BackupService::new(Arc::clone(&store), Arc::clone(&clock), backup),
            review: ReviewService::new(Arc::clone(&store), Arc::clone(&clock)),
            duas: DuaFavoritesService::new(Arc::clone(&store)),
            ads: Mutex::new(AdCadence::default()),
            store,
            clock,
        }
    }

    /// Open a context over an on-disk store
    pub fn open(config: KvConfig) -> std::result::Result<Self, StorageError> {
        let store = Preferences::local(KvStore::new(config)?)?;
        Ok(Self::new(Arc::new(store), Arc::new(SystemClock)))
    }

    /// Fully in-memory context
    pub fn in_memory() -> std::result::Result<Self, StorageError> {
        Ok(Self::new(Arc::new(Preferences::in_memory()?), Arc::new(SystemClock)))
    }

    /// Launch bookkeeping; records the first open for review timing
    pub async fn on_launch(&self) -> std::result::Result<(), StorageError> {
        self.review.track_first_open().await
    }

    /// Add an entry, then update the streak, badges and review counter
    ///
    /// The default profile is created if none exists yet.
    pub async fn record_entry(&self, draft: EntryDraft) -> Result<EntrySaved> {
        let entries = self.journal.add(draft).await?;
        let mut saved = self.refresh_progress(entries).await?;
        saved.review_due = self.review.increment_and_check().await?;

        if !saved.new_badges.is_empty() {
            tracing::info!("Badges earned: {}", saved.new_badges.join(", "));
        }
        Ok(saved)
    }

    /// Replace an entry, then update the streak
    pub async fn revise_entry(&self, entry: JournalEntry) -> Result<EntrySaved> {
        let entries = self.journal.update(entry).await?;
        self.refresh_progress(entries).await
    }

    /// Delete an entry, then update the streak
    ///
    /// Earned badges are kept even if the streak drops.
    pub async fn remove_entry(&self, id: &str) -> Result<EntrySaved> {
        let entries = self.journal.delete(id).await?;
        self.refresh_progress(entries).await
    }

    async fn refresh_progress(&self, entries: Vec<JournalEntry>) -> Result<EntrySaved> {
        let streak = streak_as_of(&entries, self.clock.today());

        let mut profile = self.profiles.get_or_default().await?;
        let new_badges = check_new_badges(streak, &profile.badges);
        profile.streak = streak;
        profile.award_badges(new_badges.iter().cloned());
        let profile = self.profiles.save(profile).await?;

        Ok(EntrySaved { entries, profile, new_badges, review_due: false })
    }

    /// Count an action that may be followed by an interstitial
    pub fn register_ad_action(&self) -> bool {
        match self.ads.lock() {
            Ok(mut cadence) => cadence.register_action(),
            Err(poisoned) => poisoned.into_inner().register_action(),
        }
    }

    /// Shared store
    pub fn store(&self) -> &Arc<Preferences> {
        &self.store
    }

    /// Shared clock
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Journal entries
    pub fn journal(&self) -> &JournalService {
        &self.journal
    }

    /// Custom prayers
    pub fn prayers(&self) -> &CustomPrayerService {
        &self.prayers
    }

    /// User messages
    pub fn messages(&self) -> &UserMessageService {
        &self.messages
    }

    /// Profile
    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// Settings
    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    /// PIN and agreement
    pub fn security(&self) -> &SecurityService {
        &self.security
    }

    /// Export, import and wipe
    pub fn backup(&self) -> &BackupService {
        &self.backup
    }

    /// Review prompt
    pub fn review(&self) -> &ReviewService {
        &self.review
    }

    /// Dua favourites
    pub fn duas(&self) -> &DuaFavoritesService {
        &self.duas
    }
}
