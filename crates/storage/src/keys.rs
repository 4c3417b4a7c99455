//! Inventory of every key the application writes

use std::fmt;

/// A storage key owned by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Journal entries
    Entries,
    /// The single user profile
    Profile,
    /// User settings
    Settings,
    /// User-authored prayers
    CustomPrayers,
    /// Salted PIN digest
    PinHash,
    /// One-time agreement acceptance flag
    AgreementAccepted,
    /// User-authored occasion messages
    UserMessages,
    /// Favourite indices into the static prayer table
    DuaFavorites,
    /// Store review prompt bookkeeping
    ReviewState,
}

impl StorageKey {
    /// Every key, primary categories first
    pub const ALL: [StorageKey; 9] = [
        StorageKey::Entries,
        StorageKey::Profile,
        StorageKey::Settings,
        StorageKey::CustomPrayers,
        StorageKey::PinHash,
        StorageKey::AgreementAccepted,
        StorageKey::UserMessages,
        StorageKey::DuaFavorites,
        StorageKey::ReviewState,
    ];

    /// The raw key string written to the store
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Entries => "entries",
            StorageKey::Profile => "profile",
            StorageKey::Settings => "settings",
            StorageKey::CustomPrayers => "custom_prayers",
            StorageKey::PinHash => "pin_hash",
            StorageKey::AgreementAccepted => "agreement_accepted",
            StorageKey::UserMessages => "user_messages",
            StorageKey::DuaFavorites => "dua_favorites",
            StorageKey::ReviewState => "review_state",
        }
    }

    /// Whether the key survives a full data wipe
    pub fn survives_wipe(&self) -> bool {
        matches!(self, StorageKey::AgreementAccepted)
    }

    /// Keys removed by a full data wipe
    pub fn wipeable() -> impl Iterator<Item = StorageKey> {
        Self::ALL.into_iter().filter(|key| !key.survives_wipe())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
