//! App lock PIN and agreement acceptance
//!
//! The PIN is never stored; only a hex SHA-256 digest of the PIN followed by
//! an application-wide salt is kept under `pin_hash`. With no digest stored
//! the lock is disengaged and every verification succeeds.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

use storage::{Preferences, StorageError, StorageKey};

/// Number of digits in a PIN
pub const PIN_LENGTH: usize = 4;

/// Application-wide salt appended to every PIN before hashing
///
/// The salt is identical on every install, so equal PINs produce equal
/// digests across devices.
const PIN_SALT: &str = "sukur_olsun_pin_salt_v1";

const AGREEMENT_ACCEPTED: &str = "true";

/// Errors that can occur during PIN operations
#[derive(Debug, Error)]
pub enum PinError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// PIN is not exactly [`PIN_LENGTH`] ASCII digits
    #[error("PIN must be exactly {} digits", PIN_LENGTH)]
    InvalidFormat,
}

/// Result type for PIN operations
pub type Result<T> = std::result::Result<T, PinError>;

/// Hex digest stored for `pin`
pub fn hash_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hasher.update(PIN_SALT.as_bytes());
    hex::encode(hasher.finalize())
}

fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PinError::InvalidFormat)
    }
}

/// PIN lock and agreement flag service
pub struct SecurityService {
    store: Arc<Preferences>,
}

impl SecurityService {
    /// Create a new security service
    pub fn new(store: Arc<Preferences>) -> Self {
        Self { store }
    }

    /// Store the digest of a new PIN
    pub async fn set_pin(&self, pin: &str) -> Result<()> {
        validate_pin(pin)?;
        self.store.set(StorageKey::PinHash, &hash_pin(pin)).await?;
        tracing::info!("App lock PIN updated");
        Ok(())
    }

    /// Check a PIN against the stored digest
    ///
    /// Succeeds when no PIN is configured.
    pub async fn verify_pin(&self, pin: &str) -> Result<bool> {
        match self.store.get(StorageKey::PinHash).await? {
            Some(stored) => Ok(stored == hash_pin(pin)),
            None => Ok(true),
        }
    }

    /// Whether a PIN is configured
    pub async fn has_pin(&self) -> Result<bool> {
        Ok(self.store.get(StorageKey::PinHash).await?.is_some())
    }

    /// Disengage the lock
    pub async fn remove_pin(&self) -> Result<()> {
        self.store.remove(StorageKey::PinHash).await?;
        tracing::info!("App lock PIN removed");
        Ok(())
    }

    /// Record that the user accepted the usage agreement
    pub async fn accept_agreement(&self) -> Result<()> {
        self.store
            .set(StorageKey::AgreementAccepted, AGREEMENT_ACCEPTED)
            .await?;
        Ok(())
    }

    /// Whether the usage agreement has been accepted
    pub async fn has_accepted_agreement(&self) -> Result<bool> {
        Ok(self.store.get(StorageKey::AgreementAccepted).await?.as_deref()
            == Some(AGREEMENT_ACCEPTED))
    }
}
