//! Async preferences abstraction with a local fallback
//!
//! The platform preferences bridge is modelled by [`PreferencesStore`]. Reads
//! and writes go to the primary store first; when it fails, [`Preferences`]
//! logs the failure and serves the request from a local [`KvStore`] instead.
//!
//! # Example
//!
//! ```rust
//! # async fn example() -> storage::preferences::Result<()> {
//! use storage::{Preferences, StorageKey};
//!
//! let prefs = Preferences::in_memory()?;
//! prefs.set(StorageKey::AgreementAccepted, "true").await?;
//! assert_eq!(prefs.get(StorageKey::AgreementAccepted).await?.as_deref(), Some("true"));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::keys::StorageKey;
use crate::kv::{KvError, KvStore};

/// Preferences error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not serve the request
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Local store error
    #[error("Key-value store error: {0}")]
    Kv(#[from] KvError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for preferences operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// String key-value backend provided by the host platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl PreferencesStore for KvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(KvStore::get(self, key)?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(KvStore::set(self, key, value)?)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        KvStore::remove(self, key)?;
        Ok(())
    }
}

/// In-process store, used for previews and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl PreferencesStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// Preferences facade used by every service
///
/// Values are plain strings; the `*_json` helpers serialize records with
/// serde_json on the way in and out.
pub struct Preferences {
    primary: Arc<dyn PreferencesStore>,
    fallback: KvStore,
}

impl Preferences {
    /// Create preferences over a platform store and a local fallback
    pub fn new(primary: Arc<dyn PreferencesStore>, fallback: KvStore) -> Self {
        Self { primary, fallback }
    }

    /// Use an on-disk store as the primary backend
    pub fn local(kv: KvStore) -> Result<Self> {
        Ok(Self::new(Arc::new(kv), KvStore::in_memory()?))
    }

    /// Fully in-memory preferences
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(MemoryStore::new()), KvStore::in_memory()?))
    }

    /// Read the raw string stored under `key`
    pub async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        match self.primary.get(key.as_str()).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Preferences read of {} failed, using local store: {}", key, e);
                Ok(self.fallback.get(key.as_str())?)
            }
        }
    }

    /// Store a raw string under `key`
    pub async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        match self.primary.set(key.as_str(), value).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("Preferences write of {} failed, using local store: {}", key, e);
                self.fallback
                    .set(key.as_str(), value)
                    .map_err(|local| StorageError::Unavailable(format!("{e}; local: {local}")))
            }
        }
    }

    /// Delete `key`
    pub async fn remove(&self, key: StorageKey) -> Result<()> {
        let primary = self.primary.remove(key.as_str()).await;
        // The fallback may hold a copy written while the primary was down
        let local = self.fallback.remove(key.as_str());

        match (primary, local) {
            (Ok(()), _) => Ok(()),
            (Err(e), Ok(_)) => {
                tracing::warn!("Preferences removal of {} failed, cleared local store: {}", key, e);
                Ok(())
            }
            (Err(e), Err(local)) => {
                Err(StorageError::Unavailable(format!("{e}; local: {local}")))
            }
        }
    }

    /// Read and deserialize a JSON value
    pub async fn get_json<T>(&self, key: StorageKey) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON value
    pub async fn set_json<T>(&self, key: StorageKey, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }
}
