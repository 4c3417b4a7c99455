//! Storage layer for the Şükür journal
//!
//! This crate provides the on-device key-value store, the async preferences
//! abstraction with its local fallback, the key inventory, and the persisted
//! settings schema.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app_state;
pub mod keys;
pub mod kv;
pub mod preferences;

pub use app_state::{AppSettings, Language};
pub use keys::StorageKey;
pub use kv::{KvConfig, KvError, KvStore};
pub use preferences::{MemoryStore, Preferences, PreferencesStore, StorageError};
