//! Favourite prayers from the built-in collection
//!
//! Favourites are positions in the static prayer table, kept as an ascending
//! array without repeats.

use std::sync::Arc;

use storage::{Preferences, StorageError, StorageKey};

/// Result type for favourite operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Service for favourite built-in prayers
pub struct DuaFavoritesService {
    store: Arc<Preferences>,
}

impl DuaFavoritesService {
    /// Create a new favourites service
    pub fn new(store: Arc<Preferences>) -> Self {
        Self { store }
    }

    /// Favourite indices in ascending order
    pub async fn list(&self) -> Result<Vec<usize>> {
        let mut favorites = match self.store.get_json::<Vec<usize>>(StorageKey::DuaFavorites).await {
            Ok(favorites) => favorites.unwrap_or_default(),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable dua favourites: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        favorites.sort_unstable();
        favorites.dedup();
        Ok(favorites)
    }

    /// Add or remove `index`, returning the new list
    pub async fn toggle(&self, index: usize) -> Result<Vec<usize>> {
        let mut favorites = self.list().await?;
        match favorites.binary_search(&index) {
            Ok(position) => {
                favorites.remove(position);
            }
            Err(position) => favorites.insert(position, index),
        }

        self.store.set_json(StorageKey::DuaFavorites, &favorites).await?;
        Ok(favorites)
    }

    /// Whether `index` is a favourite
    pub async fn is_favorite(&self, index: usize) -> Result<bool> {
        Ok(self.list().await?.binary_search(&index).is_ok())
    }
}
