//! Favorite flights.
//!
//! The favorite flight ids are kept as one JSON array under
//! [`FAVORITES_KEY`]. Toggling runs through [`Storage::update`], so two
//! concurrent toggles are serialized instead of racing.

use tracing::debug;

use crate::error::Result;
use crate::storage::Storage;

/// Storage key holding the favorite flight ids.
pub const FAVORITES_KEY: &str = "favorite_flight_ids";

/// Favorite flight ids backed by a [`Storage`].
#[derive(Debug, Clone, Copy)]
pub struct Favorites<'a> {
    storage: &'a Storage,
}

impl<'a> Favorites<'a> {
    /// Use `storage` as the backing store.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// All favorite ids in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored list cannot be read.
    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .get_item::<Vec<String>>(FAVORITES_KEY)?
            .unwrap_or_default())
    }

    /// Replace the whole list. Duplicates are dropped, first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn set_ids(&self, ids: &[String]) -> Result<()> {
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }
        self.storage.set_item(FAVORITES_KEY, &unique)
    }

    /// Flip membership of `id` and return whether it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored list cannot be read or written.
    pub fn toggle(&self, id: &str) -> Result<bool> {
        let now_favorite = self
            .storage
            .update(FAVORITES_KEY, |current: Option<Vec<String>>| {
                let mut ids = current.unwrap_or_default();
                if ids.iter().any(|fav| fav == id) {
                    ids.retain(|fav| fav != id);
                    (ids, false)
                } else {
                    ids.push(id.to_string());
                    (ids, true)
                }
            })?;
        debug!(id, now_favorite, "toggled favorite");
        Ok(now_favorite)
    }

    /// Whether `id` is a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored list cannot be read.
    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.ids()?.iter().any(|fav| fav == id))
    }

    /// Remove every favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(FAVORITES_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_empty_by_default() {
        let storage = create_test_storage();
        let favorites = Favorites::new(&storage);
        assert!(favorites.ids().unwrap().is_empty());
        assert!(!favorites.contains("f1").unwrap());
    }

    #[test]
    fn test_toggle_twice() {
        let storage = create_test_storage();
        let favorites = Favorites::new(&storage);

        assert!(favorites.toggle("f1").unwrap());
        assert!(favorites.contains("f1").unwrap());

        assert!(!favorites.toggle("f1").unwrap());
        assert!(!favorites.contains("f1").unwrap());
    }

    #[test]
    fn test_toggle_preserves_order() {
        let storage = create_test_storage();
        let favorites = Favorites::new(&storage);

        favorites.toggle("a").unwrap();
        favorites.toggle("b").unwrap();
        favorites.toggle("c").unwrap();
        favorites.toggle("b").unwrap();

        assert_eq!(favorites.ids().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_stored_as_json_array_under_key() {
        let storage = create_test_storage();
        Favorites::new(&storage).toggle("LH400-2024-01-01").unwrap();

        let raw: Option<Vec<String>> = storage.get_item(FAVORITES_KEY).unwrap();
        assert_eq!(raw, Some(vec!["LH400-2024-01-01".to_string()]));
    }

    #[test]
    fn test_set_ids_dedupes() {
        let storage = create_test_storage();
        let favorites = Favorites::new(&storage);

        favorites
            .set_ids(&["x".to_string(), "y".to_string(), "x".to_string()])
            .unwrap();
        assert_eq!(favorites.ids().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_clear() {
        let storage = create_test_storage();
        let favorites = Favorites::new(&storage);
        favorites.toggle("a").unwrap();

        favorites.clear().unwrap();
        assert!(favorites.ids().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_toggles_are_serialized() {
        let storage = Arc::new(create_test_storage());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    Favorites::new(&storage).toggle(&format!("flight-{i}")).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert_eq!(Favorites::new(&storage).ids().unwrap().len(), 16);
    }
}
