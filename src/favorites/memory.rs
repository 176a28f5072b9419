//! In-process favorites backend.
//!
//! Each identity owns its own mutex-guarded set. The outer map lock is only
//! held long enough to find or create that entry, so a mutation for one
//! identity never waits on another identity's mutation. Contents are lost on
//! restart.

use super::source::{apply, FavoritesStore};
use super::types::{FavoriteSet, Identity};
use crate::engine::ChargerId;
use crate::error::StoreError;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, RwLock};

type Entry = Arc<Mutex<FavoriteSet>>;

#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    entries: RwLock<FxHashMap<Identity, Entry>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, identity: &Identity) -> Result<Option<Entry>, StoreError> {
        let map = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(identity).cloned())
    }

    fn get_or_create(&self, identity: &Identity) -> Result<Entry, StoreError> {
        if let Some(entry) = self.existing(identity)? {
            return Ok(entry);
        }
        let mut map = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.entry(identity.clone()).or_default().clone())
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn list(&self, identity: &Identity) -> Result<FavoriteSet, StoreError> {
        let Some(entry) = self.existing(identity)? else {
            return Ok(FavoriteSet::new());
        };
        let set = entry.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(set.clone())
    }

    async fn set_favorite(
        &self,
        identity: &Identity,
        charger_id: ChargerId,
        is_favorite: bool,
    ) -> Result<FavoriteSet, StoreError> {
        // Entries are created lazily, on the first add only.
        let entry = if is_favorite {
            self.get_or_create(identity)?
        } else {
            match self.existing(identity)? {
                Some(entry) => entry,
                None => return Ok(FavoriteSet::new()),
            }
        };

        let mut set = entry.lock().map_err(|_| StoreError::Poisoned)?;
        apply(&mut set, charger_id, is_favorite);
        Ok(set.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = MemoryFavoritesStore::new();
        let alice = Identity::from("alice");

        assert!(store.list(&alice).await.unwrap().is_empty());

        let first = store.set_favorite(&alice, 3, true).await.unwrap();
        let second = store.set_favorite(&alice, 3, true).await.unwrap();
        assert_eq!(first, FavoriteSet::from([3]));
        assert_eq!(second, first);
        assert_eq!(store.list(&alice).await.unwrap(), FavoriteSet::from([3]));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryFavoritesStore::new();
        let alice = Identity::from("alice");

        store.set_favorite(&alice, 3, true).await.unwrap();
        store.set_favorite(&alice, 5, true).await.unwrap();

        let once = store.set_favorite(&alice, 3, false).await.unwrap();
        let twice = store.set_favorite(&alice, 3, false).await.unwrap();
        assert_eq!(once, FavoriteSet::from([5]));
        assert_eq!(twice, once);
    }

    #[tokio::test]
    async fn test_remove_for_unknown_identity_creates_nothing() {
        let store = MemoryFavoritesStore::new();
        let bob = Identity::from("bob");

        let result = store.set_favorite(&bob, 1, false).await.unwrap();
        assert!(result.is_empty());
        assert!(store.entries.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identities_are_isolated() {
        let store = MemoryFavoritesStore::new();
        let alice = Identity::from("alice");
        let bob = Identity::from("bob");

        store.set_favorite(&bob, 9, true).await.unwrap();
        store.set_favorite(&alice, 1, true).await.unwrap();
        store.set_favorite(&alice, 9, false).await.unwrap();

        assert_eq!(store.list(&bob).await.unwrap(), FavoriteSet::from([9]));
        assert_eq!(store.list(&alice).await.unwrap(), FavoriteSet::from([1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let alice = Identity::from("alice");

        let tasks: Vec<_> = (0..64)
            .map(|id| {
                let store = store.clone();
                let alice = alice.clone();
                tokio::spawn(async move { store.set_favorite(&alice, id, true).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let expected: FavoriteSet = (0..64).collect();
        assert_eq!(store.list(&alice).await.unwrap(), expected);
    }
}
