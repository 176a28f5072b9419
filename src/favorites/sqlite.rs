//! Durable favorites backend over [`DbClient`].
//!
//! SQLite calls block, so each one runs on the blocking pool. The spawned job
//! owns its own handle to the client: if the request that started it goes
//! away, the transaction still commits or rolls back as a whole.

use super::source::FavoritesStore;
use super::types::{FavoriteSet, Identity};
use crate::db::DbClient;
use crate::engine::ChargerId;
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task;

pub struct SqliteFavoritesStore {
    db: Arc<DbClient>,
}

impl SqliteFavoritesStore {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoritesStore for SqliteFavoritesStore {
    async fn list(&self, identity: &Identity) -> Result<FavoriteSet, StoreError> {
        let db = self.db.clone();
        let identity = identity.clone();
        task::spawn_blocking(move || db.get_favorites(identity.as_str())).await?
    }

    async fn set_favorite(
        &self,
        identity: &Identity,
        charger_id: ChargerId,
        is_favorite: bool,
    ) -> Result<FavoriteSet, StoreError> {
        let db = self.db.clone();
        let identity = identity.clone();
        task::spawn_blocking(move || db.set_favorite(identity.as_str(), charger_id, is_favorite))
            .await?
    }
}
