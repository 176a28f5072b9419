use super::types::{FavoriteSet, Identity};
use crate::engine::ChargerId;
use crate::error::StoreError;
use async_trait::async_trait;

/// Per-identity favorites persistence.
///
/// `set_favorite` is a read-modify-write that implementations serialize per
/// identity; it either commits completely or leaves the stored set untouched.
/// Ids are not checked against the dataset here.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Empty set when the identity has never stored anything.
    async fn list(&self, identity: &Identity) -> Result<FavoriteSet, StoreError>;

    /// Adds or removes `charger_id` and returns the resulting set. Idempotent
    /// in both directions.
    async fn set_favorite(
        &self,
        identity: &Identity,
        charger_id: ChargerId,
        is_favorite: bool,
    ) -> Result<FavoriteSet, StoreError>;
}

/// Applies one mutation to a set, returning whether anything changed.
pub(crate) fn apply(set: &mut FavoriteSet, charger_id: ChargerId, is_favorite: bool) -> bool {
    if is_favorite {
        set.insert(charger_id)
    } else {
        set.remove(&charger_id)
    }
}
