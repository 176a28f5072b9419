//! Routes favorites operations by caller state.
//!
//! Every request is resolved independently to [`Caller::Anonymous`] or
//! [`Caller::Identified`]; nothing is remembered between requests. Charger
//! reads need no identity. Favorites reads and writes require one, and an
//! anonymous caller is turned away before the store is touched.

mod auth;

pub use auth::{Authenticator, Caller, StaticTokenAuthenticator};

use crate::engine::ChargerId;
use crate::error::ServiceError;
use crate::favorites::{FavoriteSet, FavoritesStore, Identity};
use crate::query::QueryService;
use crate::stats::StatsCollector;
use std::sync::Arc;
use tracing::{debug, error};

pub struct AccessMediator {
    favorites: Arc<dyn FavoritesStore>,
    query: QueryService,
    validate_ids: bool,
    stats: Arc<StatsCollector>,
}

impl AccessMediator {
    pub fn new(
        favorites: Arc<dyn FavoritesStore>,
        query: QueryService,
        validate_ids: bool,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            favorites,
            query,
            validate_ids,
            stats,
        }
    }

    pub async fn favorites(&self, caller: &Caller) -> Result<FavoriteSet, ServiceError> {
        let identity = self.authorize(caller)?;
        self.stats.inc_favorites_reads();

        self.favorites
            .list(identity)
            .await
            .map_err(|e| self.storage_failure(identity, e.into()))
    }

    pub async fn set_favorite(
        &self,
        caller: &Caller,
        charger_id: ChargerId,
        is_favorite: bool,
    ) -> Result<FavoriteSet, ServiceError> {
        let identity = self.authorize(caller)?;

        // Removals stay unchecked so ids that left the dataset can be cleared.
        if self.validate_ids && is_favorite && !self.query.contains(charger_id) {
            self.stats.inc_not_found();
            return Err(ServiceError::NotFound(charger_id));
        }

        self.stats.inc_favorites_writes();
        debug!(
            "set_favorite identity={} charger={} is_favorite={}",
            identity, charger_id, is_favorite
        );

        self.favorites
            .set_favorite(identity, charger_id, is_favorite)
            .await
            .map_err(|e| self.storage_failure(identity, e.into()))
    }

    /// The caller's identity, or `Unauthorized` for anonymous callers.
    pub fn authorize<'a>(&self, caller: &'a Caller) -> Result<&'a Identity, ServiceError> {
        caller.identity().ok_or_else(|| {
            self.stats.inc_unauthorized();
            ServiceError::Unauthorized
        })
    }

    fn storage_failure(&self, identity: &Identity, err: ServiceError) -> ServiceError {
        self.stats.inc_storage_errors();
        error!("Favorites storage failure for {}: {}", identity, err);
        err
    }
}
