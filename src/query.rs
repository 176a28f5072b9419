//! Read-only operations over the loaded charger index.

use crate::engine::{ChargerId, ChargerIndex, ChargerRecord, Coordinate, ProximityIndex};
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw `near` parameters as a caller supplies them; validated by
/// [`QueryService::near`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NearQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Result count; the configured default when absent.
    pub limit: Option<i64>,
}

/// One `near` result, shaped `{ "charger": ..., "distance": meters }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyCharger {
    pub charger: ChargerRecord,
    pub distance: f64,
}

#[derive(Clone)]
pub struct QueryService {
    index: Arc<ChargerIndex>,
    default_limit: usize,
    max_limit: Option<usize>,
}

impl QueryService {
    pub fn new(index: Arc<ChargerIndex>, default_limit: usize, max_limit: Option<usize>) -> Self {
        Self {
            index,
            default_limit,
            max_limit,
        }
    }

    /// All chargers in load order.
    pub fn list(&self) -> &[ChargerRecord] {
        self.index.records()
    }

    pub fn get_by_id(&self, id: ChargerId) -> Result<&ChargerRecord, ServiceError> {
        self.index.get(id).ok_or(ServiceError::NotFound(id))
    }

    pub fn contains(&self, id: ChargerId) -> bool {
        self.index.contains(id)
    }

    pub fn near(&self, query: NearQuery) -> Result<Vec<NearbyCharger>, ServiceError> {
        let origin = Coordinate::from_parts(query.latitude, query.longitude)?;
        let k = self.resolve_limit(query.limit);

        Ok(self
            .index
            .nearest(&origin, k)
            .into_iter()
            .map(|hit| NearbyCharger {
                charger: hit.record.clone(),
                distance: hit.distance_m,
            })
            .collect())
    }

    fn resolve_limit(&self, limit: Option<i64>) -> usize {
        let k = match limit {
            None => self.default_limit,
            Some(k) if k <= 0 => return 0,
            Some(k) => usize::try_from(k).unwrap_or(usize::MAX),
        };
        self.max_limit.map_or(k, |max| k.min(max))
    }
}
