use super::geo::Coordinate;
use super::record::ChargerRecord;

/// A record paired with its distance from the query origin.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub record: &'a ChargerRecord,
    pub distance_m: f64,
}

/// The "Hot Path" for nearest-K lookups. Implementations are immutable after
/// build and shared across request tasks without locking.
pub trait ProximityIndex: Send + Sync {
    /// Up to `k` records ordered by ascending distance, ties by ascending id.
    fn nearest(&self, origin: &Coordinate, k: usize) -> Vec<Neighbor<'_>>;
}
