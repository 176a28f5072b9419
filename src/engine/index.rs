use super::geo::Coordinate;
use super::record::{ChargerId, ChargerRecord};
use super::traits::{Neighbor, ProximityIndex};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// In-memory charger table with an id lookup map.
///
/// `nearest` is a full scan: every query computes the distance to every
/// record. That is fine for a few thousand stations and is the scaling ceiling
/// of this index; a grid or k-d tree replacement must keep the same metric and
/// the (distance, id) ordering.
#[derive(Debug, Default)]
pub struct ChargerIndex {
    // Load order, which is also the order `records()` reports.
    records: Vec<ChargerRecord>,
    by_id: FxHashMap<ChargerId, usize>,
}

impl ChargerIndex {
    /// Builds the index. Later duplicates of an id are ignored and returned so
    /// the caller can report them.
    pub fn build(records: impl IntoIterator<Item = ChargerRecord>) -> (Self, Vec<ChargerId>) {
        let mut index = Self::default();
        let mut duplicates = Vec::new();

        for record in records {
            let id = record.id();
            if index.by_id.contains_key(&id) {
                duplicates.push(id);
                continue;
            }
            index.by_id.insert(id, index.records.len());
            index.records.push(record);
        }

        (index, duplicates)
    }

    pub fn from_records(records: impl IntoIterator<Item = ChargerRecord>) -> Self {
        Self::build(records).0
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChargerRecord] {
        &self.records
    }

    pub fn get(&self, id: ChargerId) -> Option<&ChargerRecord> {
        self.by_id.get(&id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: ChargerId) -> bool {
        self.by_id.contains_key(&id)
    }
}

fn by_distance_then_id(a: &Neighbor<'_>, b: &Neighbor<'_>) -> Ordering {
    a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| a.record.id().cmp(&b.record.id()))
}

impl ProximityIndex for ChargerIndex {
    fn nearest(&self, origin: &Coordinate, k: usize) -> Vec<Neighbor<'_>> {
        if k == 0 || self.records.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<Neighbor<'_>> = self
            .records
            .iter()
            .map(|record| Neighbor {
                record,
                distance_m: origin.distance_to(record.coordinate()),
            })
            .collect();

        // Partition the k best to the front before sorting only those.
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance_then_id);
            hits.truncate(k);
        }
        hits.sort_unstable_by(by_distance_then_id);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: ChargerId, lat: f64, lon: f64) -> ChargerRecord {
        ChargerRecord::new(id, Coordinate::new(lat, lon).unwrap())
    }

    fn sample() -> ChargerIndex {
        ChargerIndex::from_records(vec![
            record(1, 34.05, -118.25),
            record(2, 37.77, -122.42),
            record(3, 34.10, -118.30),
        ])
    }

    fn ids(hits: &[Neighbor<'_>]) -> Vec<ChargerId> {
        hits.iter().map(|h| h.record.id()).collect()
    }

    #[test]
    fn test_nearest_two_in_los_angeles() {
        let index = sample();
        let origin = Coordinate::new(34.0, -118.2).unwrap();

        let hits = index.nearest(&origin, 2);
        assert_eq!(ids(&hits), vec![1, 3]);
        assert!(hits[0].distance_m <= hits[1].distance_m);
    }

    #[test]
    fn test_k_zero_and_empty_index_yield_nothing() {
        let origin = Coordinate::new(0.0, 0.0).unwrap();
        assert!(sample().nearest(&origin, 0).is_empty());
        assert!(ChargerIndex::default().nearest(&origin, 5).is_empty());
    }

    #[test]
    fn test_k_larger_than_dataset_returns_everything_sorted() {
        let index = sample();
        let origin = Coordinate::new(34.0, -118.2).unwrap();

        let hits = index.nearest(&origin, 100);
        assert_eq!(ids(&hits), vec![1, 3, 2]);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let index = ChargerIndex::from_records(vec![
            record(9, 10.0, 10.0),
            record(4, 10.0, 10.0),
            record(6, 10.0, 10.0),
            record(1, 50.0, 50.0),
        ]);
        let origin = Coordinate::new(10.0, 10.5).unwrap();

        assert_eq!(ids(&index.nearest(&origin, 2)), vec![4, 6]);
        assert_eq!(ids(&index.nearest(&origin, 4)), vec![4, 6, 9, 1]);
    }

    #[test]
    fn test_results_are_non_decreasing() {
        let records: Vec<_> = (0..200)
            .map(|i| {
                let lat = ((i * 37) % 170) as f64 - 85.0;
                let lon = ((i * 91) % 350) as f64 - 175.0;
                record(i, lat, lon)
            })
            .collect();
        let index = ChargerIndex::from_records(records);
        let origin = Coordinate::new(12.5, -40.0).unwrap();

        let hits = index.nearest(&origin, 25);
        assert_eq!(hits.len(), 25);
        for pair in hits.windows(2) {
            assert!(by_distance_then_id(&pair[0], &pair[1]) == Ordering::Less);
        }

        // Same prefix as a full sort.
        let full = index.nearest(&origin, 200);
        assert_eq!(ids(&hits), ids(&full[..25]));
    }

    #[test]
    fn test_build_keeps_first_duplicate() {
        let (index, duplicates) = ChargerIndex::build(vec![
            record(1, 1.0, 1.0).with_property("station_name", "first"),
            record(1, 2.0, 2.0).with_property("station_name", "second"),
            record(2, 3.0, 3.0),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(duplicates, vec![1]);
        assert_eq!(index.get(1).unwrap().property("station_name"), Some("first"));
        assert_eq!(
            index.records().iter().map(|r| r.id()).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }
}
