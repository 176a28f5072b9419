use super::geo::Coordinate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Primary key carried over from the source dataset.
pub type ChargerId = i64;

/// Field names owned by the typed part of a record. The property bag is
/// flattened next to them, so it must never hold these.
const RESERVED_KEYS: [&str; 3] = ["id", "latitude", "longitude"];

/// One charging station. Immutable once loaded.
///
/// Only `id` and the position are typed; every other dataset attribute is kept
/// verbatim in `properties` under its lower-cased key and flattened next to the
/// typed fields when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargerRecord {
    id: ChargerId,
    #[serde(flatten)]
    position: Coordinate,
    #[serde(flatten)]
    properties: BTreeMap<String, String>,
}

impl ChargerRecord {
    pub fn new(id: ChargerId, position: Coordinate) -> Self {
        Self {
            id,
            position,
            properties: BTreeMap::new(),
        }
    }

    /// Replaces the property bag. Reserved keys are discarded.
    pub fn with_properties(mut self, mut properties: BTreeMap<String, String>) -> Self {
        properties.retain(|key, _| !Self::is_reserved_key(key));
        self.properties = properties;
        self
    }

    /// Adds one property; a reserved key leaves the record unchanged.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !Self::is_reserved_key(&key) {
            self.properties.insert(key, value.into());
        }
        self
    }

    pub fn is_reserved_key(key: &str) -> bool {
        RESERVED_KEYS.contains(&key)
    }

    pub fn id(&self) -> ChargerId {
        self.id
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.position
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_flat() {
        let record = ChargerRecord::new(7, Coordinate::new(34.05, -118.25).unwrap())
            .with_property("station_name", "Civic Center")
            .with_property("ev_network", "EV Connect");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["latitude"], 34.05);
        assert_eq!(json["longitude"], -118.25);
        assert_eq!(json["station_name"], "Civic Center");
        assert_eq!(json["ev_network"], "EV Connect");
    }

    #[test]
    fn test_reserved_keys_never_enter_the_bag() {
        let record = ChargerRecord::new(7, Coordinate::new(34.05, -118.25).unwrap())
            .with_property("id", "99")
            .with_property("latitude", "0")
            .with_property("station_name", "Civic Center");
        assert_eq!(record.properties().len(), 1);

        let bag = BTreeMap::from([
            ("longitude".to_string(), "0".to_string()),
            ("city".to_string(), "Los Angeles".to_string()),
        ]);
        let record = record.with_properties(bag);
        assert_eq!(record.property("longitude"), None);
        assert_eq!(record.property("city"), Some("Los Angeles"));

        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text.matches("\"id\"").count(), 1);
        assert_eq!(text.matches("\"longitude\"").count(), 1);
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap()["id"], 7);
    }
}
