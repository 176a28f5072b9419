//! Builds the charger index from a GeoJSON-like feature collection.
//!
//! Each feature carries a flat property bag. Keys are lower-cased, the primary
//! key property becomes the record id, and latitude/longitude are taken from
//! the bag (or from a `Point` geometry when the bag lacks them). Features that
//! cannot be placed on the map are dropped and counted, never fatal.
//!
//! A non-key property literally named `id` is kept as `source_id`. When two
//! keys lower-case to the same name the first one keeps the lower-cased name
//! and the next keeps its source spelling.

use super::geo::Coordinate;
use super::index::ChargerIndex;
use super::record::{ChargerId, ChargerRecord};
use crate::error::LoadError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";
const ID: &str = "id";
const SOURCE_ID: &str = "source_id";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// What happened to each input feature.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub missing_id: usize,
    pub missing_geo: usize,
    pub duplicate_id: usize,
    /// Properties of loaded features that had no free key left to live under.
    pub shadowed_properties: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.missing_id + self.missing_geo + self.duplicate_id
    }
}

pub fn load_file(
    path: impl AsRef<Path>,
    primary_key: &str,
) -> Result<(ChargerIndex, LoadReport), LoadError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loading charger dataset from {}", path.display());
    load_str(&contents, primary_key)
}

pub fn load_str(
    contents: &str,
    primary_key: &str,
) -> Result<(ChargerIndex, LoadReport), LoadError> {
    let collection: FeatureCollection = serde_json::from_str(contents)?;
    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        match convert_feature(feature, primary_key, &mut report.shadowed_properties) {
            Ok(record) => records.push(record),
            Err(Rejected::MissingId) => report.missing_id += 1,
            Err(Rejected::MissingGeo) => report.missing_geo += 1,
        }
    }

    let (index, duplicates) = ChargerIndex::build(records);
    report.duplicate_id = duplicates.len();
    report.loaded = index.len();

    if report.dropped() > 0 {
        warn!(
            "Dropped {} dataset features (missing id: {}, missing/invalid coordinates: {}, duplicate id: {})",
            report.dropped(),
            report.missing_id,
            report.missing_geo,
            report.duplicate_id
        );
    }
    if report.shadowed_properties > 0 {
        warn!(
            "Discarded {} properties whose keys collided after normalization",
            report.shadowed_properties
        );
    }
    if !duplicates.is_empty() {
        warn!("Duplicate charger ids ignored: {:?}", duplicates);
    }

    if index.is_empty() {
        return Err(LoadError::Empty {
            dropped: report.dropped(),
        });
    }

    info!("Loaded {} chargers", report.loaded);
    Ok((index, report))
}

enum Rejected {
    MissingId,
    MissingGeo,
}

fn convert_feature(
    feature: RawFeature,
    primary_key: &str,
    shadowed: &mut usize,
) -> Result<ChargerRecord, Rejected> {
    let mut id = None;
    let mut properties = BTreeMap::new();
    let mut latitude = None;
    let mut longitude = None;

    for (key, value) in feature.properties.unwrap_or_default() {
        if key.eq_ignore_ascii_case(primary_key) {
            id = parse_id(&value);
            continue;
        }

        let lowered = key.to_lowercase();
        if lowered == LATITUDE {
            latitude = parse_degrees(&value);
            continue;
        }
        if lowered == LONGITUDE {
            longitude = parse_degrees(&value);
            continue;
        }

        let Some(text) = stringify(value) else {
            continue;
        };
        // `id` belongs to the typed primary key once flattened.
        let target = if lowered == ID {
            SOURCE_ID.to_string()
        } else {
            lowered
        };
        if !properties.contains_key(&target) {
            properties.insert(target, text);
        } else if !ChargerRecord::is_reserved_key(&key) && !properties.contains_key(&key) {
            properties.insert(key, text);
        } else {
            *shadowed += 1;
        }
    }

    let id = id.ok_or(Rejected::MissingId)?;

    if latitude.is_none() || longitude.is_none() {
        if let Some((lat, lon)) = feature.geometry.as_ref().and_then(point_geometry) {
            latitude = latitude.or(Some(lat));
            longitude = longitude.or(Some(lon));
        }
    }

    let (Some(lat), Some(lon)) = (latitude, longitude) else {
        return Err(Rejected::MissingGeo);
    };
    let position = Coordinate::new(lat, lon).map_err(|_| Rejected::MissingGeo)?;

    Ok(ChargerRecord::new(id, position).with_properties(properties))
}

fn parse_id(value: &Value) -> Option<ChargerId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_degrees(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn point_geometry(geometry: &RawGeometry) -> Option<(f64, f64)> {
    if !geometry.kind.eq_ignore_ascii_case("point") {
        return None;
    }
    // GeoJSON order is [longitude, latitude].
    let coords = geometry.coordinates.as_array()?;
    let lon = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Some((lat, lon))
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}
