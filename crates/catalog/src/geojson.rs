//! Loosely-typed feed schema, compatible with the public USGS GeoJSON feeds.
//!
//! Every field is optional or defaulted so that a partially malformed payload
//! still deserializes; per-record salvage is the normalizer's job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Open property bag; the normalizer coerces what it recognizes.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default = "geometry_type")]
    pub kind: String,
    /// `[lon, lat, depth_km?]`. Elements are coerced individually so one bad
    /// entry does not discard the rest.
    #[serde(default)]
    pub coordinates: Vec<Value>,
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn geometry_type() -> String {
    "Point".to_string()
}

impl Default for FeatureCollection {
    fn default() -> Self {
        FeatureCollection {
            kind: collection_type(),
            features: Vec::new(),
        }
    }
}

impl Feature {
    /// Re-encodes a normalized event in the feed schema.
    ///
    /// Used by the presentation surface (GeoJSON output) and by the
    /// normalizer's idempotence tests.
    pub fn from_event(event: &Event) -> Feature {
        let mut properties = Map::new();
        properties.insert("time_ms".to_string(), json!(event.time_ms));
        properties.insert("time".to_string(), json!(event.time_ms));
        if let Some(mag) = event.magnitude {
            properties.insert("mag".to_string(), json!(mag));
        }
        properties.insert("net".to_string(), json!(event.network));
        properties.insert("tsunami".to_string(), json!(i64::from(event.tsunami)));
        properties.insert("title".to_string(), json!(event.title));
        if let Some(url) = &event.url {
            properties.insert("url".to_string(), json!(url));
        }

        let geometry = event.position.map(|p| {
            let mut coordinates = vec![json!(p.lon), json!(p.lat)];
            if let Some(depth) = p.depth_km {
                coordinates.push(json!(depth));
            }
            Geometry {
                kind: geometry_type(),
                coordinates,
            }
        });

        Feature {
            kind: feature_type(),
            id: Some(Value::String(event.id.clone())),
            geometry,
            properties,
        }
    }
}

impl FeatureCollection {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> FeatureCollection {
        FeatureCollection {
            kind: collection_type(),
            features: events.into_iter().map(Feature::from_event).collect(),
        }
    }
}
