//! Feed-record normalization.
//!
//! `normalize` is total: every feature in the input collection yields exactly
//! one [`Event`], no matter how malformed the record is. Missing fields fall
//! back to defaults instead of dropping the record, so the operator can see
//! (and filter out) suspect data rather than losing it silently.

use serde_json::Value;

use crate::event::{Event, Position, UNKNOWN_TITLE};
use crate::geojson::{Feature, FeatureCollection, Geometry};

pub fn normalize(collection: &FeatureCollection) -> Vec<Event> {
    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| normalize_feature(index, feature))
        .collect()
}

fn normalize_feature(index: usize, feature: &Feature) -> Event {
    let props = &feature.properties;

    let id = feature
        .id
        .as_ref()
        .and_then(coerce_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("feature-{index}"));

    let title = props
        .get("title")
        .and_then(coerce_text)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            props
                .get("place")
                .and_then(coerce_text)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let network = props
        .get("net")
        .and_then(coerce_text)
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    Event {
        id,
        position: feature.geometry.as_ref().and_then(position_of),
        time_ms: resolve_time_ms(props),
        magnitude: props.get("mag").and_then(coerce_f64),
        network,
        tsunami: props.get("tsunami").map(coerce_flag).unwrap_or(false),
        title,
        url: props
            .get("url")
            .and_then(coerce_text)
            .filter(|s| !s.is_empty()),
    }
}

/// Deterministic time resolution: explicit millisecond field, then the feed's
/// native `time` field (also milliseconds), then an ISO string, then 0.
fn resolve_time_ms(props: &serde_json::Map<String, Value>) -> i64 {
    props
        .get("time_ms")
        .and_then(coerce_f64)
        .or_else(|| props.get("time").and_then(coerce_f64))
        .map(|ms| ms as i64)
        .or_else(|| {
            props
                .get("time_utc")
                .and_then(coerce_text)
                .and_then(|s| foundation::time::parse_utc_ms(&s))
        })
        .unwrap_or(0)
}

fn position_of(geometry: &Geometry) -> Option<Position> {
    let lon = geometry.coordinates.first().and_then(coerce_f64)?;
    let lat = geometry.coordinates.get(1).and_then(coerce_f64)?;
    Some(Position {
        lon,
        lat,
        depth_km: geometry.coordinates.get(2).and_then(coerce_f64),
    })
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Feeds report tsunami as the number 1; anything else is "no flag".
fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::normalize;
    use crate::event::UNKNOWN_TITLE;
    use crate::geojson::FeatureCollection;

    fn collection(value: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn resolves_time_through_fallback_chain() {
        let fc = collection(json!({
            "features": [
                { "properties": { "time_ms": 1500, "time": 9 } },
                { "properties": { "time": 2500 } },
                { "properties": { "time_utc": "1970-01-01T00:00:03Z" } },
                { "properties": { "time_utc": "garbage" } },
                { "properties": {} },
            ]
        }));

        let times: Vec<i64> = normalize(&fc).iter().map(|e| e.time_ms).collect();
        assert_eq!(times, vec![1500, 2500, 3000, 0, 0]);
    }

    #[test]
    fn keeps_records_without_usable_position() {
        let fc = collection(json!({
            "features": [
                { "geometry": { "coordinates": [10.0, 20.0, 30.0] }, "properties": {} },
                { "geometry": { "coordinates": ["bad", 20.0] }, "properties": {} },
                { "properties": {} },
            ]
        }));

        let events = normalize(&fc);
        assert_eq!(events.len(), 3);
        assert!(events[0].position.is_some());
        assert_eq!(events[0].depth_km(), Some(30.0));
        assert!(events[1].position.is_none());
        assert!(events[2].position.is_none());
    }

    #[test]
    fn coerces_numeric_strings_and_lowercases_network() {
        let fc = collection(json!({
            "features": [{
                "geometry": { "coordinates": ["10.5", "20.25"] },
                "properties": { "mag": "5.2", "net": "US", "tsunami": 1 }
            }]
        }));

        let events = normalize(&fc);
        let pos = events[0].position.unwrap();
        assert_eq!(pos.lon, 10.5);
        assert_eq!(pos.lat, 20.25);
        assert_eq!(events[0].magnitude, Some(5.2));
        assert_eq!(events[0].network, "us");
        assert!(events[0].tsunami);
    }

    #[test]
    fn falls_back_to_place_then_placeholder_for_title() {
        let fc = collection(json!({
            "features": [
                { "properties": { "title": "M 5.2 - somewhere" } },
                { "properties": { "place": "10km N of town" } },
                { "properties": { "title": "" } },
            ]
        }));

        let titles: Vec<&str> = normalize(&fc).iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["M 5.2 - somewhere", "10km N of town", UNKNOWN_TITLE]);
    }

    #[test]
    fn synthesizes_ids_for_records_without_one() {
        let fc = collection(json!({
            "features": [
                { "id": "us7000abcd", "properties": {} },
                { "properties": {} },
            ]
        }));

        let ids: Vec<&str> = normalize(&fc).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["us7000abcd", "feature-1"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let fc = collection(json!({
            "features": [
                {
                    "id": "us7000abcd",
                    "geometry": { "coordinates": [10.0, 20.0, 30.0] },
                    "properties": {
                        "time": 1000, "mag": 5.2, "net": "us", "tsunami": 1,
                        "title": "M 5.2 - somewhere", "url": "https://example.org/us7000abcd"
                    }
                },
                { "properties": { "place": "no position, no time" } },
            ]
        }));

        let first = normalize(&fc);
        let second = normalize(&FeatureCollection::from_events(&first));
        assert_eq!(first, second);
    }
}
