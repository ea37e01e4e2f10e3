//! Presentation-facing payloads derived from the engine view.
//!
//! The engine hands over borrowed `WeightedEvent`s; everything here converts
//! them into owned, serializable messages for HTTP responses and the
//! WebSocket stream.

use catalog::{Event, Feature, FeatureCollection, Histogram, depth_histogram, magnitude_histogram};
use foundation::time::utc_label;
use playback::{ViewSink, WeightedEvent};
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;

/// One complete view message: the filtered, weighted event set at a clock
/// instant. Pushed after every tick and refresh, served on demand at `/view`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewUpdate {
    pub clock_ms: i64,
    pub clock_label: String,
    pub full_replace: bool,
    pub events: FeatureCollection,
}

impl ViewUpdate {
    pub fn build(clock_ms: i64, events: &[WeightedEvent<'_>], full_replace: bool) -> Self {
        let features = events
            .iter()
            .map(|w| {
                let mut feature = Feature::from_event(w.event);
                feature
                    .properties
                    .insert("weight".to_string(), json!(w.weight));
                feature
            })
            .collect();

        ViewUpdate {
            clock_ms,
            clock_label: utc_label(clock_ms),
            full_replace,
            events: FeatureCollection {
                features,
                ..Default::default()
            },
        }
    }
}

/// Forwards every engine notification onto the WebSocket broadcast channel.
pub struct BroadcastSink {
    tx: broadcast::Sender<ViewUpdate>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<ViewUpdate>) -> Self {
        Self { tx }
    }
}

impl ViewSink for BroadcastSink {
    fn on_view(&mut self, clock_ms: i64, events: &[WeightedEvent<'_>], full_replace: bool) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let _ = self.tx.send(ViewUpdate::build(clock_ms, events, full_replace));
    }
}

const DASH: &str = "—";

/// Display row of the event table, formatting applied server-side so every
/// consumer shows the same dashes and precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub time: String,
    pub title: String,
    pub mag: String,
    pub depth_km: String,
    pub network: String,
    pub tsunami: u8,
    pub lon: String,
    pub lat: String,
    pub url: Option<String>,
}

/// Table rows for the current view, newest first.
pub fn table_rows(events: &[WeightedEvent<'_>]) -> Vec<TableRow> {
    let mut sorted: Vec<&Event> = events.iter().map(|w| w.event).collect();
    sorted.sort_by(|a, b| b.time_ms.cmp(&a.time_ms));
    sorted.into_iter().map(row_of).collect()
}

fn row_of(event: &Event) -> TableRow {
    let dash = || DASH.to_string();
    TableRow {
        time: utc_label(event.time_ms),
        title: event.title.clone(),
        mag: event
            .magnitude
            .map(|m| format!("{m:.1}"))
            .unwrap_or_else(dash),
        depth_km: event
            .depth_km()
            .map(|d| format!("{d:.1}"))
            .unwrap_or_else(dash),
        network: if event.network.is_empty() {
            dash()
        } else {
            event.network.clone()
        },
        tsunami: u8::from(event.tsunami),
        lon: event
            .position
            .map(|p| format!("{:.3}", p.lon))
            .unwrap_or_else(dash),
        lat: event
            .position
            .map(|p| format!("{:.3}", p.lat))
            .unwrap_or_else(dash),
        url: event.url.clone(),
    }
}

/// Histograms over the current filtered view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    pub event_count: usize,
    pub magnitude: Option<Histogram>,
    pub depth_km: Option<Histogram>,
}

pub fn view_stats(events: &[WeightedEvent<'_>], bin_count: usize) -> ViewStats {
    let refs: Vec<&Event> = events.iter().map(|w| w.event).collect();
    ViewStats {
        event_count: refs.len(),
        magnitude: magnitude_histogram(&refs, bin_count),
        depth_km: depth_histogram(&refs, bin_count),
    }
}

#[cfg(test)]
mod tests {
    use catalog::{Event, Position};
    use playback::WeightedEvent;

    use super::{DASH, ViewUpdate, table_rows, view_stats};

    fn event(id: &str, time_ms: i64, mag: Option<f64>) -> Event {
        Event {
            id: id.to_string(),
            position: Some(Position {
                lon: 10.1234,
                lat: -20.5,
                depth_km: Some(33.0),
            }),
            time_ms,
            magnitude: mag,
            network: "us".to_string(),
            tsunami: false,
            title: format!("event {id}"),
            url: None,
        }
    }

    #[test]
    fn rows_sort_newest_first_with_display_formatting() {
        let older = event("a", 1000, Some(5.25));
        let newer = event("b", 2000, None);
        let view = [
            WeightedEvent {
                event: &older,
                weight: 1.0,
            },
            WeightedEvent {
                event: &newer,
                weight: 1.0,
            },
        ];

        let rows = table_rows(&view);
        assert_eq!(rows[0].title, "event b");
        assert_eq!(rows[0].mag, DASH);
        assert_eq!(rows[1].mag, "5.2");
        assert_eq!(rows[1].lon, "10.123");
        assert_eq!(rows[1].depth_km, "33.0");
    }

    #[test]
    fn rows_dash_out_missing_position() {
        let mut bare = event("a", 1000, None);
        bare.position = None;
        bare.network = String::new();
        let view = [WeightedEvent {
            event: &bare,
            weight: 1.0,
        }];

        let row = &table_rows(&view)[0];
        assert_eq!(row.lon, DASH);
        assert_eq!(row.lat, DASH);
        assert_eq!(row.depth_km, DASH);
        assert_eq!(row.network, DASH);
    }

    #[test]
    fn view_update_attaches_weights_to_features() {
        let e = event("a", 1000, Some(4.0));
        let view = [WeightedEvent {
            event: &e,
            weight: 0.4,
        }];

        let update = ViewUpdate::build(1500, &view, true);
        assert!(update.full_replace);
        assert_eq!(update.clock_label, "1970-01-01 00:00:01.500 Z");
        let weight = update.events.features[0]
            .properties
            .get("weight")
            .and_then(|v| v.as_f64());
        assert_eq!(weight, Some(0.4));
    }

    #[test]
    fn stats_cover_only_present_values() {
        let a = event("a", 1000, Some(4.0));
        let b = event("b", 2000, None);
        let view = [
            WeightedEvent {
                event: &a,
                weight: 1.0,
            },
            WeightedEvent {
                event: &b,
                weight: 1.0,
            },
        ];

        let stats = view_stats(&view, 10);
        assert_eq!(stats.event_count, 2);
        assert_eq!(stats.magnitude.unwrap().summary.count, 1);
        assert_eq!(stats.depth_km.unwrap().summary.count, 2);
    }
}
