use serde::{Deserialize, Serialize};

/// Display title used when a feed record carries neither title nor place.
pub const UNKNOWN_TITLE: &str = "Unknown event";

/// Epicenter in WGS84 degrees, depth in kilometers when the feed reports one.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
    pub depth_km: Option<f64>,
}

/// One normalized seismic record.
///
/// Immutable once produced by the normalizer; a refresh replaces the whole
/// catalog rather than mutating events in place. `id` is unique within a
/// snapshot but may repeat across snapshots for the same real-world event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Absent when the record had no usable coordinates. Such events still
    /// participate in time/magnitude/text filtering.
    pub position: Option<Position>,
    /// Always resolved; records with no time information carry 0 so the
    /// operator can spot them instead of losing them silently.
    pub time_ms: i64,
    /// Absent magnitude compares as 0 against thresholds but displays as unknown.
    pub magnitude: Option<f64>,
    /// Lowercase reporting-network code, possibly empty.
    pub network: String,
    pub tsunami: bool,
    pub title: String,
    pub url: Option<String>,
}

impl Event {
    pub fn magnitude_or_zero(&self) -> f64 {
        self.magnitude.unwrap_or(0.0)
    }

    pub fn depth_km(&self) -> Option<f64> {
        self.position.and_then(|p| p.depth_km)
    }
}
