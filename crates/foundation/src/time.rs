use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Milliseconds of history per compressed playback hour.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// A bounded replay window in epoch milliseconds, endpoints inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Windows must be non-degenerate before playback starts.
    pub fn is_valid(&self) -> bool {
        self.start_ms < self.end_ms
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end_ms - self.start_ms).max(0)
    }

    pub fn contains(&self, t_ms: i64) -> bool {
        t_ms >= self.start_ms && t_ms <= self.end_ms
    }
}

/// UTC clock readout: `2024-01-01 00:00:00.000 Z`.
///
/// Existing consumers expect a space before the `Z`, not a bare ISO suffix.
pub fn utc_label(t_ms: i64) -> String {
    match Utc.timestamp_millis_opt(t_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f Z").to_string(),
        // Out of chrono's representable range; still total.
        None => format!("{t_ms} ms"),
    }
}

/// Lenient UTC timestamp parse used by the feed normalizer.
///
/// Accepts RFC 3339 and the common `YYYY-MM-DD HH:MM:SS[.fff]` form
/// (with either a space or a `T` separator), interpreted as UTC.
pub fn parse_utc_ms(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    None
}
