use catalog::Event;
use foundation::bounds::GeoBounds;
use foundation::time::TimeWindow;

/// Per-session filter parameters.
///
/// Numeric bounds are plain `f64`s where a non-finite value (NaN or infinity)
/// means "unbounded" on that side, matching the feed UI's open-ended sliders.
/// An empty text query, an empty network list, and a `None` bbox are all
/// pass-throughs.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub window: TimeWindow,
    pub mag_min: f64,
    pub mag_max: f64,
    pub depth_min: f64,
    pub depth_max: f64,
    pub tsunami_only: bool,
    /// Case-insensitive substring matched against the display title.
    pub text_query: String,
    /// Allow-list of network codes; empty allows all.
    pub networks: Vec<String>,
    pub bbox: Option<GeoBounds>,
}

impl FilterConfig {
    /// Everything unrestricted except the replay window.
    pub fn unrestricted(window: TimeWindow) -> Self {
        Self {
            window,
            mag_min: f64::NAN,
            mag_max: f64::NAN,
            depth_min: f64::NAN,
            depth_max: f64::NAN,
            tsunami_only: false,
            text_query: String::new(),
            networks: Vec::new(),
            bbox: None,
        }
    }

    /// Evaluates all predicates against one event, short-circuiting on the
    /// first failure. Pure and O(1); this runs once per event per tick.
    ///
    /// `clock_ceiling_ms` is the virtual clock: events later than
    /// `min(ceiling, window.end)` have not "happened yet" in the replay.
    pub fn passes(&self, event: &Event, clock_ceiling_ms: i64) -> bool {
        let ceiling = clock_ceiling_ms.min(self.window.end_ms);
        if event.time_ms < self.window.start_ms || event.time_ms > ceiling {
            return false;
        }

        let mag = event.magnitude_or_zero();
        if self.mag_min.is_finite() && mag < self.mag_min {
            return false;
        }
        if self.mag_max.is_finite() && mag > self.mag_max {
            return false;
        }

        // Depth is frequently absent in feed data; absent depth passes.
        if let Some(depth) = event.depth_km() {
            if self.depth_min.is_finite() && depth < self.depth_min {
                return false;
            }
            if self.depth_max.is_finite() && depth > self.depth_max {
                return false;
            }
        }

        if self.tsunami_only && !event.tsunami {
            return false;
        }

        if !self.text_query.is_empty()
            && !event
                .title
                .to_lowercase()
                .contains(&self.text_query.to_lowercase())
        {
            return false;
        }

        if !self.networks.is_empty()
            && !self
                .networks
                .iter()
                .any(|n| n.eq_ignore_ascii_case(&event.network))
        {
            return false;
        }

        if let Some(bbox) = &self.bbox {
            match &event.position {
                Some(p) => {
                    if !bbox.contains(p.lon, p.lat) {
                        return false;
                    }
                }
                // No coordinates cannot satisfy a spatial restriction.
                None => return false,
            }
        }

        true
    }
}
