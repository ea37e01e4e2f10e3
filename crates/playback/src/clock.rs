use foundation::time::{MS_PER_HOUR, TimeWindow, utc_label};

/// Replay clock over a bounded historical window.
///
/// The clock is virtual: real elapsed seconds are scaled by a configurable
/// hours-per-second compression factor. Crossing the window end wraps back to
/// the start (loop, never clamp-and-stop), so a replay of the window is
/// reproducible indefinitely. It starts paused at the window start.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualClock {
    window: TimeWindow,
    speed_hours_per_sec: f64,
    /// Fractional milliseconds accumulate between ticks at low speeds.
    now_ms: f64,
    playing: bool,
}

impl VirtualClock {
    pub fn new(window: TimeWindow, speed_hours_per_sec: f64) -> Self {
        Self {
            window,
            speed_hours_per_sec,
            now_ms: window.start_ms as f64,
            playing: false,
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    /// Idempotent.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Idempotent.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn speed_hours_per_sec(&self) -> f64 {
        self.speed_hours_per_sec
    }

    /// Zero and negative speeds are legal: zero freezes motion without
    /// pausing, negative replays backwards.
    pub fn set_speed_hours_per_sec(&mut self, speed: f64) {
        self.speed_hours_per_sec = speed;
    }

    /// Resets to the window start so a replay is deterministic, not "now".
    pub fn rewind(&mut self) {
        self.now_ms = self.window.start_ms as f64;
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms as i64
    }

    /// Readout in the `YYYY-MM-DD HH:MM:SS.mmm Z` form consumers expect.
    pub fn label(&self) -> String {
        utc_label(self.now_ms())
    }

    /// Advances the clock by `dt_s` real seconds while playing.
    ///
    /// Paused clocks ignore ticks entirely. A non-finite speed or delta
    /// advances by zero rather than corrupting the clock.
    pub fn advance(&mut self, dt_s: f64) {
        if !self.playing {
            return;
        }

        let step_ms = self.speed_hours_per_sec * dt_s * MS_PER_HOUR;
        if !step_ms.is_finite() {
            return;
        }

        self.now_ms += step_ms;
        if self.now_ms > self.window.end_ms as f64 {
            // Loop inside the window, hard reset to the start.
            self.now_ms = self.window.start_ms as f64;
        } else if self.now_ms < self.window.start_ms as f64 {
            self.now_ms = self.window.end_ms as f64;
        }
    }
}
