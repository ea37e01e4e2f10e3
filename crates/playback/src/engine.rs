//! Engine state and the tick/refresh entry points.
//!
//! All mutable replay state lives here, owned explicitly and passed to the
//! filter and weighter by reference. Presentation is decoupled behind the
//! [`ViewSink`] observer so the engine is testable without any rendering
//! surface.

use catalog::Event;

use crate::clock::VirtualClock;
use crate::decay::DecayCurve;
use crate::filter::FilterConfig;

/// One surviving event plus its advisory presentation weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEvent<'a> {
    pub event: &'a Event,
    pub weight: f64,
}

/// Observer registered by the presentation sink.
///
/// Called once per tick while playing and once immediately after every
/// successful refresh (with `full_replace = true`).
pub trait ViewSink: Send + Sync {
    fn on_view(&mut self, clock_ms: i64, events: &[WeightedEvent<'_>], full_replace: bool);
}

pub struct Engine {
    events: Vec<Event>,
    filter: FilterConfig,
    clock: VirtualClock,
    decay: DecayCurve,
    sinks: Vec<Box<dyn ViewSink>>,
}

impl Engine {
    pub fn new(filter: FilterConfig, clock: VirtualClock, decay: DecayCurve) -> Self {
        Self {
            events: Vec::new(),
            filter,
            clock,
            decay,
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn ViewSink>) {
        self.sinks.push(sink);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn rewind(&mut self) {
        self.clock.rewind();
    }

    pub fn clock_label(&self) -> String {
        self.clock.label()
    }

    /// The current filtered view with decay weights attached. O(n), no
    /// cross-event state; safe to call on every animation frame.
    pub fn view(&self) -> Vec<WeightedEvent<'_>> {
        compute_view(
            &self.events,
            &self.filter,
            &self.decay,
            self.clock.now_ms(),
        )
    }

    /// Advances one tick of `dt_s` real seconds.
    ///
    /// Ticks are delivered while paused too, but then neither move the clock
    /// nor notify sinks.
    pub fn tick(&mut self, dt_s: f64) {
        self.clock.advance(dt_s);
        if self.clock.playing() {
            self.notify(false);
        }
    }

    /// Atomically replaces the event set after a successful refresh.
    ///
    /// Playback state survives the swap untouched.
    pub fn replace_events(&mut self, events: Vec<Event>) {
        self.events = events;
        self.notify(true);
    }

    fn notify(&mut self, full_replace: bool) {
        let clock_ms = self.clock.now_ms();
        let view = compute_view(&self.events, &self.filter, &self.decay, clock_ms);
        for sink in &mut self.sinks {
            sink.on_view(clock_ms, &view, full_replace);
        }
    }
}

fn compute_view<'a>(
    events: &'a [Event],
    filter: &FilterConfig,
    decay: &DecayCurve,
    clock_ms: i64,
) -> Vec<WeightedEvent<'a>> {
    events
        .iter()
        .filter(|e| filter.passes(e, clock_ms))
        .map(|e| WeightedEvent {
            event: e,
            weight: decay.weight(e.time_ms, clock_ms),
        })
        .collect()
}
