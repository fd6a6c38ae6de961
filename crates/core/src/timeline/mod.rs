use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Elapsed animation time. Only advances while running; pausing freezes it in
/// place so a resume continues from exactly the same position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnimationClock {
    elapsed: Duration,
    paused: bool,
}

impl AnimationClock {
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Adds `delta` unless paused. Returns whether time moved.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if self.paused {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(delta);
        true
    }
}

/// Fixed-interval frame source standing in for the platform's frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicker {
    interval: Duration,
}

impl Default for FrameTicker {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(16),
        }
    }
}

impl FrameTicker {
    /// Creates a ticker at `fps` frames per second. Zero falls back to the
    /// default interval.
    pub fn with_fps(fps: u32) -> Self {
        if fps == 0 {
            return Self::default();
        }
        Self {
            interval: Duration::from_secs(1) / fps,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frame deltas covering `total`. The final delta is shortened so the sum
    /// lands exactly on `total`.
    pub fn ticks_until(&self, total: Duration) -> impl Iterator<Item = Duration> {
        let interval = self.interval;
        let mut covered = Duration::ZERO;
        std::iter::from_fn(move || {
            if covered >= total || interval.is_zero() {
                return None;
            }
            let step = interval.min(total - covered);
            covered += step;
            Some(step)
        })
    }
}

/// Labelled point on the host's timeline, such as a simulated tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub at: Duration,
    pub label: String,
}

impl ScheduledEvent {
    pub fn new(at: Duration, label: impl Into<String>) -> Self {
        Self {
            at,
            label: label.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    events: Vec<ScheduledEvent>,
    next_event: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_events(&mut self, events: Vec<ScheduledEvent>) {
        self.events = events;
        self.events.sort_by_key(|event| event.at);
        self.next_event = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_event >= self.events.len()
    }

    /// Returns every not-yet-fired event whose time is at or before `now`, in
    /// time order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<ScheduledEvent> {
        let start = self.next_event;
        while let Some(event) = self.events.get(self.next_event) {
            if event.at > now {
                break;
            }
            self.next_event += 1;
        }
        self.events[start..self.next_event].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_clock_ignores_ticks() {
        let mut clock = AnimationClock::default();
        assert!(clock.advance(Duration::from_millis(40)));
        clock.pause();
        assert!(!clock.advance(Duration::from_millis(500)));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
        clock.resume();
        clock.advance(Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(50));

        clock.reset();
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert!(clock.advance(Duration::from_millis(5)));
    }

    #[test]
    fn ticker_covers_total_exactly() {
        let ticker = FrameTicker::with_fps(50);
        assert_eq!(ticker.interval(), Duration::from_millis(20));

        let ticks: Vec<Duration> = ticker.ticks_until(Duration::from_millis(50)).collect();
        assert_eq!(
            ticks,
            vec![
                Duration::from_millis(20),
                Duration::from_millis(20),
                Duration::from_millis(10)
            ]
        );
        assert_eq!(ticker.ticks_until(Duration::ZERO).count(), 0);
    }

    #[test]
    fn zero_fps_uses_default_interval() {
        assert_eq!(FrameTicker::with_fps(0), FrameTicker::default());
    }

    #[test]
    fn scheduler_fires_events_in_order_once() {
        let mut scheduler = Scheduler::new();
        scheduler.set_events(vec![
            ScheduledEvent::new(Duration::from_millis(300), "b"),
            ScheduledEvent::new(Duration::from_millis(100), "a"),
        ]);

        assert!(scheduler.drain_due(Duration::from_millis(50)).is_empty());
        let due = scheduler.drain_due(Duration::from_millis(300));
        let labels: Vec<&str> = due.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert!(scheduler.is_exhausted());
        assert!(scheduler.drain_due(Duration::from_secs(10)).is_empty());
    }
}
