//! Time-driven ring animation.
//!
//! The engine owns one [`Ring`] per configured ring and recomputes all of them
//! from the elapsed animation time on every tick. It has no clock of its own:
//! the host calls [`WaveEngine::advance`] from its frame callback.

use std::{fmt, time::Duration};

use kurbo::Rect;

use crate::{timeline::AnimationClock, WaveConfig};

/// Linear alpha for a ring grown by `growth` pixels: `start_alpha` at the
/// child's edge, `end_alpha` at full growth, clamped to `[0, 1]`.
///
/// A `max_ring_growth` of zero describes a static ring that never fades, so
/// the result is always `start_alpha`.
pub fn alpha_for_growth(config: &WaveConfig, growth: f64) -> f64 {
    let start = config.start_alpha();
    let end = config.end_alpha();
    if config.max_ring_growth() == 0 {
        return start.clamp(0.0, 1.0);
    }

    let max = f64::from(config.max_ring_growth());
    let alpha = if growth >= max {
        end
    } else {
        start - growth * (start - end) / max
    };
    alpha.clamp(0.0, 1.0)
}

/// Growth and opacity of a single ring at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingState {
    /// Outward offset from the child's edge, in pixels.
    pub growth: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

impl RingState {
    /// Reset state: no growth, fully transparent.
    pub const COLLAPSED: Self = Self {
        growth: 0.0,
        alpha: 0.0,
    };
}

/// Where a ring is within its own timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPhase {
    /// The engine is stopped.
    Idle,
    /// Running, but the ring's start delay has not elapsed yet.
    Pending,
    /// Sweeping through a cycle.
    Active,
    /// All repeats played; the final frame is held.
    Finished,
}

#[derive(Debug, Clone)]
pub struct Ring {
    index: u32,
    start_delay: Duration,
    phase: RingPhase,
    state: RingState,
}

impl Ring {
    fn new(index: u32, start_delay: Duration) -> Self {
        Self {
            index,
            start_delay,
            phase: RingPhase::Idle,
            state: RingState::COLLAPSED,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn start_delay(&self) -> Duration {
        self.start_delay
    }

    pub fn phase(&self) -> RingPhase {
        self.phase
    }

    pub fn state(&self) -> RingState {
        self.state
    }

    pub fn growth(&self) -> f64 {
        self.state.growth
    }

    pub fn alpha(&self) -> f64 {
        self.state.alpha
    }

    /// The child box expanded by the current growth on all four sides.
    pub fn bounds(&self, child_box: Rect) -> Rect {
        child_box.inflate(self.state.growth, self.state.growth)
    }

    fn reset(&mut self) {
        self.phase = RingPhase::Idle;
        self.state = RingState::COLLAPSED;
    }

    /// Recomputes the ring at `elapsed`. Returns whether anything changed.
    fn sample(&mut self, config: &WaveConfig, elapsed: Duration) -> bool {
        let previous = (self.phase, self.state);
        let (phase, state) = Self::evaluate(self.start_delay, config, elapsed);
        self.phase = phase;
        self.state = state;
        (phase, state) != previous
    }

    fn evaluate(
        start_delay: Duration,
        config: &WaveConfig,
        elapsed: Duration,
    ) -> (RingPhase, RingState) {
        let Some(local) = elapsed.checked_sub(start_delay) else {
            let state = RingState {
                growth: 0.0,
                alpha: alpha_for_growth(config, 0.0),
            };
            return (RingPhase::Pending, state);
        };

        let cycle = config.cycle_duration().as_nanos().max(1);
        let local = local.as_nanos();
        let iteration = local / cycle;
        let max = f64::from(config.max_ring_growth());

        if let Some(total) = config.repeat_count().total_cycles() {
            if iteration >= u128::from(total) {
                let state = RingState {
                    growth: max,
                    alpha: alpha_for_growth(config, max),
                };
                return (RingPhase::Finished, state);
            }
        }

        // Restart mode: every repeat sweeps from zero again.
        let fraction = (local % cycle) as f64 / cycle as f64;
        let growth = fraction * max;
        let state = RingState {
            growth,
            alpha: alpha_for_growth(config, growth),
        };
        (RingPhase::Active, state)
    }
}

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Handle returned by [`WaveEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked once per tick that changed at least one ring, after every
/// ring has been updated.
pub type RingListener = Box<dyn FnMut(&[Ring])>;

pub struct WaveEngine {
    config: WaveConfig,
    rings: Vec<Ring>,
    clock: AnimationClock,
    state: EngineState,
    listeners: Vec<(SubscriptionId, RingListener)>,
    next_subscription: u64,
}

impl WaveEngine {
    pub fn new(config: WaveConfig) -> Self {
        let rings = (0..config.ring_count())
            .map(|index| Ring::new(index, config.start_delay(index)))
            .collect();
        Self {
            config,
            rings,
            clock: AnimationClock::default(),
            state: EngineState::Stopped,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn engine_state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Current growth and alpha of ring `index`.
    pub fn state(&self, index: usize) -> Option<RingState> {
        self.rings.get(index).map(Ring::state)
    }

    /// True once every ring has played all of its repeats. Never true for an
    /// infinite animation or an engine without rings.
    pub fn is_finished(&self) -> bool {
        !self.rings.is_empty()
            && self
                .rings
                .iter()
                .all(|ring| ring.phase == RingPhase::Finished)
    }

    /// Registers a per-tick listener. Listeners live until unsubscribed or
    /// until [`WaveEngine::stop`].
    pub fn subscribe(&mut self, listener: impl FnMut(&[Ring]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Starts every ring from the beginning of its timeline. Restarts if the
    /// engine was already running or paused.
    pub fn start(&mut self) {
        tracing::debug!(
            rings = self.rings.len(),
            restart = self.state != EngineState::Stopped,
            "starting wave animation"
        );
        self.clock.reset();
        self.state = EngineState::Running;
        self.sample_and_notify();
    }

    pub fn pause(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        tracing::debug!(elapsed = ?self.clock.elapsed(), "pausing wave animation");
        self.clock.pause();
        self.state = EngineState::Paused;
    }

    pub fn resume(&mut self) {
        if self.state != EngineState::Paused {
            return;
        }
        tracing::debug!(elapsed = ?self.clock.elapsed(), "resuming wave animation");
        self.clock.resume();
        self.state = EngineState::Running;
    }

    /// Detaches every listener and collapses every ring to zero growth and
    /// zero alpha. Safe to call in any state, any number of times.
    pub fn stop(&mut self) {
        if self.state != EngineState::Stopped {
            tracing::debug!(elapsed = ?self.clock.elapsed(), "stopping wave animation");
        }
        self.listeners.clear();
        self.clock.reset();
        self.state = EngineState::Stopped;
        for ring in &mut self.rings {
            ring.reset();
        }
    }

    /// Scheduler tick. Moves time forward by `delta`, recomputes every ring,
    /// then notifies listeners once if any ring changed. Ticks that arrive while stopped or paused
    /// are dropped and `false` is returned.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if self.state != EngineState::Running {
            tracing::trace!(state = ?self.state, ?delta, "ignoring tick");
            return false;
        }
        self.clock.advance(delta);
        self.sample_and_notify();
        true
    }

    fn sample_and_notify(&mut self) {
        let elapsed = self.clock.elapsed();
        let mut changed = false;
        for ring in &mut self.rings {
            changed |= ring.sample(&self.config, elapsed);
        }
        if !changed {
            return;
        }
        for (_, listener) in &mut self.listeners {
            listener(&self.rings);
        }
    }
}

impl fmt::Debug for WaveEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("elapsed", &self.clock.elapsed())
            .field("rings", &self.rings)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::RepeatCount;

    const EPSILON: f64 = 1e-9;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn running_engine(config: WaveConfig) -> WaveEngine {
        let mut engine = WaveEngine::new(config);
        engine.start();
        engine
    }

    fn growths(engine: &WaveEngine) -> Vec<f64> {
        engine.rings().iter().map(Ring::growth).collect()
    }

    #[test]
    fn alpha_interpolates_between_endpoints() {
        let config = WaveConfig::default();
        assert_eq!(alpha_for_growth(&config, 0.0), 1.0);
        assert_eq!(alpha_for_growth(&config, 50.0), 0.0);

        let mut previous = f64::INFINITY;
        for step in 0..=50 {
            let alpha = alpha_for_growth(&config, f64::from(step));
            assert!(alpha <= previous);
            assert!((alpha - (1.0 - f64::from(step) / 50.0)).abs() < EPSILON);
            previous = alpha;
        }
    }

    #[test]
    fn alpha_increases_when_end_exceeds_start() {
        let config = WaveConfig::builder()
            .start_alpha(0.2)
            .end_alpha(0.9)
            .max_ring_growth(10)
            .build()
            .unwrap();
        assert_eq!(alpha_for_growth(&config, 0.0), 0.2);
        assert_eq!(alpha_for_growth(&config, 10.0), 0.9);
        assert!(alpha_for_growth(&config, 4.0) < alpha_for_growth(&config, 6.0));
    }

    #[test]
    fn rings_carry_evenly_spaced_delays() {
        let engine = WaveEngine::new(WaveConfig::default());
        let delays: Vec<Duration> = engine.rings().iter().map(Ring::start_delay).collect();
        assert_eq!(delays, vec![ms(0), ms(250), ms(500), ms(750)]);
    }

    #[test]
    fn staggered_rings_at_one_eighth_cycle() {
        let mut engine = running_engine(WaveConfig::default());
        assert_eq!(growths(&engine), vec![0.0; 4]);

        engine.advance(ms(125));
        let first = engine.state(0).unwrap();
        assert!((first.growth - 6.25).abs() < EPSILON);
        assert!((first.alpha - 0.875).abs() < EPSILON);

        for index in 1..4 {
            let ring = &engine.rings()[index];
            assert_eq!(ring.phase(), RingPhase::Pending);
            assert_eq!(ring.state(), RingState { growth: 0.0, alpha: 1.0 });
        }
    }

    #[test]
    fn delayed_ring_keeps_constant_phase_difference() {
        let mut engine = running_engine(WaveConfig::default());
        engine.advance(ms(400));
        let rings = engine.rings();
        assert!((rings[0].growth() - 20.0).abs() < EPSILON);
        assert!((rings[1].growth() - 7.5).abs() < EPSILON);
        assert_eq!(rings[2].phase(), RingPhase::Pending);
    }

    #[test]
    fn cycles_restart_from_zero() {
        let mut engine = running_engine(WaveConfig::default());
        engine.advance(ms(999));
        assert!(engine.state(0).unwrap().growth > 49.0);
        engine.advance(ms(1));
        assert_eq!(engine.state(0).unwrap().growth, 0.0);
        engine.advance(ms(500));
        assert!((engine.state(0).unwrap().growth - 25.0).abs() < EPSILON);
    }

    #[test]
    fn finite_repeats_hold_the_final_frame() {
        let config = WaveConfig::builder()
            .ring_count(2)
            .repeat_count(RepeatCount::Times(1))
            .build()
            .unwrap();
        let mut engine = running_engine(config);

        engine.advance(ms(1999));
        assert!(!engine.is_finished());
        assert_eq!(engine.rings()[0].phase(), RingPhase::Active);

        engine.advance(ms(1));
        assert_eq!(engine.rings()[0].phase(), RingPhase::Finished);
        assert_eq!(engine.state(0), Some(RingState { growth: 50.0, alpha: 0.0 }));
        assert!(!engine.is_finished());

        engine.advance(ms(500));
        assert!(engine.is_finished());
        assert!(engine.is_running());
    }

    #[test]
    fn stop_is_an_idempotent_hard_reset() {
        let mut engine = WaveEngine::new(WaveConfig::default());
        engine.stop();
        engine.stop();

        engine.start();
        engine.advance(ms(640));
        engine.stop();
        engine.stop();

        assert_eq!(engine.engine_state(), EngineState::Stopped);
        assert_eq!(engine.elapsed(), Duration::ZERO);
        for ring in engine.rings() {
            assert_eq!(ring.state(), RingState::COLLAPSED);
            assert_eq!(ring.phase(), RingPhase::Idle);
        }
    }

    #[test]
    fn ticks_after_stop_are_ignored() {
        let mut engine = running_engine(WaveConfig::default());
        engine.advance(ms(100));
        engine.stop();

        assert!(!engine.advance(ms(100)));
        assert_eq!(growths(&engine), vec![0.0; 4]);
        assert_eq!(engine.state(0).unwrap().alpha, 0.0);
    }

    #[test]
    fn pause_and_resume_preserve_position() {
        let mut engine = running_engine(WaveConfig::default());
        engine.advance(ms(300));
        let before = engine.state(0).unwrap();

        engine.pause();
        assert!(!engine.advance(ms(5000)));
        assert_eq!(engine.state(0).unwrap(), before);

        engine.resume();
        assert_eq!(engine.state(0).unwrap(), before);
        assert_eq!(engine.elapsed(), ms(300));

        engine.advance(ms(100));
        assert!((engine.state(0).unwrap().growth - 20.0).abs() < EPSILON);
    }

    #[test]
    fn pause_and_resume_outside_their_states_are_no_ops() {
        let mut engine = WaveEngine::new(WaveConfig::default());
        engine.pause();
        assert_eq!(engine.engine_state(), EngineState::Stopped);
        engine.resume();
        assert_eq!(engine.engine_state(), EngineState::Stopped);

        engine.start();
        engine.resume();
        assert_eq!(engine.engine_state(), EngineState::Running);
    }

    #[test]
    fn start_while_running_restarts_phases() {
        let mut engine = running_engine(WaveConfig::default());
        engine.advance(ms(700));
        engine.start();
        assert_eq!(engine.elapsed(), Duration::ZERO);
        assert_eq!(growths(&engine), vec![0.0; 4]);

        engine.pause();
        engine.start();
        assert!(engine.is_running());
    }

    #[test]
    fn static_ring_never_grows_or_fades() {
        let config = WaveConfig::builder()
            .max_ring_growth(0)
            .start_alpha(0.6)
            .repeat_count(RepeatCount::Times(0))
            .build()
            .unwrap();
        let mut engine = running_engine(config);
        for _ in 0..200 {
            engine.advance(ms(16));
            for ring in engine.rings() {
                assert_eq!(ring.growth(), 0.0);
                assert_eq!(ring.alpha(), 0.6);
            }
        }
    }

    #[test]
    fn zero_rings_is_inert() {
        let config = WaveConfig::builder().ring_count(0).build().unwrap();
        let mut engine = running_engine(config);
        assert!(engine.advance(ms(16)));
        assert_eq!(engine.ring_count(), 0);
        assert!(engine.state(0).is_none());
        assert!(!engine.is_finished());
    }

    #[test]
    fn listeners_see_complete_frames_until_stopped() {
        let seen: Rc<RefCell<Vec<Vec<f64>>>> = Rc::default();
        let mut engine = WaveEngine::new(WaveConfig::default());
        let sink = Rc::clone(&seen);
        engine.subscribe(move |rings| {
            sink.borrow_mut()
                .push(rings.iter().map(Ring::growth).collect());
        });

        engine.start();
        engine.advance(ms(500));
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1], vec![25.0, 12.5, 0.0, 0.0]);

        engine.stop();
        assert_eq!(engine.listener_count(), 0);
        engine.start();
        engine.advance(ms(16));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn finished_run_stops_notifying() {
        let config = WaveConfig::builder()
            .ring_count(2)
            .repeat_count(RepeatCount::Times(0))
            .build()
            .unwrap();
        let ticks = Rc::new(RefCell::new(0));
        let mut engine = WaveEngine::new(config);
        let counter = Rc::clone(&ticks);
        engine.subscribe(move |_| *counter.borrow_mut() += 1);

        engine.start();
        engine.advance(ms(1500));
        assert!(engine.is_finished());
        let after_finish = *ticks.borrow();
        assert_eq!(after_finish, 2);

        for _ in 0..10 {
            assert!(engine.advance(ms(16)));
        }
        assert_eq!(*ticks.borrow(), after_finish);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let count = Rc::new(RefCell::new(0));
        let mut engine = WaveEngine::new(WaveConfig::default());
        let first = engine.subscribe(|_| {});
        let counter = Rc::clone(&count);
        engine.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(engine.unsubscribe(first));
        assert!(!engine.unsubscribe(first));
        engine.start();
        assert_eq!(engine.listener_count(), 1);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn ring_bounds_inflate_child_box() {
        let mut engine = running_engine(WaveConfig::default());
        engine.advance(ms(200));
        let bounds = engine.rings()[0].bounds(Rect::new(50.0, 50.0, 150.0, 90.0));
        assert!((bounds.x0 - 40.0).abs() < EPSILON);
        assert!((bounds.y0 - 40.0).abs() < EPSILON);
        assert!((bounds.x1 - 160.0).abs() < EPSILON);
        assert!((bounds.y1 - 100.0).abs() < EPSILON);
    }
}
