use std::{cell::Cell, rc::Rc, time::Duration};

use kurbo::{Point, Rect, Size};

use crate::{
    engine::{SubscriptionId, WaveEngine},
    render::Canvas,
    PulseWaveError, Result, WaveConfig,
};

/// Placement handed back to the single child after measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildLayout {
    pub origin: Point,
    pub size: Size,
}

/// Container that centers one child and paints the pulse rings around it.
///
/// The widget reserves `max_ring_growth` pixels on every side of the child so
/// a fully grown ring is never clipped.
#[derive(Debug)]
pub struct PulseLayout {
    engine: WaveEngine,
    measured: Option<Size>,
    child_box: Option<Rect>,
    redraw_pending: Rc<Cell<bool>>,
    subscription: Option<SubscriptionId>,
}

impl PulseLayout {
    pub fn new(config: WaveConfig) -> Self {
        Self {
            engine: WaveEngine::new(config),
            measured: None,
            child_box: None,
            redraw_pending: Rc::new(Cell::new(false)),
            subscription: None,
        }
    }

    pub fn engine(&self) -> &WaveEngine {
        &self.engine
    }

    pub fn config(&self) -> &WaveConfig {
        self.engine.config()
    }

    /// Sizes the widget around its children's measured sizes.
    ///
    /// Exactly one child is required. The returned size is the child's size
    /// grown by `2 * max_ring_growth` in each dimension, and the child is
    /// placed with a margin of `max_ring_growth` on all sides.
    pub fn measure(&mut self, children: &[Size]) -> Result<Size> {
        let [child] = children else {
            return Err(PulseWaveError::Configuration(format!(
                "must have exactly one child, found {}",
                children.len()
            )));
        };

        let margin = f64::from(self.config().max_ring_growth());
        let size = Size::new(child.width + 2.0 * margin, child.height + 2.0 * margin);
        self.child_box = Some(Rect::from_origin_size((margin, margin), *child));
        self.measured = Some(size);
        self.redraw_pending.set(true);

        tracing::debug!(?child, ?size, "measured pulse layout");
        Ok(size)
    }

    pub fn measured_size(&self) -> Option<Size> {
        self.measured
    }

    pub fn child_box(&self) -> Option<Rect> {
        self.child_box
    }

    pub fn child_layout(&self) -> Option<ChildLayout> {
        self.child_box.map(|rect| ChildLayout {
            origin: rect.origin(),
            size: rect.size(),
        })
    }

    /// Replaces the child box with the one produced by an external layout pass.
    pub fn set_child_box(&mut self, child_box: Rect) {
        self.child_box = Some(child_box);
        self.redraw_pending.set(true);
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw_pending.get()
    }

    /// Paints one rounded rectangle per ring, ring 0 first, so higher rings
    /// land on top where translucent rings overlap. Nothing is drawn before
    /// the first measurement.
    pub fn on_redraw_requested<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.redraw_pending.set(false);
        let Some(child_box) = self.child_box else {
            tracing::trace!("redraw requested before layout");
            return;
        };

        let config = self.engine.config();
        let radius = config.corner_radius();
        let color = config.color();
        for ring in self.engine.rings() {
            canvas.fill_round_rect(
                ring.bounds(child_box),
                radius,
                radius,
                color.with_alpha(ring.alpha()),
            );
        }
    }

    pub fn start_animation(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.engine.unsubscribe(id);
        }
        let pending = Rc::clone(&self.redraw_pending);
        self.subscription = Some(self.engine.subscribe(move |_| pending.set(true)));
        self.engine.start();
    }

    pub fn pause_animation(&mut self) {
        self.engine.pause();
    }

    pub fn resume_animation(&mut self) {
        self.engine.resume();
    }

    /// Stops the engine, which also drops the redraw subscription, then asks
    /// for one final paint of the collapsed rings.
    pub fn stop_animation(&mut self) {
        self.engine.stop();
        self.subscription = None;
        self.redraw_pending.set(true);
    }

    /// Forwards a frame tick to the engine.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.engine.advance(delta)
    }
}
