use std::time::Duration;

use pulse_wave_core::{Canvas, PulseLayout, Result, Size, WaveConfig};

/// Single-widget host: a pulse layout around one fixed-size child, toggled by
/// taps.
#[derive(Debug)]
pub struct HostScreen {
    layout: PulseLayout,
    size: Size,
    animating: bool,
}

impl HostScreen {
    pub fn new(config: WaveConfig, child: Size) -> Result<Self> {
        let mut layout = PulseLayout::new(config);
        let size = layout.measure(&[child])?;
        Ok(Self {
            layout,
            size,
            animating: false,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn layout(&self) -> &PulseLayout {
        &self.layout
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Starts the wave when idle, stops it when running.
    pub fn on_tap(&mut self) {
        if self.animating {
            self.layout.stop_animation();
        } else {
            self.layout.start_animation();
        }
        self.animating = !self.animating;
        tracing::info!(animating = self.animating, "tap");
    }

    /// One frame of the host loop: tick the widget, then paint if anything
    /// changed. Returns whether a paint happened.
    pub fn frame<C: Canvas + ?Sized>(&mut self, delta: Duration, canvas: &mut C) -> bool {
        self.layout.tick(delta);
        self.paint_pending(canvas)
    }

    /// Paints only if the layout has a redraw pending, without advancing time.
    pub fn paint_pending<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> bool {
        if !self.layout.needs_redraw() {
            return false;
        }
        self.layout.on_redraw_requested(canvas);
        true
    }
}
