use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::Rgba;

/// Drawing surface supplied by the platform. The widget only ever needs a
/// filled rounded rectangle; rasterization is the implementor's business.
pub trait Canvas {
    fn fill_round_rect(&mut self, rect: Rect, radius_x: f64, radius_y: f64, color: Rgba);
}

/// A single recorded `fill_round_rect` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCall {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub radius_x: f64,
    pub radius_y: f64,
    pub color: Rgba,
}

impl DrawCall {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

/// Canvas that keeps every call instead of painting. Used by tests and by the
/// preview tool to dump frames.
#[derive(Debug, Default, Clone)]
pub struct RecordingCanvas {
    calls: Vec<DrawCall>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Hands back the recorded calls and leaves the canvas empty.
    pub fn take(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Canvas for RecordingCanvas {
    fn fill_round_rect(&mut self, rect: Rect, radius_x: f64, radius_y: f64, color: Rgba) {
        self.calls.push(DrawCall {
            left: rect.x0,
            top: rect.y0,
            right: rect.x1,
            bottom: rect.y1,
            radius_x,
            radius_y,
            color,
        });
    }
}
