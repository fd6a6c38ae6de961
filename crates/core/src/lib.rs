//! Core library for the Pulse Wave container widget.
//!
//! A [`PulseLayout`] centers a single child and paints a stack of rounded
//! rectangles around it. Each ring grows outward and fades over a repeating
//! cycle, and the rings are phase-shifted so the wave appears continuous. The
//! timing lives in [`WaveEngine`], which the host drives from its frame
//! callback; painting goes through the [`Canvas`] trait.

pub mod config;
pub mod engine;
pub mod error;
pub mod render;
pub mod timeline;
pub mod widget;

pub use config::{RepeatCount, Rgba, WaveConfig, WaveConfigBuilder};
pub use engine::{
    alpha_for_growth, EngineState, Ring, RingListener, RingPhase, RingState, SubscriptionId,
    WaveEngine,
};
pub use error::{PulseWaveError, Result};
pub use render::{Canvas, DrawCall, RecordingCanvas};
pub use timeline::{AnimationClock, FrameTicker, ScheduledEvent, Scheduler};
pub use widget::{ChildLayout, PulseLayout};

pub use kurbo::{Rect, Size};
