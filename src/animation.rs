//! Globe rotation animator.
//!
//! The host calls [`Animator::step`] once per frame. Each step advances the
//! rotation about the Y axis by a fixed amount until the animator is stopped,
//! either through its [`StopToken`] or by reaching an optional frame limit.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle that halts an [`Animator`] from anywhere.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a single animation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Rotation advanced; schedule another frame.
    Continue,
    /// Nothing changed and no further frames are needed.
    Stopped,
}

/// Advances the globe rotation one frame at a time.
#[derive(Debug, Clone)]
pub struct Animator {
    rotation_y: f32,
    step: f32,
    max_frames: Option<u64>,
    frames: u64,
    stop: StopToken,
}

impl Animator {
    /// Create an animator rotating by `step` radians per frame.
    pub fn new(step: f32, max_frames: Option<u64>) -> Self {
        Self {
            rotation_y: 0.0,
            step,
            max_frames,
            frames: 0,
            stop: StopToken::new(),
        }
    }

    /// Handle for stopping this animator.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Current rotation about the Y axis, in radians within `[0, TAU)`.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Frames advanced so far.
    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped() && self.max_frames.map_or(true, |max| self.frames < max)
    }

    /// Advance one frame.
    pub fn step(&mut self) -> FrameStep {
        if !self.is_running() {
            return FrameStep::Stopped;
        }

        self.rotation_y = (self.rotation_y + self.step).rem_euclid(TAU);
        self.frames += 1;
        FrameStep::Continue
    }

    /// Step repeatedly, calling `on_frame` with the new rotation after each
    /// advanced frame, until the animator stops. Returns the frames advanced.
    ///
    /// Without a frame limit or a stop from inside `on_frame` this never
    /// returns.
    #[cfg(test)]
    pub fn run<F>(&mut self, mut on_frame: F) -> u64
    where
        F: FnMut(f32),
    {
        let start = self.frames;
        while self.step() == FrameStep::Continue {
            on_frame(self.rotation_y);
        }
        self.frames - start
    }
}
