//! Diagnostic frame-rate counter.

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Counts ticks and turns them into frames per second.
///
/// `frame()` is called on every tick, `measure()` once per measurement
/// window.
#[derive(Debug, Clone)]
pub struct FrameCounter {
    frames: u64,
    previous_frames: u64,
    previous_time: Option<Instant>,
    fps: u64,
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self {
            frames: 0,
            previous_frames: 0,
            previous_time: None,
            fps: 0,
        }
    }
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&mut self) {
        self.frames += 1;
    }

    /// Close the current window at `now` and return the measured rate.
    pub fn measure(&mut self, now: Instant) -> u64 {
        let elapsed_ms = self
            .previous_time
            .map(|t| now.saturating_duration_since(t).as_millis() as u64)
            .unwrap_or(0);
        self.fps = if elapsed_ms != 0 {
            (self.frames - self.previous_frames) * 1000 / elapsed_ms
        } else {
            0
        };
        self.previous_frames = self.frames;
        self.previous_time = Some(now);
        self.fps
    }

    pub fn fps(&self) -> u64 {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
