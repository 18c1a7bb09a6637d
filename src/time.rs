//! Frame clock.
//!
//! Measures the wall-clock delta between rendered frames and keeps a smoothed
//! FPS estimate for the window title. The morph driver owns the animation
//! clock; this only reports how much real time passed.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // once per redraw:
//! let dt = clock.tick();
//! session.frame(dt);
//! ```

use std::time::{Duration, Instant};

/// Longest frame delta reported. Longer gaps (window dragged, laptop asleep)
/// are clamped so one frame never jumps the animation by seconds.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Wall-clock frame timing.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Advance to now. Call once per frame; returns the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Advance to `now`.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let raw = now.saturating_duration_since(self.last_frame).as_secs_f32();
        let dt = raw.min(MAX_FRAME_DELTA);
        self.last_frame = now;
        self.frame_count += 1;

        let since = now.saturating_duration_since(self.fps_update_time);
        if since >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        dt
    }

    /// Forget the time spent away, e.g. after the window was hidden.
    pub fn resync(&mut self) {
        self.last_frame = Instant::now();
    }

    /// Ticks so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn test_tick_measures_delta() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-4);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_secs(10));
        assert_eq!(dt, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_fps_estimate() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        for i in 1..=60 {
            clock.tick_at(start + Duration::from_micros(i * 16_667));
        }
        assert!((clock.fps() - 60.0).abs() < 1.0, "fps {}", clock.fps());
    }
}
