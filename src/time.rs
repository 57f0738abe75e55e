//! Frame timing.
//!
//! [`FrameClock`] is the single source of elapsed/delta time for the scene.
//! In the window it is driven by wall time with [`FrameClock::tick`]; tests
//! and fixed-step runs drive it with [`FrameClock::advance`] instead.
//!
//! # Example
//!
//! ```ignore
//! use folio_fx::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In the frame loop:
//! clock.tick();
//! field.update(&FrameInput::new(clock.elapsed(), half_extents));
//! ```

use std::time::{Duration, Instant};

/// Elapsed/delta time, frame counter and FPS for the frame loop.
#[derive(Debug)]
pub struct FrameClock {
    last_instant: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_window: f32,
    fps_update_interval: f32,
    paused: bool,
    time_scale: f32,
}

impl FrameClock {
    /// Create a clock at zero elapsed time.
    pub fn new() -> Self {
        Self {
            last_instant: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window: 0.0,
            fps_update_interval: 0.5,
            paused: false,
            time_scale: 1.0,
        }
    }

    /// Advance by the wall time since the previous tick.
    ///
    /// Returns `(elapsed, delta)` in seconds.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_instant);
        self.last_instant = now;
        self.advance(raw)
    }

    /// Advance by an explicit step.
    ///
    /// Returns `(elapsed, delta)` in seconds. While paused the delta is zero
    /// and elapsed time does not move.
    pub fn advance(&mut self, step: Duration) -> (f32, f32) {
        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let raw = step.as_secs_f32();
        self.delta_secs = raw * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        self.fps_window += raw;
        if self.fps_window >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / self.fps_window;
            self.fps_frame_count = self.frame_count;
            self.fps_window = 0.0;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Elapsed time in whole milliseconds, the unit the scheduler works in.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        (self.elapsed_secs as f64 * 1000.0) as u64
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames since creation.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop time progression.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after [`pause`](Self::pause). Wall time spent paused is skipped.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_instant = Instant::now();
            self.paused = false;
        }
    }

    /// Set the time scale multiplier. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
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
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_advance_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(250));
        let (elapsed, delta) = clock.advance(Duration::from_millis(250));

        assert!((elapsed - 0.5).abs() < 1e-6);
        assert!((delta - 0.25).abs() < 1e-6);
        assert_eq!(clock.elapsed_ms(), 500);
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(100));
        clock.pause();

        let before = clock.elapsed();
        clock.advance(Duration::from_millis(100));
        assert_eq!(clock.elapsed(), before);
        assert_eq!(clock.delta(), 0.0);

        clock.resume();
        clock.advance(Duration::from_millis(100));
        assert!(clock.elapsed() > before);
    }

    #[test]
    fn test_time_scale_clamps() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(2.0);
        clock.advance(Duration::from_millis(100));
        assert!((clock.elapsed() - 0.2).abs() < 1e-6);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn test_fps_estimate() {
        let mut clock = FrameClock::new();
        for _ in 0..60 {
            clock.advance(Duration::from_micros(16_667));
        }
        assert!((clock.fps() - 60.0).abs() < 1.0);
    }
}
