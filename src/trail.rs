//! Recent pointer history.
//!
//! The trail is a short, time-bounded record of where the pointer has been.
//! Each sample fades out over the trail window and pushes nearby particles
//! while it is fresh, leaving a wake behind fast pointer movement.

use std::collections::VecDeque;

use glam::Vec3;

/// Smallest time step used when deriving pointer velocity, in seconds.
const MIN_SAMPLE_DT: f32 = 1.0 / 240.0;

/// One recorded pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    /// Pointer position in particle space.
    pub position: Vec3,
    /// Pointer velocity at the time of the sample, units per second.
    pub velocity: Vec3,
    /// Elapsed time when recorded, in seconds.
    pub time: f32,
}

/// Bounded, time-windowed pointer history.
#[derive(Debug, Clone)]
pub struct PointerTrail {
    samples: VecDeque<TrailSample>,
    capacity: usize,
    window: f32,
}

impl PointerTrail {
    /// Create a trail that keeps at most `capacity` samples no older than
    /// `window` seconds.
    pub fn new(capacity: usize, window: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            window: window.max(f32::EPSILON),
        }
    }

    /// Record the pointer position at elapsed time `now`.
    pub fn push(&mut self, position: Vec3, now: f32) {
        let velocity = match self.samples.back() {
            Some(last) => (position - last.position) / (now - last.time).max(MIN_SAMPLE_DT),
            None => Vec3::ZERO,
        };

        self.prune(now);
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(TrailSample {
            position,
            velocity,
            time: now,
        });
    }

    /// Drop samples that have aged past the trail window.
    pub fn prune(&mut self, now: f32) {
        while let Some(front) = self.samples.front() {
            if now - front.time > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Remaining freshness of a sample at time `now`, in [0, 1].
    pub fn freshness(&self, sample: &TrailSample, now: f32) -> f32 {
        (1.0 - (now - sample.time) / self.window).clamp(0.0, 1.0)
    }

    /// Latest pointer velocity, or zero without history.
    pub fn velocity(&self) -> Vec3 {
        self.samples.back().map(|s| s.velocity).unwrap_or(Vec3::ZERO)
    }

    pub fn samples(&self) -> impl Iterator<Item = &TrailSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most samples the trail keeps.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Trail window in seconds.
    pub fn window(&self) -> f32 {
        self.window
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for PointerTrail {
    /// 32 samples over half a second.
    fn default() -> Self {
        Self::new(32, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_samples_evicted() {
        let mut trail = PointerTrail::new(16, 0.5);
        trail.push(Vec3::ZERO, 0.0);
        trail.push(Vec3::X, 0.2);
        trail.push(Vec3::Y, 0.6);

        // Sample at t=0.0 is 0.6s old, past the window
        assert_eq!(trail.len(), 2);

        trail.prune(1.5);
        assert!(trail.is_empty());
    }

    #[test]
    fn test_capacity_is_fixed() {
        let mut trail = PointerTrail::new(4, 10.0);
        for i in 0..10 {
            trail.push(Vec3::splat(i as f32), i as f32 * 0.01);
        }
        assert_eq!(trail.len(), 4);
        let first = trail.samples().next().unwrap();
        assert_eq!(first.position, Vec3::splat(6.0));
    }

    #[test]
    fn test_freshness_decays() {
        let mut trail = PointerTrail::new(4, 0.5);
        trail.push(Vec3::ZERO, 1.0);
        let sample = *trail.samples().next().unwrap();

        assert!((trail.freshness(&sample, 1.0) - 1.0).abs() < 1e-6);
        assert!((trail.freshness(&sample, 1.25) - 0.5).abs() < 1e-6);
        assert_eq!(trail.freshness(&sample, 2.0), 0.0);
    }

    #[test]
    fn test_velocity_from_consecutive_samples() {
        let mut trail = PointerTrail::default();
        trail.push(Vec3::ZERO, 0.0);
        trail.push(Vec3::new(1.0, 0.0, 0.0), 0.1);
        assert!((trail.velocity().x - 10.0).abs() < 1e-3);

        // Same timestamp uses the minimum step instead of dividing by zero
        trail.push(Vec3::new(2.0, 0.0, 0.0), 0.1);
        assert!(trail.velocity().is_finite());
    }
}
