//! Structure-of-arrays particle storage.
//!
//! Every attribute lives in its own contiguous `Vec`, allocated once at
//! spawn. There is no API to add or remove particles; the field mutates
//! these arrays in place every frame.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Parameters for filling a particle store.
#[derive(Debug, Clone, Copy)]
pub struct SpawnParams {
    /// Number of particles.
    pub count: usize,
    /// RNG seed. The same seed always produces the same particles.
    pub seed: u64,
    /// Half-size of the volume particles are scattered in.
    pub half_extents: Vec3,
    /// Range of the intrinsic size factor (both ends positive).
    pub size_range: (f32, f32),
    /// Lowest starting energy; energy starts in [floor, 1].
    pub energy_floor: f32,
}

/// Per-particle state, one array per attribute.
#[derive(Debug, Clone)]
pub struct Particles {
    pub(crate) position: Vec<Vec3>,
    pub(crate) velocity: Vec<Vec3>,
    pub(crate) size_factor: Vec<f32>,
    pub(crate) phase: Vec<f32>,
    pub(crate) hue: Vec<f32>,
    pub(crate) energy: Vec<f32>,
}

impl Particles {
    /// Scatter `params.count` particles uniformly through the volume.
    pub fn spawn(params: &SpawnParams) -> Self {
        let mut rng = SmallRng::seed_from_u64(params.seed);
        let n = params.count;
        let extents = params.half_extents.abs();

        let (size_lo, size_hi) = ordered(params.size_range);
        let size_lo = size_lo.max(f32::EPSILON);
        let size_hi = size_hi.max(size_lo);
        let energy_floor = params.energy_floor.clamp(0.0, 1.0);

        let mut particles = Self {
            position: Vec::with_capacity(n),
            velocity: vec![Vec3::ZERO; n],
            size_factor: Vec::with_capacity(n),
            phase: Vec::with_capacity(n),
            hue: Vec::with_capacity(n),
            energy: Vec::with_capacity(n),
        };

        for _ in 0..n {
            particles.position.push(Vec3::new(
                symmetric(&mut rng, extents.x),
                symmetric(&mut rng, extents.y),
                symmetric(&mut rng, extents.z),
            ));
            particles.size_factor.push(sample(&mut rng, size_lo, size_hi));
            particles.phase.push(rng.gen_range(0.0..TAU));
            particles.hue.push(rng.gen_range(0.0..360.0));
            particles.energy.push(sample(&mut rng, energy_floor, 1.0));
        }

        particles
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.position
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocity
    }

    pub fn size_factors(&self) -> &[f32] {
        &self.size_factor
    }

    /// Per-particle phase offsets in [0, 2π).
    pub fn phases(&self) -> &[f32] {
        &self.phase
    }

    /// Per-particle hue in degrees, [0, 360).
    pub fn hues(&self) -> &[f32] {
        &self.hue
    }

    pub fn energies(&self) -> &[f32] {
        &self.energy
    }
}

fn ordered((a, b): (f32, f32)) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn symmetric(rng: &mut SmallRng, half: f32) -> f32 {
    if half > 0.0 {
        rng.gen_range(-half..=half)
    } else {
        0.0
    }
}

fn sample(rng: &mut SmallRng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}
