//! Per-frame force rules.
//!
//! Each rule turns a particle's position (plus the frame's time and pointer
//! state) into a velocity change. Rules never see other particles, so the
//! field update is a flat loop over the particle arrays.
//!
//! # Stages
//!
//! Rules always run in stage order regardless of the order they were added:
//!
//! | Stage | Rule |
//! |-------|------|
//! | [`Stage::Drift`] | [`Rule::FlowField`] |
//! | [`Stage::Pointer`] | [`Rule::Pointer`] |
//! | [`Stage::Trail`] | [`Rule::Trail`] |
//!
//! Damping, integration, wrapping and cosmetic modulation follow in
//! [`ParticleField::update`](crate::field::ParticleField::update).

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::trail::PointerTrail;

/// Distances below this are floored before dividing or normalizing.
pub const MIN_DISTANCE: f32 = 0.25;

/// Pointer speeds above this are clamped before feeding trail drag.
pub const MAX_TRAIL_SPEED: f32 = 60.0;

/// Distance falloff toward the edge of an interaction radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    /// Full strength everywhere inside the radius.
    Constant,

    /// Decreases linearly to zero at the radius.
    #[default]
    Linear,

    /// Smoothstep fade to zero at the radius.
    Smooth,
}

impl Falloff {
    /// Falloff factor in [0, 1] for a particle `dist` away, inside `radius`.
    pub fn factor(&self, dist: f32, radius: f32) -> f32 {
        let t = (dist / radius.max(f32::EPSILON)).clamp(0.0, 1.0);
        match self {
            Falloff::Constant => 1.0,
            Falloff::Linear => 1.0 - t,
            Falloff::Smooth => 1.0 - t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Fixed execution order of rules within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Drift,
    Pointer,
    Trail,
}

/// Inputs every rule can read for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct ForceContext<'a> {
    /// Elapsed time in seconds.
    pub time: f32,
    /// Pointer position in particle space, if the cursor is over the window.
    pub pointer: Option<Vec3>,
    /// Recent pointer history.
    pub trail: Option<&'a PointerTrail>,
}

/// A per-frame force acting on every particle independently.
///
/// # Example
///
/// ```ignore
/// ParticleField::new()
///     .with_rule(Rule::FlowField { strength: 0.004, frequency: 0.15, speed: 0.4 })
///     .with_rule(Rule::Pointer {
///         radius: 8.0,
///         strength: 0.05,
///         swirl: 0.6,
///         falloff: Falloff::Linear,
///     })
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Deterministic oscillating drift from position and time.
    ///
    /// Gives ambient motion that never settles without any extra state.
    FlowField {
        /// Velocity added per frame at peak.
        strength: f32,
        /// Spatial frequency of the field.
        frequency: f32,
        /// How fast the field evolves over time.
        speed: f32,
    },

    /// Push (or pull) around the pointer, with optional swirl.
    ///
    /// Positive `strength` repels, negative attracts. The force grows as
    /// `1 / distance` toward the pointer, faded by `falloff` toward `radius`.
    /// `swirl` adds a tangential component of the same magnitude scaled by
    /// the given factor, turning the push into a vortex.
    Pointer {
        radius: f32,
        strength: f32,
        swirl: f32,
        #[serde(default)]
        falloff: Falloff,
    },

    /// Wake behind recent pointer movement.
    ///
    /// Each trail sample pushes nearby particles outward by `strength` and
    /// drags them along the pointer's velocity by `drag`, both scaled by how
    /// fresh the sample is.
    Trail {
        radius: f32,
        strength: f32,
        drag: f32,
    },
}

impl Rule {
    /// Stage this rule runs in.
    pub fn stage(&self) -> Stage {
        match self {
            Rule::FlowField { .. } => Stage::Drift,
            Rule::Pointer { .. } => Stage::Pointer,
            Rule::Trail { .. } => Stage::Trail,
        }
    }

    /// Whether the rule reads pointer history.
    pub fn needs_trail(&self) -> bool {
        matches!(self, Rule::Trail { .. })
    }

    /// Velocity change for a particle at `position` this frame.
    pub fn apply(&self, position: Vec3, ctx: &ForceContext<'_>) -> Vec3 {
        match *self {
            Rule::FlowField { strength, frequency, speed } => {
                let p = position * frequency;
                let t = ctx.time * speed;
                let flow = Vec3::new(
                    (p.y + t).sin() + (p.z * 0.5 - t * 0.6).cos() * 0.5,
                    (p.x - t * 0.8).cos() + (p.z * 0.7 + t * 0.4).sin() * 0.5,
                    (0.6 * (p.x + p.y) + t * 0.5).sin() * 0.5,
                );
                flow * strength
            }

            Rule::Pointer { radius, strength, swirl, falloff } => {
                let Some(pointer) = ctx.pointer else {
                    return Vec3::ZERO;
                };
                let offset = (position - pointer).truncate();
                let dist = offset.length();
                if dist >= radius {
                    return Vec3::ZERO;
                }
                let floored = dist.max(MIN_DISTANCE);
                let dir = offset / floored;
                let magnitude = strength * falloff.factor(dist, radius) / floored;
                let tangent = Vec2::new(-dir.y, dir.x);
                (dir * magnitude + tangent * magnitude.abs() * swirl).extend(0.0)
            }

            Rule::Trail { radius, strength, drag } => {
                let Some(trail) = ctx.trail else {
                    return Vec3::ZERO;
                };
                let mut dv = Vec3::ZERO;
                for sample in trail.samples() {
                    let freshness = trail.freshness(sample, ctx.time);
                    if freshness <= 0.0 {
                        continue;
                    }
                    let offset = (position - sample.position).truncate();
                    let dist = offset.length();
                    if dist >= radius {
                        continue;
                    }
                    let weight = freshness * (1.0 - dist / radius);
                    let dir = offset / dist.max(MIN_DISTANCE);
                    let wake = sample.velocity.truncate().clamp_length_max(MAX_TRAIL_SPEED);
                    dv += (dir * strength + wake * drag).extend(0.0) * weight;
                }
                dv
            }
        }
    }

    /// Upper bound on the velocity change this rule can add in one frame.
    ///
    /// `trail_capacity` is the number of samples a trail can hold.
    pub fn max_force(&self, trail_capacity: usize) -> f32 {
        match *self {
            // |flow| <= sqrt(1.5² + 1.5² + 0.5²)
            Rule::FlowField { strength, .. } => strength.abs() * 2.2,
            Rule::Pointer { strength, swirl, .. } => {
                strength.abs() / MIN_DISTANCE * (1.0 + swirl.abs())
            }
            Rule::Trail { strength, drag, .. } => {
                trail_capacity as f32
                    * (strength.abs() / MIN_DISTANCE + drag.abs() * MAX_TRAIL_SPEED)
            }
        }
    }
}
