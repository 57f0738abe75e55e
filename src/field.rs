//! The animated particle field.
//!
//! A [`ParticleField`] owns a fixed set of particles, the rules that push
//! them around, and the flat buffers the renderer uploads. Every frame
//! [`ParticleField::update`] runs one pass over the particles:
//!
//! 1. force rules in stage order (flow drift, pointer, trail)
//! 2. damping: `velocity *= friction`
//! 3. integration: `position += velocity`
//! 4. toroidal wrap into the viewport-derived bounds
//! 5. cosmetic modulation: twinkle/proximity size, hue and energy
//!
//! # Variants
//!
//! Three behaviours are available through [`Variant`], picked by config:
//!
//! ```ignore
//! let config = FieldConfig::preset(Variant::Aurora)
//!     .with_count(400)
//!     .with_color("#94a3b8");
//! let mut field = ParticleField::new(config);
//!
//! // Per frame:
//! field.update(&FrameInput::new(elapsed, viewport_half).with_pointer(pointer));
//! if field.buffers_mut().take_dirty().positions {
//!     queue.write_buffer(&positions, 0, bytemuck::cast_slice(field.buffers().positions()));
//! }
//! ```

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::{hsl_to_rgb, parse_hex};
use crate::particles::{Particles, SpawnParams};
use crate::rules::{Falloff, ForceContext, Rule};
use crate::trail::PointerTrail;

/// Smallest half-extent on any axis; guards against zero-sized viewports.
pub const MIN_BOUND: f32 = 1.0;

/// Friction is clamped below this so damping always removes energy.
pub const MAX_FRICTION: f32 = 0.999;

/// Twinkle amplitude is clamped below this so sizes stay positive.
const MAX_TWINKLE: f32 = 0.95;

/// Which historical behaviour of the backdrop to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Point cloud with pointer repulsion, twinkle and parallax.
    Instanced,
    /// Sprites carried by a flow field, pulled gently toward the pointer.
    FlowSprites,
    /// Flow field with hue cycling, energy, pointer vortex and trail wake.
    #[default]
    Aurora,
}

/// Periodic size modulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twinkle {
    /// Relative size swing, clamped to [0, 0.95].
    pub amplitude: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
}

/// Rotating hue for colored variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HueCycle {
    /// Degrees added per frame.
    pub speed: f32,
    pub saturation: f32,
    pub lightness: f32,
    /// Extra degrees per frame at full pointer proximity.
    pub proximity_nudge: f32,
}

/// Energy gained near the pointer and lost everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    /// Energy added per frame at full pointer proximity.
    pub gain: f32,
    /// Energy removed per frame.
    pub decay: f32,
    /// Energy never drops below this.
    pub floor: f32,
}

/// Sprite size scaling by depth, so particles nearer the camera draw larger.
///
/// The factor is `(z + offset) / span`, never below `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthScale {
    pub offset: f32,
    pub span: f32,
    pub floor: f32,
}

impl DepthScale {
    fn factor(&self, z: f32) -> f32 {
        let span = if self.span.abs() > f32::EPSILON { self.span } else { 1.0 };
        let floor = self.floor.max(f32::EPSILON);
        let factor = (z + self.offset) / span;
        if factor.is_finite() { factor.max(floor) } else { floor }
    }
}

/// Everything needed to build a [`ParticleField`].
///
/// Start from [`FieldConfig::preset`]; the config file only names a variant
/// plus overrides (see [`LayerConfig`](crate::config::LayerConfig)).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub variant: Variant,
    pub count: usize,
    pub seed: u64,
    /// Half-size of the viewport used for the initial scatter, before the
    /// first frame reports the real one.
    pub initial_extents: [f32; 2],
    /// Half-depth of the volume (z bound).
    pub depth: f32,
    /// Velocity multiplier applied every frame, below 1.
    pub friction: f32,
    /// Range of the per-particle size factor.
    pub size_range: [f32; 2],
    /// World-space sprite size for a size factor of 1.
    pub base_size: f32,
    pub twinkle: Twinkle,
    /// Size gain at full pointer proximity (0 disables).
    pub proximity_boost: f32,
    /// Distance at which pointer proximity reaches zero.
    pub proximity_radius: f32,
    /// Sizes never exceed `size_factor * base_size * max_size_multiple`.
    pub max_size_multiple: f32,
    pub depth_scale: Option<DepthScale>,
    /// Flat color used when `hue` is `None`.
    pub color: String,
    pub hue: Option<HueCycle>,
    pub energy: Energy,
    /// Render-time offset toward the pointer, scaled by size factor.
    pub parallax: f32,
    /// Force rules. Sorted into stage order when the field is built.
    pub rules: Vec<Rule>,
}

impl FieldConfig {
    /// Defaults for a variant, including its rule set.
    pub fn preset(variant: Variant) -> Self {
        let base = Self {
            variant,
            count: 300,
            seed: 0x5eed,
            initial_extents: [30.0, 17.0],
            depth: 15.0,
            friction: 0.94,
            size_range: [1.0, 3.0],
            base_size: 0.08,
            twinkle: Twinkle { amplitude: 0.3, speed: 2.0 },
            proximity_boost: 0.0,
            proximity_radius: 8.0,
            max_size_multiple: 3.0,
            depth_scale: None,
            color: "#0ea5e9".to_string(),
            hue: None,
            energy: Energy { gain: 0.0, decay: 0.0, floor: 1.0 },
            parallax: 0.0,
            rules: Vec::new(),
        };

        match variant {
            Variant::Instanced => Self {
                friction: 0.9,
                parallax: 0.5,
                depth_scale: Some(DepthScale { offset: 20.0, span: 40.0, floor: 0.05 }),
                rules: vec![
                    Rule::FlowField { strength: 0.0015, frequency: 0.3, speed: 0.35 },
                    Rule::Pointer {
                        radius: 8.0,
                        strength: 0.06,
                        swirl: 0.0,
                        falloff: Falloff::Linear,
                    },
                ],
                ..base
            },
            Variant::FlowSprites => Self {
                proximity_boost: 0.8,
                rules: vec![
                    Rule::FlowField { strength: 0.004, frequency: 0.15, speed: 0.4 },
                    Rule::Pointer {
                        radius: 10.0,
                        strength: -0.02,
                        swirl: 0.0,
                        falloff: Falloff::Smooth,
                    },
                ],
                ..base
            },
            Variant::Aurora => Self {
                friction: 0.95,
                proximity_boost: 1.0,
                proximity_radius: 10.0,
                hue: Some(HueCycle {
                    speed: 0.2,
                    saturation: 0.75,
                    lightness: 0.6,
                    proximity_nudge: 2.0,
                }),
                energy: Energy { gain: 0.05, decay: 0.004, floor: 0.2 },
                rules: vec![
                    Rule::FlowField { strength: 0.004, frequency: 0.15, speed: 0.4 },
                    Rule::Pointer {
                        radius: 10.0,
                        strength: 0.04,
                        swirl: 0.8,
                        falloff: Falloff::Linear,
                    },
                    Rule::Trail { radius: 4.0, strength: 0.01, drag: 0.0005 },
                ],
                ..base
            },
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Flat color as `#rrggbb`.
    pub fn with_color(mut self, hex: &str) -> Self {
        self.color = hex.to_string();
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replace the preset rules.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::preset(Variant::default())
    }
}

/// Per-frame inputs to [`ParticleField::update`].
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Elapsed time in seconds.
    pub time: f32,
    /// Pointer position in particle space, if any.
    pub pointer: Option<Vec3>,
    /// Recent pointer history.
    pub trail: Option<&'a PointerTrail>,
    /// Viewport half-size in particle space (x, y).
    pub viewport_half: Vec2,
}

impl<'a> FrameInput<'a> {
    pub fn new(time: f32, viewport_half: Vec2) -> Self {
        Self {
            time,
            pointer: None,
            trail: None,
            viewport_half,
        }
    }

    pub fn with_pointer(mut self, pointer: Option<Vec3>) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_trail(mut self, trail: &'a PointerTrail) -> Self {
        self.trail = Some(trail);
        self
    }
}

/// Which output buffers changed since the renderer last looked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub positions: bool,
    pub sizes: bool,
    pub colors: bool,
}

impl DirtyFlags {
    pub fn any(&self) -> bool {
        self.positions || self.sizes || self.colors
    }
}

/// Flat GPU-ready output: positions and colors are `3 * N` floats, sizes
/// `N` floats.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    positions: Vec<f32>,
    sizes: Vec<f32>,
    colors: Vec<f32>,
    dirty: DirtyFlags,
}

impl FrameBuffers {
    fn new(count: usize) -> Self {
        Self {
            positions: vec![0.0; count * 3],
            sizes: vec![0.0; count],
            colors: vec![0.0; count * 3],
            dirty: DirtyFlags::default(),
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Pending dirty flags, without clearing them.
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Return the dirty flags and clear them.
    pub fn take_dirty(&mut self) -> DirtyFlags {
        std::mem::take(&mut self.dirty)
    }
}

/// A fixed-size animated particle field.
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: FieldConfig,
    rules: Vec<Rule>,
    particles: Particles,
    buffers: FrameBuffers,
    bounds: Vec3,
    base_color: Vec3,
}

impl ParticleField {
    /// Spawn the particles and allocate the output buffers.
    pub fn new(config: FieldConfig) -> Self {
        let bounds = sanitize_bounds(
            Vec2::new(config.initial_extents[0], config.initial_extents[1]),
            config.depth,
        );
        let particles = Particles::spawn(&SpawnParams {
            count: config.count,
            seed: config.seed,
            half_extents: bounds,
            size_range: (config.size_range[0], config.size_range[1]),
            energy_floor: config.energy.floor,
        });

        let mut rules = config.rules.clone();
        // Stable sort keeps insertion order within a stage
        rules.sort_by_key(Rule::stage);

        let base_color = parse_hex(&config.color).unwrap_or_else(|| {
            log::warn!("Invalid particle color '{}', using white", config.color);
            Vec3::ONE
        });

        log::debug!(
            "Particle field: {:?}, {} particles, {} rules",
            config.variant,
            config.count,
            rules.len()
        );

        let mut field = Self {
            buffers: FrameBuffers::new(particles.len()),
            config,
            rules,
            particles,
            bounds,
            base_color,
        };
        field.write_initial_buffers();
        field
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    /// Rules in execution order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut FrameBuffers {
        &mut self.buffers
    }

    /// Current wrap bounds (half-extents on each axis).
    pub fn bounds(&self) -> Vec3 {
        self.bounds
    }

    /// Whether any rule reads pointer history.
    pub fn needs_trail(&self) -> bool {
        self.rules.iter().any(Rule::needs_trail)
    }

    /// Friction actually applied, after clamping.
    pub fn friction(&self) -> f32 {
        self.config.friction.clamp(0.0, MAX_FRICTION)
    }

    /// Upper bound on any particle's per-frame speed.
    ///
    /// Damping scales `velocity + force` by the friction every frame, so
    /// speed can never exceed `friction * max_force / (1 - friction)`.
    pub fn speed_bound(&self, trail_capacity: usize) -> f32 {
        let max_force: f32 = self.rules.iter().map(|r| r.max_force(trail_capacity)).sum();
        let friction = self.friction();
        friction * max_force / (1.0 - friction)
    }

    /// Advance one frame and rewrite the output buffers.
    pub fn update(&mut self, frame: &FrameInput<'_>) {
        let bounds = sanitize_bounds(frame.viewport_half, self.config.depth);
        self.bounds = bounds;

        let ctx = ForceContext {
            time: frame.time,
            pointer: frame.pointer,
            trail: frame.trail,
        };
        let friction = self.friction();
        let cosmetics = Cosmetics::from_config(&self.config);
        let parallax = match frame.pointer {
            Some(p) if self.config.parallax != 0.0 => {
                Vec2::new(p.x / bounds.x, p.y / bounds.y) * self.config.parallax
            }
            _ => Vec2::ZERO,
        };

        let rules = &self.rules;
        let p = &mut self.particles;
        let out = &mut self.buffers;

        for i in 0..p.position.len() {
            let mut pos = p.position[i];
            let mut vel = p.velocity[i];

            for rule in rules {
                vel += rule.apply(pos, &ctx);
            }
            vel *= friction;
            pos += vel;

            if !pos.is_finite() || !vel.is_finite() {
                pos = Vec3::ZERO;
                vel = Vec3::ZERO;
            }
            pos = wrap(pos, bounds);

            p.position[i] = pos;
            p.velocity[i] = vel;

            let proximity = match frame.pointer {
                Some(pointer) => {
                    let dist = (pos - pointer).truncate().length();
                    (1.0 - dist / cosmetics.proximity_radius).clamp(0.0, 1.0)
                }
                None => 0.0,
            };

            let shift = parallax * p.size_factor[i];
            let shown = wrap(pos + shift.extend(0.0), bounds);
            out.positions[i * 3] = shown.x;
            out.positions[i * 3 + 1] = shown.y;
            out.positions[i * 3 + 2] = shown.z;

            out.sizes[i] =
                cosmetics.size(p.size_factor[i], pos.z, p.phase[i], frame.time, proximity);

            if let Some(hue) = cosmetics.hue {
                let energy = (p.energy[i] + proximity * cosmetics.energy.gain
                    - cosmetics.energy.decay)
                    .clamp(cosmetics.energy.floor, 1.0);
                p.energy[i] = energy;
                p.hue[i] = wrap_hue(p.hue[i] + hue.speed + proximity * hue.proximity_nudge);

                let rgb = hsl_to_rgb(
                    p.hue[i],
                    hue.saturation,
                    hue.lightness * (0.4 + 0.6 * energy),
                );
                out.colors[i * 3] = rgb.x;
                out.colors[i * 3 + 1] = rgb.y;
                out.colors[i * 3 + 2] = rgb.z;
            }
        }

        out.dirty.positions = true;
        out.dirty.sizes = true;
        if cosmetics.hue.is_some() {
            out.dirty.colors = true;
        }
    }

    fn write_initial_buffers(&mut self) {
        let p = &self.particles;
        let out = &mut self.buffers;
        let cosmetics = Cosmetics::from_config(&self.config);

        for i in 0..p.len() {
            let pos = p.position[i];
            out.positions[i * 3] = pos.x;
            out.positions[i * 3 + 1] = pos.y;
            out.positions[i * 3 + 2] = pos.z;
            out.sizes[i] = cosmetics.size(p.size_factor[i], pos.z, p.phase[i], 0.0, 0.0);

            let rgb = match cosmetics.hue {
                Some(hue) => hsl_to_rgb(
                    p.hue[i],
                    hue.saturation,
                    hue.lightness * (0.4 + 0.6 * p.energy[i]),
                ),
                None => self.base_color,
            };
            out.colors[i * 3] = rgb.x;
            out.colors[i * 3 + 1] = rgb.y;
            out.colors[i * 3 + 2] = rgb.z;
        }

        out.dirty = DirtyFlags {
            positions: true,
            sizes: true,
            colors: true,
        };
    }
}

/// Cosmetic parameters with their clamps applied once per frame.
#[derive(Debug, Clone, Copy)]
struct Cosmetics {
    base_size: f32,
    twinkle_amplitude: f32,
    twinkle_speed: f32,
    proximity_boost: f32,
    proximity_radius: f32,
    max_size_multiple: f32,
    depth_scale: Option<DepthScale>,
    hue: Option<HueCycle>,
    energy: Energy,
}

impl Cosmetics {
    fn from_config(config: &FieldConfig) -> Self {
        let floor = config.energy.floor.clamp(f32::EPSILON, 1.0);
        Self {
            base_size: config.base_size.abs().max(f32::EPSILON),
            twinkle_amplitude: config.twinkle.amplitude.clamp(0.0, MAX_TWINKLE),
            twinkle_speed: config.twinkle.speed,
            proximity_boost: config.proximity_boost.max(0.0),
            proximity_radius: config.proximity_radius.max(MIN_BOUND),
            max_size_multiple: config.max_size_multiple.max(1.0),
            depth_scale: config.depth_scale,
            hue: config.hue,
            energy: Energy { floor, ..config.energy },
        }
    }

    /// Depth-scaled, twinkled, proximity-boosted sprite size, capped at the
    /// max multiple of the unscaled baseline.
    fn size(&self, size_factor: f32, z: f32, phase: f32, time: f32, proximity: f32) -> f32 {
        let baseline = size_factor * self.base_size;
        let depth = self.depth_scale.map_or(1.0, |d| d.factor(z));
        let twinkle = 1.0 + (time * self.twinkle_speed + phase).sin() * self.twinkle_amplitude;
        let boost = 1.0 + self.proximity_boost * proximity;
        (baseline * depth * twinkle * boost).min(baseline * self.max_size_multiple)
    }
}

/// Clamp viewport half-extents to usable wrap bounds.
fn sanitize_bounds(viewport_half: Vec2, depth: f32) -> Vec3 {
    let axis = |v: f32| if v.is_finite() { v.abs().max(MIN_BOUND) } else { MIN_BOUND };
    Vec3::new(axis(viewport_half.x), axis(viewport_half.y), axis(depth))
}

/// Toroidal wrap: past one edge re-enters from the opposite edge.
fn wrap(pos: Vec3, bounds: Vec3) -> Vec3 {
    Vec3::new(
        wrap_axis(pos.x, bounds.x),
        wrap_axis(pos.y, bounds.y),
        wrap_axis(pos.z, bounds.z),
    )
}

fn wrap_axis(v: f32, bound: f32) -> f32 {
    if v >= -bound && v <= bound {
        return v;
    }
    let wrapped = (v + bound).rem_euclid(2.0 * bound) - bound;
    wrapped.clamp(-bound, bound)
}

fn wrap_hue(hue: f32) -> f32 {
    let h = hue.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360.0 || !h.is_finite() {
        0.0
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f32) -> FrameInput<'static> {
        FrameInput::new(time, Vec2::new(30.0, 17.0))
    }

    #[test]
    fn test_buffer_sizes_match_count() {
        let field = ParticleField::new(FieldConfig::preset(Variant::Instanced).with_count(120));
        assert_eq!(field.len(), 120);
        assert_eq!(field.buffers().positions().len(), 360);
        assert_eq!(field.buffers().sizes().len(), 120);
        assert_eq!(field.buffers().colors().len(), 360);
    }

    #[test]
    fn test_rules_sorted_by_stage() {
        let config = FieldConfig::preset(Variant::Instanced).with_rules(vec![
            Rule::Trail { radius: 1.0, strength: 0.1, drag: 0.0 },
            Rule::Pointer { radius: 1.0, strength: 0.1, swirl: 0.0, falloff: Falloff::Linear },
            Rule::FlowField { strength: 0.1, frequency: 1.0, speed: 1.0 },
        ]);
        let field = ParticleField::new(config);
        let stages: Vec<_> = field.rules().iter().map(Rule::stage).collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
        assert!(field.needs_trail());
    }

    #[test]
    fn test_dirty_flags_cycle() {
        let mut field = ParticleField::new(FieldConfig::preset(Variant::FlowSprites).with_count(10));
        assert!(field.buffers_mut().take_dirty().colors);
        assert!(!field.buffers().dirty().any());

        field.update(&frame(0.016));
        let dirty = field.buffers_mut().take_dirty();
        assert!(dirty.positions && dirty.sizes);
        // Flat colors never change after the first upload
        assert!(!dirty.colors);

        let mut aurora = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(10));
        aurora.buffers_mut().take_dirty();
        aurora.update(&frame(0.016));
        assert!(aurora.buffers_mut().take_dirty().colors);
    }

    #[test]
    fn test_wrap_axis() {
        assert_eq!(wrap_axis(0.5, 1.0), 0.5);
        assert!((wrap_axis(1.25, 1.0) - (-0.75)).abs() < 1e-6);
        assert!((wrap_axis(-1.25, 1.0) - 0.75).abs() < 1e-6);
        let far = wrap_axis(1000.3, 1.0);
        assert!((-1.0..=1.0).contains(&far));
    }

    #[test]
    fn test_zero_viewport_uses_min_bound() {
        let bounds = sanitize_bounds(Vec2::ZERO, f32::NAN);
        assert_eq!(bounds, Vec3::splat(MIN_BOUND));

        let mut field = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(50));
        field.update(&FrameInput::new(0.0, Vec2::ZERO));
        for pos in field.particles().positions() {
            assert!(pos.x.abs() <= MIN_BOUND && pos.y.abs() <= MIN_BOUND);
        }
    }

    #[test]
    fn test_pointer_pushes_particles_away() {
        let config = FieldConfig::preset(Variant::Instanced)
            .with_count(200)
            .with_rules(vec![Rule::Pointer {
                radius: 8.0,
                strength: 0.2,
                swirl: 0.0,
                falloff: Falloff::Constant,
            }]);
        let mut field = ParticleField::new(config);
        let before: Vec<Vec3> = field.particles().positions().to_vec();

        field.update(&frame(0.0).with_pointer(Some(Vec3::ZERO)));

        for (a, b) in before.iter().zip(field.particles().positions()) {
            let d0 = a.truncate().length();
            if d0 > 0.5 && d0 < 6.0 {
                assert!(b.truncate().length() > d0);
            }
        }
    }

    #[test]
    fn test_hue_and_energy_stay_in_range() {
        let mut field = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(100));
        let trail = PointerTrail::default();
        for i in 0..500 {
            let t = i as f32 / 60.0;
            let pointer = Vec3::new((t * 3.0).sin() * 10.0, (t * 2.0).cos() * 5.0, 0.0);
            field.update(&frame(t).with_pointer(Some(pointer)).with_trail(&trail));
        }
        let floor = field.config().energy.floor;
        for (h, e) in field.particles().hues().iter().zip(field.particles().energies()) {
            assert!((0.0..360.0).contains(h));
            assert!(*e >= floor && *e <= 1.0);
        }
        assert!(field.buffers().colors().iter().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn test_parallax_output_stays_in_bounds() {
        let mut field = ParticleField::new(FieldConfig::preset(Variant::Instanced).with_count(100));
        field.update(&frame(0.0).with_pointer(Some(Vec3::new(30.0, 17.0, 0.0))));
        let b = field.bounds();
        for xyz in field.buffers().positions().chunks_exact(3) {
            assert!(xyz[0].abs() <= b.x && xyz[1].abs() <= b.y && xyz[2].abs() <= b.z);
        }
    }

    #[test]
    fn test_parallax_wraps_past_edge() {
        let config = FieldConfig::preset(Variant::Instanced).with_count(200).with_rules(Vec::new());
        let mut field = ParticleField::new(config);
        let viewport = Vec2::new(2.0, 2.0);
        field.update(&FrameInput::new(0.0, viewport).with_pointer(Some(Vec3::new(2.0, 2.0, 0.0))));

        let b = field.bounds();
        let p = field.particles();
        let mut crossed = 0;
        for (i, xyz) in field.buffers().positions().chunks_exact(3).enumerate() {
            let shifted = p.positions()[i].x + 0.5 * p.size_factors()[i];
            assert!((xyz[0] - wrap_axis(shifted, b.x)).abs() < 1e-5);
            if shifted > b.x {
                // Re-enters from the left instead of sticking to the right edge
                assert!(xyz[0] < 0.0);
                crossed += 1;
            }
        }
        assert!(crossed > 0);
    }

    #[test]
    fn test_depth_scales_instanced_sizes() {
        let instanced = Cosmetics::from_config(&FieldConfig::preset(Variant::Instanced));
        let near = instanced.size(1.0, 10.0, 0.0, 0.0, 0.0);
        let far = instanced.size(1.0, -10.0, 0.0, 0.0, 0.0);
        assert!((near - 0.08 * 0.75).abs() < 1e-6);
        assert!((far - 0.08 * 0.25).abs() < 1e-6);

        // Floor keeps far sprites visible
        let floor = instanced.size(1.0, -1000.0, 0.0, 0.0, 0.0);
        assert!((floor - 0.08 * 0.05).abs() < 1e-6);

        let flow = Cosmetics::from_config(&FieldConfig::preset(Variant::FlowSprites));
        assert_eq!(flow.size(1.0, 10.0, 0.0, 0.0, 0.0), flow.size(1.0, -10.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let field = ParticleField::new(FieldConfig::preset(Variant::Instanced).with_count(1).with_color("nope"));
        assert_eq!(&field.buffers().colors()[..3], &[1.0, 1.0, 1.0]);
    }
}
