//! The hero globe.
//!
//! A textured Earth built from four concentric shells inside one tilted
//! group. [`Globe`] holds the animated state (spin, cloud drift, atmosphere
//! pulse) and the sun bearing; the GPU side lives in
//! [`gpu::globe_pass`](crate::gpu::globe_pass).

pub mod geo;
pub mod mesh;
pub mod textures;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::{parse_hex, BlendMode};
use geo::GeoPoint;
use textures::{GlobeTextureSources, RetryPolicy};

/// Which layer of the globe a shell is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Surface,
    Clouds,
    Atmosphere,
    Glow,
}

/// Which faces of a shell are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Faces {
    #[default]
    Front,
    Back,
    Both,
}

/// One concentric sphere of the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub kind: ShellKind,
    /// Radius relative to the globe radius.
    pub scale: f32,
    pub segments: u32,
    pub opacity: f32,
    pub blend: BlendMode,
    pub faces: Faces,
    /// Material tint, linear RGB.
    pub tint: Vec3,
    /// Whether the shell samples the globe textures.
    pub textured: bool,
}

impl Shell {
    /// The four layers, innermost first. This is also the draw order.
    pub fn standard() -> Vec<Shell> {
        let tint = |hex: &str| parse_hex(hex).unwrap_or(Vec3::ONE);
        vec![
            Shell {
                kind: ShellKind::Surface,
                scale: 1.0,
                segments: 96,
                opacity: 1.0,
                blend: BlendMode::Alpha,
                faces: Faces::Front,
                tint: tint("#cffafe"),
                textured: true,
            },
            Shell {
                kind: ShellKind::Clouds,
                scale: 1.02,
                segments: 64,
                opacity: 0.35,
                blend: BlendMode::Additive,
                faces: Faces::Both,
                tint: Vec3::ONE,
                textured: true,
            },
            Shell {
                kind: ShellKind::Atmosphere,
                scale: 1.15,
                segments: 64,
                opacity: 0.15,
                blend: BlendMode::Additive,
                faces: Faces::Back,
                tint: tint("#06b6d4"),
                textured: false,
            },
            Shell {
                kind: ShellKind::Glow,
                scale: 1.3,
                segments: 32,
                opacity: 0.05,
                blend: BlendMode::Additive,
                faces: Faces::Back,
                tint: tint("#22d3ee"),
                textured: false,
            },
        ]
    }

    /// Transparent shells do not write depth.
    pub fn writes_depth(&self) -> bool {
        self.opacity >= 1.0 && self.blend == BlendMode::Alpha
    }
}

/// Globe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Surface radius in world units.
    pub radius: f32,
    /// Axial tilt of the whole group, degrees about Z.
    pub tilt_deg: f32,
    /// Surface spin, radians per second.
    pub surface_spin: f32,
    /// Cloud drift, radians per second.
    pub cloud_spin: f32,
    /// Atmosphere scale oscillates around this.
    pub atmosphere_base: f32,
    pub atmosphere_pulse: f32,
    /// Angular speed of the pulse, radians per second.
    pub atmosphere_pulse_speed: f32,
    /// Latitude the sun points at.
    pub sun_lat: f32,
    pub sun_lon: f32,
    /// Distance of the sun light from the globe center.
    pub sun_distance: f32,
    pub sun_intensity: f32,
    pub textures: GlobeTextureSources,
    pub retry: RetryPolicy,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            radius: 3.0,
            tilt_deg: 23.5,
            surface_spin: 0.05,
            cloud_spin: 0.06,
            atmosphere_base: 1.1,
            atmosphere_pulse: 0.015,
            atmosphere_pulse_speed: 0.8,
            sun_lat: GeoPoint::BEIJING.lat,
            sun_lon: GeoPoint::BEIJING.lon,
            sun_distance: 12.0,
            sun_intensity: 1.8,
            textures: GlobeTextureSources::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Animated globe state.
#[derive(Debug, Clone)]
pub struct Globe {
    config: GlobeConfig,
    shells: Vec<Shell>,
    surface_rotation: f32,
    cloud_rotation: f32,
    atmosphere_scale: f32,
}

impl Globe {
    pub fn new(config: GlobeConfig) -> Self {
        let shells = Shell::standard();
        let atmosphere_scale = shells
            .iter()
            .find(|s| s.kind == ShellKind::Atmosphere)
            .map_or(1.0, |s| s.scale);
        Self {
            config,
            shells,
            surface_rotation: 0.0,
            cloud_rotation: 0.0,
            atmosphere_scale,
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// Advance spin by `delta` seconds and set the pulse for `elapsed`.
    pub fn update(&mut self, elapsed: f32, delta: f32) {
        let c = &self.config;
        self.surface_rotation += c.surface_spin * delta;
        self.cloud_rotation += c.cloud_spin * delta;
        self.atmosphere_scale =
            c.atmosphere_base + (elapsed * c.atmosphere_pulse_speed).sin() * c.atmosphere_pulse;
    }

    pub fn surface_rotation(&self) -> f32 {
        self.surface_rotation
    }

    pub fn cloud_rotation(&self) -> f32 {
        self.cloud_rotation
    }

    pub fn atmosphere_scale(&self) -> f32 {
        self.atmosphere_scale
    }

    /// Rotation of the whole group.
    pub fn tilt(&self) -> Quat {
        Quat::from_rotation_z(self.config.tilt_deg.to_radians())
    }

    /// Sun light position in group space.
    pub fn light_position(&self) -> Vec3 {
        GeoPoint::new(self.config.sun_lat, self.config.sun_lon).to_vec3(self.config.sun_distance)
    }

    /// Unit direction toward the sun in world space.
    ///
    /// The light is a child of the tilted group, so it stays aimed at the
    /// same spot on the globe whatever the tilt.
    pub fn sun_direction(&self) -> Vec3 {
        (self.tilt() * self.light_position()).normalize_or_zero()
    }

    /// Scale of a shell this frame, relative to the globe radius.
    pub fn shell_scale(&self, shell: &Shell) -> f32 {
        match shell.kind {
            ShellKind::Atmosphere => self.atmosphere_scale,
            _ => shell.scale,
        }
    }

    /// Model matrix for a shell: tilt, then own spin, then scale.
    pub fn model_matrix(&self, shell: &Shell) -> Mat4 {
        let spin = match shell.kind {
            ShellKind::Surface => self.surface_rotation,
            ShellKind::Clouds => self.cloud_rotation,
            ShellKind::Atmosphere | ShellKind::Glow => 0.0,
        };
        Mat4::from_quat(self.tilt())
            * Mat4::from_rotation_y(spin)
            * Mat4::from_scale(Vec3::splat(self.shell_scale(shell) * self.config.radius))
    }
}

impl Default for Globe {
    fn default() -> Self {
        Self::new(GlobeConfig::default())
    }
}
