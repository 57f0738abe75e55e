//! # folio-fx - Portfolio hero scene
//!
//! The animated hero of a personal portfolio page: a layered particle
//! backdrop that reacts to the pointer, a textured globe lit from a fixed
//! geographic bearing, and a typewriter headline, all driven by one
//! cooperative frame loop.
//!
//! ## Quick Start
//!
//! ```ignore
//! use folio_fx::prelude::*;
//!
//! fn main() -> Result<(), ShowcaseError> {
//!     env_logger::init();
//!     folio_fx::window::run(ShowcaseConfig::default())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particle fields
//!
//! A [`ParticleField`] owns a fixed number of particles in flat arrays and
//! writes position, size and color buffers every frame. The per-particle
//! update is a pipeline of [`Rule`]s: flow drift, pointer forces, trail wake,
//! damping, integration and wrap-around. Three [`Variant`] presets pick the
//! rule set and cosmetic modulation:
//!
//! ```ignore
//! let mut field = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(400));
//! field.update(&FrameInput::new(elapsed, viewport_half).with_pointer(pointer));
//! ```
//!
//! A [`Backdrop`] stacks several fields and shares one [`PointerTrail`]
//! between them.
//!
//! ### Globe
//!
//! [`Globe`] holds the animation state of the textured sphere and its
//! shells (surface, clouds, atmosphere, glow). Textures load on a background
//! thread with retry, falling back to flat maps when a file cannot be read.
//!
//! ### Scheduling
//!
//! Everything time-based runs through a [`Scheduler`]: timers and per-frame
//! subscriptions are registered against an owner and released together when
//! the owner unmounts. The [`Typewriter`] is the main timer client.
//!
//! ### Error containment
//!
//! The globe runs behind an [`ErrorBoundary`]. If it fails (a panic, a
//! texture loader crash or a GPU validation error), the boundary trips and
//! the scene shows a fallback message while the backdrop and headline keep
//! running.
//!
//! ## Configuration
//!
//! [`ShowcaseConfig`] is plain serde data and can be loaded from JSON:
//!
//! ```ignore
//! let config = ShowcaseConfig::load("showcase.json")?;
//! ```
//!
//! ## Logging
//!
//! The crate logs through the `log` facade. The `folio-showcase` binary
//! installs `env_logger` with an `info` default; set `RUST_LOG` to change it.

pub mod backdrop;
pub mod boundary;
pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod globe;
pub mod gpu;
pub mod input;
pub mod particles;
pub mod rules;
pub mod schedule;
pub mod shell;
pub mod time;
pub mod trail;
pub mod typewriter;
pub mod window;

pub use backdrop::Backdrop;
pub use boundary::ErrorBoundary;
pub use color::BlendMode;
pub use config::{LayerConfig, ShowcaseConfig, WindowConfig};
pub use error::{ConfigError, GpuError, ShowcaseError, TextureError};
pub use field::{FieldConfig, FrameInput, ParticleField, Variant};
pub use glam::{Vec2, Vec3};
pub use globe::{Globe, GlobeConfig};
pub use rules::{Falloff, Rule};
pub use schedule::{OwnerId, Scheduler};
pub use shell::{Fragment, Shell, ShellFrame};
pub use trail::PointerTrail;
pub use typewriter::{Typewriter, TypewriterConfig, TypewriterMode};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use folio_fx::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backdrop::Backdrop;
    pub use crate::boundary::ErrorBoundary;
    pub use crate::config::ShowcaseConfig;
    pub use crate::error::ShowcaseError;
    pub use crate::field::{FieldConfig, FrameInput, ParticleField, Variant};
    pub use crate::globe::{Globe, GlobeConfig};
    pub use crate::input::Pointer;
    pub use crate::rules::{Falloff, Rule};
    pub use crate::schedule::Scheduler;
    pub use crate::shell::{Fragment, Shell, ShellFrame};
    pub use crate::time::FrameClock;
    pub use crate::typewriter::{Typewriter, TypewriterConfig, TypewriterMode};
    pub use glam::{Vec2, Vec3};
}
