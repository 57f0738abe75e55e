//! The hero scene as a set of mounted components.
//!
//! [`Shell`] owns the particle backdrop, the globe (behind an
//! [`ErrorBoundary`]) and the typewriter headline, plus the [`Scheduler`]
//! that drives them. Each frame it fires due timers, advances whatever is
//! subscribed and hands back the [`Fragment`]s to draw.
//!
//! ```ignore
//! let mut shell = Shell::new(&config);
//! shell.mount(clock.elapsed_ms());
//!
//! // Per frame:
//! for fragment in shell.frame(&ShellFrame { now_ms, delta, pointer, viewport_half }) {
//!     match fragment {
//!         Fragment::Backdrop(backdrop) => { /* particle pass */ }
//!         Fragment::Hero(globe) => { /* globe pass */ }
//!         Fragment::Loading | Fragment::Fallback(_) => { /* placeholder */ }
//!         Fragment::Headline(text) => window.set_title(text),
//!     }
//! }
//! ```

use std::fmt::Display;

use glam::{Vec2, Vec3};

use crate::backdrop::Backdrop;
use crate::boundary::ErrorBoundary;
use crate::config::ShowcaseConfig;
use crate::field::FieldConfig;
use crate::globe::textures::{GlobeTextures, TextureLoader};
use crate::globe::Globe;
use crate::schedule::{OwnerId, Scheduler};
use crate::typewriter::Typewriter;

/// Inputs for one frame of the scene.
#[derive(Debug, Clone, Copy)]
pub struct ShellFrame {
    /// Elapsed time in milliseconds.
    pub now_ms: u64,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Pointer in particle space, if over the window.
    pub pointer: Option<Vec3>,
    /// Half-size of the visible backdrop area.
    pub viewport_half: Vec2,
}

/// One piece of the scene to draw this frame.
#[derive(Debug, Clone, Copy)]
pub enum Fragment<'a> {
    Backdrop(&'a Backdrop),
    /// The globe, textures loaded.
    Hero(&'a Globe),
    /// Globe textures still loading.
    Loading,
    /// The globe failed; show this message instead.
    Fallback(&'static str),
    Headline(&'a str),
}

#[derive(Debug)]
enum GlobeAssets {
    NotStarted,
    Loading(TextureLoader),
    /// Loaded; holds the maps until the renderer takes them.
    Ready(Option<GlobeTextures>),
}

enum GlobeStatus {
    Loading,
    Ready,
}

#[derive(Debug)]
pub struct Shell {
    scheduler: Scheduler,
    layers: Vec<FieldConfig>,
    backdrop: Backdrop,
    globe: Globe,
    boundary: ErrorBoundary,
    headline: Typewriter,
    assets: GlobeAssets,
    backdrop_owner: Option<OwnerId>,
    globe_owner: Option<OwnerId>,
}

impl Shell {
    pub fn new(config: &ShowcaseConfig) -> Self {
        let layers = config.field_configs();
        Self {
            scheduler: Scheduler::new(),
            backdrop: Backdrop::from_configs(layers.iter().cloned()),
            layers,
            globe: Globe::new(config.globe.clone()),
            boundary: ErrorBoundary::new("Globe"),
            headline: Typewriter::new(config.headline.clone()),
            assets: GlobeAssets::NotStarted,
            backdrop_owner: None,
            globe_owner: None,
        }
    }

    /// Use already decoded globe maps instead of loading them at mount.
    pub fn with_textures(mut self, textures: GlobeTextures) -> Self {
        self.assets = GlobeAssets::Ready(Some(textures));
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.backdrop_owner.is_some()
    }

    /// Start every component at `now_ms`.
    ///
    /// Particles are respawned and the globe animation restarts, so nothing
    /// carries over from an earlier mount.
    pub fn mount(&mut self, now_ms: u64) {
        if self.is_mounted() {
            return;
        }
        self.backdrop = Backdrop::from_configs(self.layers.iter().cloned());
        self.globe = Globe::new(self.globe.config().clone());

        let backdrop = self.scheduler.register_owner();
        self.scheduler.subscribe_frames(backdrop);
        self.backdrop_owner = Some(backdrop);

        let globe = self.scheduler.register_owner();
        self.scheduler.subscribe_frames(globe);
        self.globe_owner = Some(globe);

        self.headline.mount(&mut self.scheduler, now_ms);

        if let GlobeAssets::NotStarted = self.assets {
            let config = self.globe.config();
            self.assets = GlobeAssets::Loading(TextureLoader::spawn(
                config.textures.clone(),
                config.retry,
            ));
        }
        log::info!(
            "Scene mounted: {} backdrop particles in {} layers",
            self.backdrop.particle_count(),
            self.backdrop.layers().len()
        );
    }

    /// Release every timer and frame subscription.
    pub fn unmount(&mut self) {
        for owner in [self.backdrop_owner.take(), self.globe_owner.take()].into_iter().flatten() {
            self.scheduler.release(owner);
        }
        self.headline.unmount(&mut self.scheduler);
        log::info!("Scene unmounted");
    }

    /// Advance the scene to `input.now_ms` and list what to draw.
    ///
    /// Returns nothing while unmounted.
    pub fn frame(&mut self, input: &ShellFrame) -> Vec<Fragment<'_>> {
        if !self.is_mounted() {
            return Vec::new();
        }

        self.fire_timers(input.now_ms);

        let elapsed = input.now_ms as f32 / 1000.0;
        let backdrop_live = self.is_subscribed(self.backdrop_owner);
        if backdrop_live {
            self.backdrop.update(elapsed, input.pointer, input.viewport_half);
        }

        let hero = if self.is_subscribed(self.globe_owner) {
            let assets = &mut self.assets;
            let globe = &mut self.globe;
            let status = self
                .boundary
                .run(|| step_globe(assets, globe, elapsed, input.delta));
            Some(match status {
                Some(GlobeStatus::Ready) => Fragment::Hero(&self.globe),
                Some(GlobeStatus::Loading) => Fragment::Loading,
                None => Fragment::Fallback(self.boundary.fallback_markup()),
            })
        } else {
            None
        };

        let mut fragments = Vec::with_capacity(3);
        if backdrop_live {
            fragments.push(Fragment::Backdrop(&self.backdrop));
        }
        fragments.extend(hero);
        fragments.push(Fragment::Headline(self.headline.text()));
        fragments
    }

    /// Run globe work (e.g. the GPU pass) inside the globe's boundary.
    pub fn guard_globe<T, E, F>(&mut self, f: F) -> Option<T>
    where
        E: Display,
        F: FnOnce(&Globe) -> Result<T, E>,
    {
        let globe = &self.globe;
        self.boundary.run(|| f(globe))
    }

    /// Hand loaded globe maps to the renderer, once.
    pub fn take_textures(&mut self) -> Option<GlobeTextures> {
        match &mut self.assets {
            GlobeAssets::Ready(textures) => textures.take(),
            _ => None,
        }
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    /// Mutable access for the renderer, which clears dirty flags on upload.
    pub fn backdrop_mut(&mut self) -> &mut Backdrop {
        &mut self.backdrop
    }

    pub fn globe(&self) -> &Globe {
        &self.globe
    }

    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    pub fn headline(&self) -> &Typewriter {
        &self.headline
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn is_subscribed(&self, owner: Option<OwnerId>) -> bool {
        owner.is_some_and(|o| self.scheduler.is_subscribed(o))
    }

    fn fire_timers(&mut self, now_ms: u64) {
        loop {
            let due = self.scheduler.pop_due(now_ms);
            if due.is_empty() {
                break;
            }
            for fired in &due {
                if self.headline.owner() == Some(fired.owner) {
                    self.headline.on_timer(&mut self.scheduler, fired);
                } else {
                    log::trace!("Timer {:?} has no handler", fired.id);
                }
            }
        }
    }
}

fn step_globe(
    assets: &mut GlobeAssets,
    globe: &mut Globe,
    elapsed: f32,
    delta: f32,
) -> Result<GlobeStatus, String> {
    match assets {
        GlobeAssets::NotStarted => return Ok(GlobeStatus::Loading),
        GlobeAssets::Loading(loader) => match loader.poll() {
            None => return Ok(GlobeStatus::Loading),
            Some(Err(e)) => return Err(format!("texture loader crashed: {}", e)),
            Some(Ok(textures)) => {
                let fallbacks = textures.fallback_count();
                if fallbacks > 0 {
                    log::warn!("Globe textures loaded with {} fallback maps", fallbacks);
                } else {
                    log::info!("Globe textures loaded");
                }
                *assets = GlobeAssets::Ready(Some(textures));
            }
        },
        GlobeAssets::Ready(_) => {}
    }
    globe.update(elapsed, delta);
    Ok(GlobeStatus::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typewriter::{TypewriterConfig, TypewriterMode};

    fn config() -> ShowcaseConfig {
        let mut config = ShowcaseConfig::default();
        config.headline = TypewriterConfig::new("Hello")
            .with_speed(100)
            .with_delay(500)
            .with_mode(TypewriterMode::Hold);
        config
    }

    fn frame(now_ms: u64) -> ShellFrame {
        ShellFrame {
            now_ms,
            delta: 1.0 / 60.0,
            pointer: None,
            viewport_half: Vec2::new(30.0, 17.0),
        }
    }

    fn shell() -> Shell {
        Shell::new(&config()).with_textures(GlobeTextures::fallback())
    }

    #[test]
    fn test_frame_fragments() {
        let mut shell = shell();
        shell.mount(0);
        let fragments = shell.frame(&frame(600));
        assert_eq!(fragments.len(), 3);
        assert!(matches!(fragments[0], Fragment::Backdrop(_)));
        assert!(matches!(fragments[1], Fragment::Hero(_)));
        assert!(matches!(fragments[2], Fragment::Headline("H")));
    }

    #[test]
    fn test_unmounted_frame_is_empty() {
        let mut shell = shell();
        assert!(shell.frame(&frame(0)).is_empty());
    }

    #[test]
    fn test_textures_taken_once() {
        let mut shell = shell();
        assert!(shell.take_textures().is_some());
        assert!(shell.take_textures().is_none());
    }

    #[test]
    fn test_globe_failure_falls_back() {
        let mut shell = shell();
        shell.mount(0);
        let out: Option<()> = shell.guard_globe(|_| Err("device lost"));
        assert!(out.is_none());

        let fragments = shell.frame(&frame(1000));
        assert!(matches!(fragments[0], Fragment::Backdrop(_)));
        assert!(matches!(fragments[1], Fragment::Fallback(_)));
        assert!(matches!(fragments[2], Fragment::Headline("Hello")));
    }
}
