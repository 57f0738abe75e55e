//! Layered particle backdrop.
//!
//! The page background stacks several particle fields of different sizes
//! and colors. [`Backdrop`] owns those layers plus the one pointer trail they
//! all share.

use glam::{Vec2, Vec3};

use crate::config::{standard_layers, LayerConfig};
use crate::field::{FieldConfig, FrameInput, ParticleField, Variant};
use crate::trail::PointerTrail;

/// A stack of particle fields drawn behind the page content.
#[derive(Debug, Clone)]
pub struct Backdrop {
    layers: Vec<ParticleField>,
    trail: PointerTrail,
}

impl Backdrop {
    pub fn new(layers: Vec<ParticleField>) -> Self {
        Self {
            layers,
            trail: PointerTrail::default(),
        }
    }

    /// Build one layer per field config.
    pub fn from_configs(configs: impl IntoIterator<Item = FieldConfig>) -> Self {
        Self::new(configs.into_iter().map(ParticleField::new).collect())
    }

    /// The three-layer stack of the hero page: a dense slate layer, a
    /// sky-blue layer and a sparse cyan layer.
    pub fn standard(variant: Variant) -> Self {
        Self::from_configs(standard_layers(variant).iter().map(LayerConfig::to_field_config))
    }

    pub fn layers(&self) -> &[ParticleField] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [ParticleField] {
        &mut self.layers
    }

    pub fn trail(&self) -> &PointerTrail {
        &self.trail
    }

    /// Total particles across all layers.
    pub fn particle_count(&self) -> usize {
        self.layers.iter().map(ParticleField::len).sum()
    }

    /// Record the pointer and advance every layer one frame.
    pub fn update(&mut self, time: f32, pointer: Option<Vec3>, viewport_half: Vec2) {
        match pointer {
            Some(p) => self.trail.push(p, time),
            None => self.trail.prune(time),
        }

        let frame = FrameInput::new(time, viewport_half)
            .with_pointer(pointer)
            .with_trail(&self.trail);
        for layer in &mut self.layers {
            layer.update(&frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layers() {
        let backdrop = Backdrop::standard(Variant::Instanced);
        let counts: Vec<usize> = backdrop.layers().iter().map(ParticleField::len).collect();
        assert_eq!(counts, vec![400, 150, 60]);
        assert_eq!(backdrop.particle_count(), 610);
    }

    #[test]
    fn test_update_records_trail() {
        let mut backdrop = Backdrop::standard(Variant::Aurora);
        backdrop.update(0.0, Some(Vec3::ZERO), Vec2::new(30.0, 17.0));
        backdrop.update(0.1, Some(Vec3::X), Vec2::new(30.0, 17.0));
        assert_eq!(backdrop.trail().len(), 2);

        // Pointer gone: history ages out instead of growing
        backdrop.update(1.0, None, Vec2::new(30.0, 17.0));
        assert!(backdrop.trail().is_empty());
    }
}
