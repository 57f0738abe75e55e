//! WGSL sources and the uniform blocks they read.

use bytemuck::{Pod, Zeroable};

use crate::color::BlendMode;

/// Instanced sprite shader for the backdrop layers.
pub const PARTICLE_WGSL: &str = include_str!("particles.wgsl");

/// Sphere shader for the globe shells.
pub const GLOBE_WGSL: &str = include_str!("globe.wgsl");

/// Fragment entry point of each globe shell kind.
pub const GLOBE_SURFACE_ENTRY: &str = "fs_surface";
pub const GLOBE_CLOUDS_ENTRY: &str = "fs_clouds";
pub const GLOBE_HALO_ENTRY: &str = "fs_halo";

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub opacity: f32,
    /// Sprite radius (0..1) where the edge fade starts.
    pub softness: f32,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ShellUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub sun: [f32; 4],
    pub camera_position: [f32; 4],
    pub tint: [f32; 4],
    pub params: [f32; 4],
}

/// Blend state for premultiplied output.
pub fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Alpha => wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        BlendMode::Additive => {
            let add = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            wgpu::BlendState {
                color: add,
                alpha: add,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<ParticleUniforms>(), 112);
        assert_eq!(std::mem::size_of::<ShellUniforms>(), 192);
    }

    #[test]
    fn test_additive_blend() {
        let state = blend_state(BlendMode::Additive);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend_state(BlendMode::Alpha), wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING);
    }
}
