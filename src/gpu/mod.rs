//! GPU state for the showcase window.
//!
//! [`GpuState`] owns the surface, device, queue and depth buffer plus the
//! two render passes: the particle backdrop (always) and the globe (once its
//! textures have been uploaded). The backdrop is drawn with a fixed camera,
//! the globe with an orbit camera on top of it.

pub mod camera;
pub mod globe_pass;
pub mod particle_pass;
pub mod shaders;

use std::sync::Arc;

use glam::Vec2;
use winit::window::Window;

use crate::backdrop::Backdrop;
use crate::color::BlendMode;
use crate::error::GpuError;
use crate::globe::textures::GlobeTextures;
use crate::globe::{Globe, Shell};

pub use camera::Camera;
use globe_pass::GlobePass;
use particle_pass::ParticlePass;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Slate-950 backdrop.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.008,
    g: 0.024,
    b: 0.09,
    a: 1.0,
};

/// What happened to the globe while rendering a frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Validation error raised by the globe pass, if any.
    pub globe_error: Option<String>,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    particles: ParticlePass,
    globe: Option<GlobePass>,
    pub backdrop_camera: Camera,
    pub globe_camera: Camera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, backdrop: &Backdrop, vsync: bool) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|e| log::error!("Uncaptured GPU error: {}", e)));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);
        let particles = ParticlePass::new(&device, config.format, backdrop.layers(), BlendMode::Additive);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            particles,
            globe: None,
            backdrop_camera: Camera::backdrop(),
            globe_camera: Camera::globe(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size (after it was lost).
    pub fn reconfigure(&mut self) {
        let size = winit::dpi::PhysicalSize::new(self.config.width, self.config.height);
        self.resize(size);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Visible half-size of the backdrop plane, used as the wrap bounds.
    pub fn backdrop_half_extents(&self) -> Vec2 {
        self.backdrop_camera.visible_half_extents(self.aspect())
    }

    pub fn has_globe(&self) -> bool {
        self.globe.is_some()
    }

    /// Upload dirty particle buffers. Returns how many were written.
    pub fn upload_backdrop(&mut self, backdrop: &mut Backdrop) -> usize {
        self.particles.upload(&self.queue, backdrop)
    }

    /// Upload globe textures and build the globe pipelines.
    pub fn load_globe(&mut self, shells: &[Shell], textures: &GlobeTextures) -> Result<(), GpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pass = GlobePass::new(&self.device, &self.queue, self.config.format, shells, textures);
        let scoped = pollster::block_on(self.device.pop_error_scope());

        if let Some(e) = scoped {
            return Err(GpuError::Validation(e.to_string()));
        }
        self.globe = Some(pass?);
        Ok(())
    }

    /// Write this frame's globe uniforms.
    pub fn prepare_globe(&mut self, globe: &Globe, delta: f32) {
        self.globe_camera.update(delta);
        if let Some(pass) = &self.globe {
            pass.prepare(&self.queue, globe, &self.globe_camera, self.aspect());
        }
    }

    /// Draw the backdrop, then the globe if `draw_globe` is set and loaded.
    pub fn render(&mut self, draw_globe: bool) -> Result<FrameReport, wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.particles.prepare(
            &self.queue,
            self.backdrop_camera.view_matrix(),
            self.backdrop_camera.projection(self.aspect()),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Backdrop Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Backdrop Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(self.depth_attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.particles.draw(&mut render_pass);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut report = FrameReport::default();
        if let (true, Some(globe)) = (draw_globe, &self.globe) {
            // Globe work gets its own error scope so failures can be contained
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Globe Encoder"),
                });
            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Globe Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(self.depth_attachment()),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                globe.draw(&mut render_pass);
            }
            self.queue.submit(std::iter::once(encoder.finish()));
            report.globe_error = pollster::block_on(self.device.pop_error_scope()).map(|e| e.to_string());
        }

        output.present();
        Ok(report)
    }

    /// Depth is cleared for each pass; the backdrop and the globe use
    /// different cameras.
    fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_texture,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
