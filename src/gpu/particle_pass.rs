//! Backdrop particle rendering.
//!
//! Each layer keeps three per-instance vertex buffers (positions, sizes,
//! colors) matching the field's flat output buffers. Only buffers the field
//! marked dirty are re-uploaded.

use glam::Mat4;

use crate::backdrop::Backdrop;
use crate::color::BlendMode;
use crate::field::ParticleField;

use super::shaders::{blend_state, ParticleUniforms, PARTICLE_WGSL};
use super::DEPTH_FORMAT;

const OPACITY: f32 = 0.6;
const SOFTNESS: f32 = 0.35;

struct LayerBuffers {
    positions: wgpu::Buffer,
    sizes: wgpu::Buffer,
    colors: wgpu::Buffer,
    count: u32,
}

impl LayerBuffers {
    fn new(device: &wgpu::Device, index: usize, field: &ParticleField) -> Self {
        let buffer = |name: &str, len: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Layer {} {}", index, name)),
                size: (len.max(1) * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let out = field.buffers();
        Self {
            positions: buffer("Positions", out.positions().len()),
            sizes: buffer("Sizes", out.sizes().len()),
            colors: buffer("Colors", out.colors().len()),
            count: field.len() as u32,
        }
    }
}

pub struct ParticlePass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    layers: Vec<LayerBuffers>,
}

impl ParticlePass {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layers: &[ParticleField],
        blend: BlendMode,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Uniforms"),
            size: std::mem::size_of::<ParticleUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let instance_buffer = |location: u32, format: wgpu::VertexFormat| {
            (
                format.size(),
                [wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: location,
                    format,
                }],
            )
        };
        let (position_stride, position_attr) = instance_buffer(0, wgpu::VertexFormat::Float32x3);
        let (size_stride, size_attr) = instance_buffer(1, wgpu::VertexFormat::Float32);
        let (color_stride, color_attr) = instance_buffer(2, wgpu::VertexFormat::Float32x3);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: position_stride,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &position_attr,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: size_stride,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &size_attr,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: color_stride,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &color_attr,
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend_state(blend)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Sprites test against depth but never write it
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let layers = layers
            .iter()
            .enumerate()
            .map(|(i, field)| LayerBuffers::new(device, i, field))
            .collect();

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            layers,
        }
    }

    /// Upload whatever each layer marked dirty since the last call.
    ///
    /// Returns the number of buffers written.
    pub fn upload(&mut self, queue: &wgpu::Queue, backdrop: &mut Backdrop) -> usize {
        let mut written = 0;
        for (gpu, field) in self.layers.iter_mut().zip(backdrop.layers_mut()) {
            let dirty = field.buffers_mut().take_dirty();
            let out = field.buffers();
            if dirty.positions {
                queue.write_buffer(&gpu.positions, 0, bytemuck::cast_slice(out.positions()));
                written += 1;
            }
            if dirty.sizes {
                queue.write_buffer(&gpu.sizes, 0, bytemuck::cast_slice(out.sizes()));
                written += 1;
            }
            if dirty.colors {
                queue.write_buffer(&gpu.colors, 0, bytemuck::cast_slice(out.colors()));
                written += 1;
            }
        }
        written
    }

    /// Write the camera for this frame.
    pub fn prepare(&self, queue: &wgpu::Queue, view: Mat4, proj: Mat4) {
        // Camera basis vectors are the first two rows of the view rotation
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();
        let uniforms = ParticleUniforms {
            view_proj: (proj * view).to_cols_array_2d(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            opacity: OPACITY,
            softness: SOFTNESS,
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        for layer in self.layers.iter().filter(|l| l.count > 0) {
            render_pass.set_vertex_buffer(0, layer.positions.slice(..));
            render_pass.set_vertex_buffer(1, layer.sizes.slice(..));
            render_pass.set_vertex_buffer(2, layer.colors.slice(..));
            render_pass.draw(0..6, 0..layer.count);
        }
    }
}
