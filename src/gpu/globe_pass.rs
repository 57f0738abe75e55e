//! Globe rendering: one sphere mesh per shell, drawn innermost first.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::globe::mesh::{uv_sphere, SphereVertex};
use crate::globe::textures::{GlobeTextures, MapKind, TextureData};
use crate::globe::{Faces, Globe, Shell, ShellKind};

use super::camera::Camera;
use super::shaders::{
    blend_state, ShellUniforms, GLOBE_CLOUDS_ENTRY, GLOBE_HALO_ENTRY, GLOBE_SURFACE_ENTRY,
    GLOBE_WGSL,
};
use super::DEPTH_FORMAT;

const NORMAL_STRENGTH: f32 = 2.5;
const ROUGHNESS: f32 = 0.35;

struct ShellDraw {
    kind: ShellKind,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

pub struct GlobePass {
    shells: Vec<ShellDraw>,
    texture_bind_group: wgpu::BindGroup,
}

impl GlobePass {
    /// Upload the maps and build one pipeline per shell.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        shells: &[Shell],
        textures: &GlobeTextures,
    ) -> Result<Self, GpuError> {
        let max_dim = device.limits().max_texture_dimension_2d;
        for kind in MapKind::ALL {
            let map = textures.get(kind);
            if map.width > max_dim || map.height > max_dim {
                return Err(GpuError::Validation(format!(
                    "{} map is {}x{}, device limit is {}",
                    kind.label(),
                    map.width,
                    map.height,
                    max_dim
                )));
            }
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Globe Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let views: Vec<wgpu::TextureView> = MapKind::ALL
            .iter()
            .map(|kind| upload_map(device, queue, *kind, textures.get(*kind)))
            .collect();

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globe Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
            ],
        });

        // Binding order follows MapKind::ALL: color, normal, specular, clouds
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globe Texture Bind Group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&views[2]),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&views[3]),
                },
            ],
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globe Shell Uniform Layout"),
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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Globe Shader"),
            source: wgpu::ShaderSource::Wgsl(GLOBE_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Globe Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shells: Vec<ShellDraw> = shells
            .iter()
            .map(|shell| {
                let mesh = uv_sphere(1.0, shell.segments);
                let label = format!("{:?} Shell", shell.kind);

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertices", label)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Indices", label)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{} Uniforms", label)),
                    size: std::mem::size_of::<ShellUniforms>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} Bind Group", label)),
                    layout: &uniform_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });

                ShellDraw {
                    kind: shell.kind,
                    pipeline: shell_pipeline(device, &pipeline_layout, &shader, format, shell),
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                    uniform_buffer,
                    uniform_bind_group,
                }
            })
            .collect();

        log::info!(
            "Globe ready: {} shells, {} fallback maps",
            shells.len(),
            textures.fallback_count()
        );

        Ok(Self {
            shells,
            texture_bind_group,
        })
    }

    /// Write per-shell uniforms for this frame.
    pub fn prepare(&self, queue: &wgpu::Queue, globe: &Globe, camera: &Camera, aspect: f32) {
        let view_proj = camera.view_proj(aspect).to_cols_array_2d();
        let sun = globe.sun_direction().extend(globe.config().sun_intensity).to_array();
        let camera_position = camera.position().extend(1.0).to_array();

        for draw in &self.shells {
            let Some(shell) = globe.shells().iter().find(|s| s.kind == draw.kind) else {
                continue;
            };
            let lit = matches!(shell.kind, ShellKind::Atmosphere);
            let uniforms = ShellUniforms {
                model: globe.model_matrix(shell).to_cols_array_2d(),
                view_proj,
                sun,
                camera_position,
                tint: tint(shell.tint, shell.opacity),
                params: [NORMAL_STRENGTH, if lit { 1.0 } else { 0.0 }, ROUGHNESS, 0.0],
            };
            queue.write_buffer(&draw.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_bind_group(1, &self.texture_bind_group, &[]);
        for shell in &self.shells {
            render_pass.set_pipeline(&shell.pipeline);
            render_pass.set_bind_group(0, &shell.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, shell.vertex_buffer.slice(..));
            render_pass.set_index_buffer(shell.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..shell.index_count, 0, 0..1);
        }
    }
}

fn tint(rgb: Vec3, opacity: f32) -> [f32; 4] {
    rgb.extend(opacity.clamp(0.0, 1.0)).to_array()
}

fn upload_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    kind: MapKind,
    map: &TextureData,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: map.width,
        height: map.height,
        depth_or_array_layers: 1,
    };
    let format = if map.srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("Globe {} Map", kind.label())),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &map.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * map.width),
            rows_per_image: Some(map.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn shell_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    shell: &Shell,
) -> wgpu::RenderPipeline {
    let entry_point = match shell.kind {
        ShellKind::Surface => GLOBE_SURFACE_ENTRY,
        ShellKind::Clouds => GLOBE_CLOUDS_ENTRY,
        ShellKind::Atmosphere | ShellKind::Glow => GLOBE_HALO_ENTRY,
    };
    let cull_mode = match shell.faces {
        Faces::Front => Some(wgpu::Face::Back),
        Faces::Back => Some(wgpu::Face::Front),
        Faces::Both => None,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{:?} Shell Pipeline", shell.kind)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend_state(shell.blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: shell.writes_depth(),
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
