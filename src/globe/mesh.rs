//! UV sphere generation for the globe shells.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};

/// One sphere vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh of a sphere.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build a UV sphere with `segments` slices around and `segments` stacks
/// from pole to pole.
///
/// The seam column is duplicated so texture coordinates run cleanly from
/// u = 0 to u = 1. Degenerate triangles at the poles are skipped.
pub fn uv_sphere(radius: f32, segments: u32) -> SphereMesh {
    let width = segments.max(3);
    let height = (segments / 2).max(2);

    let mut vertices = Vec::with_capacity(((width + 1) * (height + 1)) as usize);
    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        let theta = v * PI;
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let phi = u * TAU;
            let normal = [-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin()];
            vertices.push(SphereVertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                uv: [u, v],
            });
        }
    }

    let row = width + 1;
    let mut indices = Vec::with_capacity((width * (height - 1) * 6) as usize);
    for iy in 0..height {
        for ix in 0..width {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereMesh { vertices, indices }
}
