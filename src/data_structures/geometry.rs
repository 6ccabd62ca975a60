//! Primitive geometry generated on the CPU.
//!
//! Planes, boxes, cylinders and UV spheres are produced as [`MeshData`] with
//! counter-clockwise front faces (matching the pipelines' `FrontFace::Ccw`
//! with back-face culling) and texture coordinates with the origin in the top
//! left corner. [`MeshData::upload`] turns the data into a GPU [`Mesh`].

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model::{Mesh, ModelVertex};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat rectangle in the XY plane facing +Z, centred on the origin.
    pub fn plane(width: f32, height: f32) -> Self {
        let mut data = Self::default();
        data.push_quad(
            Vector3::unit_z(),
            0.0,
            Vector3::unit_x(),
            width,
            Vector3::unit_y(),
            height,
        );
        data
    }

    /// Axis aligned box centred on the origin with one quad per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let mut data = Self::default();
        let x = Vector3::unit_x();
        let y = Vector3::unit_y();
        let z = Vector3::unit_z();
        // (normal, distance from centre, right, right extent, up, up extent) with right x up = normal
        let faces = [
            (x, width / 2.0, -z, depth, y, height),
            (-x, width / 2.0, z, depth, y, height),
            (y, height / 2.0, x, width, -z, depth),
            (-y, height / 2.0, x, width, z, depth),
            (z, depth / 2.0, x, width, y, height),
            (-z, depth / 2.0, -x, width, y, height),
        ];
        for (normal, offset, right, right_extent, up, up_extent) in faces {
            data.push_quad(normal, offset, right, right_extent, up, up_extent);
        }
        data
    }

    /// Open-ended tube with a cap on each end, axis along Y.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let segments = radial_segments.max(3);
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;
        let mut data = Self::default();

        // torso: two rings of `segments + 1` vertices so the seam can carry its own uv
        for row in 0..=1u32 {
            let v = row as f32;
            let radius = v * (radius_bottom - radius_top) + radius_top;
            for column in 0..=segments {
                let u = column as f32 / segments as f32;
                let (sin, cos) = (u * TAU).sin_cos();
                let normal = Vector3::new(sin, slope, cos).normalize();
                data.vertices.push(ModelVertex {
                    position: [radius * sin, half_height - v * height, radius * cos],
                    tex_coords: [u, v],
                    normal: normal.into(),
                });
            }
        }
        let ring = segments + 1;
        for column in 0..segments {
            let a = column;
            let b = column + ring;
            let c = column + 1 + ring;
            let d = column + 1;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        data.push_cap(radius_top, half_height, segments, true);
        data.push_cap(radius_bottom, -half_height, segments, false);
        data
    }

    /// UV sphere centred on the origin.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut data = Self::default();

        for row in 0..=height_segments {
            let v = row as f32 / height_segments as f32;
            for column in 0..=width_segments {
                let u = column as f32 / width_segments as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();
                let (sin_theta, cos_theta) = (v * PI).sin_cos();
                let normal = Vector3::new(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
                data.vertices.push(ModelVertex {
                    position: (normal * radius).into(),
                    tex_coords: [u, v],
                    normal: normal.into(),
                });
            }
        }

        let stride = width_segments + 1;
        for row in 0..height_segments {
            for column in 0..width_segments {
                let a = row * stride + column + 1;
                let b = row * stride + column;
                let c = (row + 1) * stride + column;
                let d = (row + 1) * stride + column + 1;
                // the first and last rows collapse into the poles
                if row != 0 {
                    data.indices.extend_from_slice(&[a, b, d]);
                }
                if row != height_segments - 1 {
                    data.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        data
    }

    pub fn upload(&self, device: &wgpu::Device, name: &str, material: usize) -> Mesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Mesh {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
            material,
        }
    }

    fn push_quad(
        &mut self,
        normal: Vector3<f32>,
        offset: f32,
        right: Vector3<f32>,
        right_extent: f32,
        up: Vector3<f32>,
        up_extent: f32,
    ) {
        let base = self.vertices.len() as u32;
        for row in 0..=1u32 {
            for column in 0..=1u32 {
                let across = (column as f32 - 0.5) * right_extent;
                let down = (0.5 - row as f32) * up_extent;
                let position = normal * offset + right * across + up * down;
                self.vertices.push(ModelVertex {
                    position: position.into(),
                    tex_coords: [column as f32, row as f32],
                    normal: normal.into(),
                });
            }
        }
        // 0 1
        // 2 3
        let (a, b, c, d) = (base, base + 2, base + 3, base + 1);
        self.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    fn push_cap(&mut self, radius: f32, y: f32, segments: u32, top: bool) {
        let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
        let centre = self.vertices.len() as u32;
        self.vertices.push(ModelVertex {
            position: [0.0, y, 0.0],
            tex_coords: [0.5, 0.5],
            normal,
        });
        let first = centre + 1;
        for column in 0..=segments {
            let (sin, cos) = (column as f32 / segments as f32 * TAU).sin_cos();
            self.vertices.push(ModelVertex {
                position: [radius * sin, y, radius * cos],
                tex_coords: [0.5 + sin * 0.5, 0.5 + cos * 0.5],
                normal,
            });
        }
        for column in 0..segments {
            let i = first + column;
            if top {
                self.indices.extend_from_slice(&[i, i + 1, centre]);
            } else {
                self.indices.extend_from_slice(&[i + 1, i, centre]);
            }
        }
    }
}
