//! Meshes, materials and models.
//!
//! A [`Model`] is a set of GPU meshes that share a material table. Every mesh
//! points at one material by index, which is how the lamp proxy swaps between
//! its lit and unlit look without rebuilding any buffers.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::{
    colour::linear_rgba,
    texture::{self, Texture},
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Surface parameters as seen by the fragment shaders.
///
/// Colours are linear. `uv_repeat` scales texture coordinates so a single
/// texture can tile across a large surface (the sampler wraps). Shadows are
/// only sampled for materials with `receives_shadows` set.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_colour: [f32; 4],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub uv_repeat: [f32; 2],
    pub metalness: f32,
    pub roughness: f32,
    pub receives_shadows: u32,
    pub _padding: [u32; 3],
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Self {
            base_colour: [1.0; 4],
            emissive: [0.0; 3],
            emissive_intensity: 1.0,
            uv_repeat: [1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            receives_shadows: 0,
            _padding: [0; 3],
        }
    }
}

impl MaterialUniform {
    pub fn from_hex(hex: u32) -> Self {
        Self {
            base_colour: linear_rgba(hex, 1.0),
            ..Default::default()
        }
    }

    pub fn with_shadows(self, receives: bool) -> Self {
        Self {
            receives_shadows: receives as u32,
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub diffuse_texture: Texture,
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Texture,
        uniform: MaterialUniform,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Material Buffer")),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = diffuse_texture
            .sampler
            .clone()
            .unwrap_or_else(|| texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: String::from(name),
            diffuse_texture,
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn set_receives_shadows(&mut self, queue: &wgpu::Queue, receives: bool) {
        self.uniform = self.uniform.with_shadows(receives);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

#[derive(Clone, Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Model {
    /// Point every mesh at the material in slot `idx`.
    ///
    /// Returns `false` and leaves the model untouched when the slot does not exist.
    pub fn use_material(&mut self, idx: usize) -> bool {
        if idx >= self.materials.len() {
            log::warn!(
                "Material slot {} requested but the model only has {} materials.",
                idx,
                self.materials.len()
            );
            return false;
        }
        self.meshes.iter_mut().for_each(|mesh| mesh.material = idx);
        true
    }

    pub fn set_receives_shadows(&mut self, queue: &wgpu::Queue, receives: bool) {
        self.materials
            .iter_mut()
            .for_each(|material| material.set_receives_shadows(queue, receives));
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    /// Geometry only, for the shadow pass. The caller binds the light space transform.
    fn draw_model_depth(&mut self, model: &'a Model, instances: Range<u32>);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &'b Model,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            match model.materials.get(mesh.material) {
                Some(material) => self.draw_mesh_instanced(
                    mesh,
                    material,
                    instances.clone(),
                    camera_bind_group,
                    light_bind_group,
                ),
                None => log::warn!(
                    "Mesh {} references missing material {} and is skipped.",
                    mesh.name,
                    mesh.material
                ),
            }
        }
    }

    fn draw_model_depth(&mut self, model: &'b Model, instances: Range<u32>) {
        for mesh in &model.meshes {
            self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            self.draw_indexed(0..mesh.num_elements, 0, instances.clone());
        }
    }
}
