//! Render pipelines.
//!
//! - `basic` lit geometry and the shared pipeline builder
//! - `unlit` geometry that ignores lights (sun, lamp proxy)
//! - `sky` the equirectangular background
//! - `light` scene lights and the light uniform
//! - `shadow` depth-only shadow maps for the sun and the spot light

pub mod basic;
pub mod light;
pub mod shadow;
pub mod sky;
pub mod unlit;

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        material_layout: &wgpu::BindGroupLayout,
        sky_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        caster_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            basic: basic::mk_basic_pipeline(
                device,
                format,
                material_layout,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            unlit: unlit::mk_unlit_pipeline(
                device,
                format,
                material_layout,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            sky: sky::mk_sky_pipeline(device, format, sky_layout, camera_bind_group_layout),
            shadow: shadow::mk_shadow_pipeline(device, caster_layout),
        }
    }
}
