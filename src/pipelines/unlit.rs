use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{DepthMode, mk_render_pipeline},
};

/// Flat shaded meshes that ignore every light but still fade into the fog.
pub fn mk_unlit_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    material_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Unlit Pipeline Layout"),
        bind_group_layouts: &[
            Some(material_layout),
            Some(camera_bind_group_layout),
            Some(light_bind_group_layout),
        ],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Unlit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("unlit.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(DepthMode::Test),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
