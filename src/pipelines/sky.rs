use crate::pipelines::basic::{DepthMode, mk_render_pipeline};

/// Fullscreen equirectangular background. Draws three vertices without any
/// vertex buffer and must run before the scene geometry.
pub fn mk_sky_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    sky_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sky Pipeline Layout"),
        bind_group_layouts: &[Some(sky_layout), Some(camera_bind_group_layout)],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sky.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        format,
        Some(wgpu::BlendState::REPLACE),
        Some(DepthMode::Background),
        &[],
        shader,
    )
}
