//! Scene lights and their uniform buffer.
//!
//! Lights are described on the CPU by [`SceneLights`] and packed into one
//! [`LightUniform`] each frame. Only lights that are visible make it into the
//! uniform. Point lights beyond [`MAX_POINT_LIGHTS`] are dropped with a
//! warning. The sun and the spot light may cast shadows, each through its own
//! [`ShadowMap`].

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::camera::OPENGL_TO_WGPU_MATRIX;

use super::shadow::{self, ShadowMap};

pub const MAX_POINT_LIGHTS: usize = 64;

/// Half width of the square the sun shadow covers around the origin.
pub const SUN_SHADOW_EXTENT: f32 = 100.0;
/// Distance of the sun shadow camera from the origin.
pub const SUN_SHADOW_DISTANCE: f32 = 200.0;
pub const SPOT_SHADOW_NEAR: f32 = 0.5;
const SPOT_SHADOW_FAR: f32 = 500.0;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    pub position: [f32; 3],
    pub range: f32,
    pub colour: [f32; 3],
    pub intensity: f32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// Light travels from `position` towards the origin.
    pub position: [f32; 3],
    pub intensity: f32,
    pub colour: [f32; 3],
    pub enabled: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightRaw {
    pub position: [f32; 3],
    pub intensity: f32,
    pub aim: [f32; 3],
    pub cos_outer: f32,
    pub colour: [f32; 3],
    pub cos_inner: f32,
    pub range: f32,
    pub decay: f32,
    pub enabled: u32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    pub _padding: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    pub fog_colour: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub point_count: u32,
    pub sun_shadow: u32,
    pub spot_shadow: u32,
    pub sun: DirectionalLightRaw,
    pub spot: SpotLightRaw,
    pub sun_view_proj: [[f32; 4]; 4],
    pub spot_view_proj: [[f32; 4]; 4],
    pub points: [PointLightRaw; MAX_POINT_LIGHTS],
}

impl Default for LightUniform {
    fn default() -> Self {
        SceneLights::default().to_uniform()
    }
}

impl LightUniform {
    pub fn active_points(&self) -> &[PointLightRaw] {
        &self.points[..self.point_count as usize]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    /// Linear RGB.
    pub colour: [f32; 3],
    pub intensity: f32,
    /// Distance at which the light has faded out completely. Zero means no cutoff.
    pub range: f32,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub colour: [f32; 3],
    pub intensity: f32,
    pub visible: bool,
    pub casts_shadow: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 1.0, 0.0),
            colour: [1.0; 3],
            intensity: 0.0,
            visible: false,
            casts_shadow: false,
        }
    }
}

impl DirectionalLight {
    /// Orthographic light space transform centred on the origin.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let dir = self.position.to_vec();
        let dir = if dir.magnitude2() > 0.0 {
            dir.normalize()
        } else {
            Vector3::unit_y()
        };
        let eye = Point3::from_vec(dir * SUN_SHADOW_DISTANCE);
        let e = SUN_SHADOW_EXTENT;
        let proj = cgmath::ortho(-e, e, -e, e, 1.0, 2.0 * SUN_SHADOW_DISTANCE);
        OPENGL_TO_WGPU_MATRIX * proj * light_view(eye, Point3::origin())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub colour: [f32; 3],
    pub intensity: f32,
    pub range: f32,
    /// Half angle of the cone in radians.
    pub angle: f32,
    /// Fraction of the cone that is softened, `0.0..=1.0`.
    pub penumbra: f32,
    pub decay: f32,
    pub casts_shadow: bool,
}

impl SpotLight {
    fn aim(&self) -> Vector3<f32> {
        let aim = self.target - self.position;
        if aim.magnitude2() > 0.0 {
            aim.normalize()
        } else {
            -Vector3::unit_y()
        }
    }

    /// Perspective light space transform covering the whole cone.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let far = if self.range > SPOT_SHADOW_NEAR {
            self.range
        } else {
            SPOT_SHADOW_FAR
        };
        let fovy = Rad((2.0 * self.angle).clamp(0.01, 3.0));
        let proj = cgmath::perspective(fovy, 1.0, SPOT_SHADOW_NEAR, far);
        OPENGL_TO_WGPU_MATRIX * proj * light_view(self.position, self.position + self.aim())
    }

    fn to_raw(&self) -> SpotLightRaw {
        let aim = self.aim();
        let penumbra = self.penumbra.clamp(0.0, 1.0);
        SpotLightRaw {
            position: self.position.into(),
            intensity: self.intensity,
            aim: aim.into(),
            cos_outer: self.angle.cos(),
            colour: self.colour,
            cos_inner: (self.angle * (1.0 - penumbra)).cos(),
            range: self.range,
            decay: self.decay,
            enabled: 1,
            _padding: 0,
        }
    }
}

fn light_view(eye: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
    let forward = (target - eye).normalize();
    // looking straight up or down needs another up vector
    let up = if forward.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    Matrix4::look_at_rh(eye, target, up)
}

/// Linear distance fog.
#[derive(Clone, Debug, PartialEq)]
pub struct Fog {
    pub colour: [f32; 3],
    pub near: f32,
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        // far below near disables the fog in the shader
        Self {
            colour: [1.0; 3],
            near: f32::MAX,
            far: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneLights {
    pub ambient: [f32; 3],
    pub fog: Fog,
    pub sun: DirectionalLight,
    pub spot: Option<SpotLight>,
    pub points: Vec<PointLight>,
}

impl SceneLights {
    pub fn to_uniform(&self) -> LightUniform {
        let visible: Vec<&PointLight> = self.points.iter().filter(|light| light.visible).collect();
        if visible.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "{} point lights are visible but only {} fit the light uniform, the rest are dropped.",
                visible.len(),
                MAX_POINT_LIGHTS
            );
        }
        let mut points = [PointLightRaw::default(); MAX_POINT_LIGHTS];
        let mut point_count = 0;
        for (slot, light) in points.iter_mut().zip(visible.iter()) {
            *slot = PointLightRaw {
                position: light.position.into(),
                range: light.range,
                colour: light.colour,
                intensity: light.intensity,
            };
            point_count += 1;
        }

        let sun = DirectionalLightRaw {
            position: self.sun.position.into(),
            intensity: self.sun.intensity,
            colour: self.sun.colour,
            enabled: self.sun.visible as u32,
        };
        let spot = self
            .spot
            .as_ref()
            .map(SpotLight::to_raw)
            .unwrap_or_default();
        let spot_view_proj = self
            .spot
            .as_ref()
            .map(SpotLight::view_proj)
            .unwrap_or_else(Matrix4::identity);
        let [r, g, b] = self.ambient;

        LightUniform {
            ambient: [r, g, b, 1.0],
            fog_colour: self.fog.colour,
            fog_near: self.fog.near,
            fog_far: self.fog.far,
            point_count,
            sun_shadow: self.sun_casts_shadow() as u32,
            spot_shadow: self.spot_casts_shadow() as u32,
            sun,
            spot,
            sun_view_proj: self.sun.view_proj().into(),
            spot_view_proj: spot_view_proj.into(),
            points,
        }
    }

    pub fn sun_casts_shadow(&self) -> bool {
        self.sun.visible && self.sun.casts_shadow
    }

    pub fn spot_casts_shadow(&self) -> bool {
        self.spot.as_ref().is_some_and(|spot| spot.casts_shadow)
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub caster_layout: wgpu::BindGroupLayout,
    pub sun_shadow: ShadowMap,
    pub spot_shadow: ShadowMap,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, lights: &SceneLights) -> Self {
        let uniform = lights.to_uniform();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let caster_layout = shadow::mk_caster_layout(device);
        let sun_shadow = ShadowMap::new(device, &caster_layout, "sun", uniform.sun_view_proj);
        let spot_shadow = ShadowMap::new(device, &caster_layout, "spot", uniform.spot_view_proj);
        let sampler = shadow::mk_comparison_sampler(device);

        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sun_shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&spot_shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            caster_layout,
            sun_shadow,
            spot_shadow,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, lights: &SceneLights) {
        self.uniform = lights.to_uniform();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        self.sun_shadow.write(queue, self.uniform.sun_view_proj);
        self.spot_shadow.write(queue, self.uniform.spot_view_proj);
    }

    /// Every shadow map with whether its light currently casts.
    pub fn shadow_maps(&self) -> [(&ShadowMap, bool); 2] {
        [
            (&self.sun_shadow, self.uniform.sun_shadow != 0),
            (&self.spot_shadow, self.uniform.spot_shadow != 0),
        ]
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let shadow_map = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Depth,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            shadow_map(1),
            shadow_map(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}
