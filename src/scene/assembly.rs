//! A GPU-free description of everything the grove draws.
//!
//! [`Blueprint::assemble`] turns a [`GroveState`] into props (a shape, its
//! materials and where it is placed), lights, the background and the models
//! to fetch. The grove flow uploads a blueprint once in `on_init`; tests look
//! at it directly.

use std::f32::consts::FRAC_PI_2;

use cgmath::{Quaternion, Rad, Rotation3, Vector3};

use crate::{
    data_structures::{colour::linear_rgb, geometry::MeshData, instance::Instance, model::MaterialUniform},
    pipelines::light::SceneLights,
    scene::{
        GroveState,
        config::{AssetId, CameraSpec, ModelPlacement, Role},
        toggle::{SLOT_OFF, SLOT_ON},
    },
};

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Plane {
        width: f32,
        height: f32,
    },
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
}

impl Shape {
    pub fn mesh(&self) -> MeshData {
        match *self {
            Shape::Plane { width, height } => MeshData::plane(width, height),
            Shape::Cuboid {
                width,
                height,
                depth,
            } => MeshData::cuboid(width, height, depth),
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                segments,
            } => MeshData::cylinder(radius_top, radius_bottom, height, segments),
            Shape::Sphere {
                radius,
                width_segments,
                height_segments,
            } => MeshData::sphere(radius, width_segments, height_segments),
        }
    }
}

/// Which pipeline a prop is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    Lit,
    Unlit,
}

/// One material slot of a prop.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub colour: u32,
    /// Replaces the white placeholder once it has loaded.
    pub texture: Option<AssetId>,
    pub emissive: u32,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub uv_repeat: [f32; 2],
}

impl Surface {
    pub fn colour(colour: u32) -> Self {
        Self {
            colour,
            texture: None,
            emissive: 0x000000,
            emissive_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            uv_repeat: [1.0, 1.0],
        }
    }

    pub fn textured(texture: AssetId) -> Self {
        Self {
            texture: Some(texture),
            ..Self::colour(0xffffff)
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            emissive: linear_rgb(self.emissive),
            emissive_intensity: self.emissive_intensity,
            uv_repeat: self.uv_repeat,
            metalness: self.metalness,
            roughness: self.roughness,
            ..MaterialUniform::from_hex(self.colour)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prop {
    pub role: Role,
    pub shape: Shape,
    pub shading: Shading,
    /// Material slots. The first one is in use when the prop is uploaded.
    pub surfaces: Vec<Surface>,
    pub placements: Vec<Instance>,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

impl Prop {
    /// The uniform for one of this prop's surfaces.
    pub fn material(&self, surface: &Surface) -> MaterialUniform {
        surface.uniform().with_shadows(self.receives_shadow)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Blueprint {
    pub props: Vec<Prop>,
    pub lights: SceneLights,
    pub background: AssetId,
    pub models: Vec<ModelPlacement>,
    pub camera: CameraSpec,
}

/// Slot `SLOT_ON` holds the lit look, `SLOT_OFF` the dark one.
fn lamp_surfaces(on: u32, off: u32) -> Vec<Surface> {
    // the vec is built in slot order
    const { assert!(SLOT_ON == 0 && SLOT_OFF == 1) };
    vec![Surface::colour(on), Surface::colour(off)]
}

fn placed(position: impl Into<Vector3<f32>>) -> Instance {
    Instance::from(position.into())
}

impl Blueprint {
    pub fn assemble(state: &GroveState) -> Self {
        let cfg = &state.config;

        let ground = Prop {
            role: Role::Ground,
            shape: Shape::Plane {
                width: cfg.ground_size,
                height: cfg.ground_size,
            },
            shading: Shading::Lit,
            surfaces: vec![Surface {
                uv_repeat: [cfg.ground_repeat, cfg.ground_repeat],
                ..Surface::textured(AssetId::FloorTexture)
            }],
            placements: vec![
                placed([0.0, cfg.ground_height, 0.0])
                    .with_rotation(Quaternion::from_angle_x(Rad(-FRAC_PI_2))),
            ],
            casts_shadow: false,
            receives_shadow: true,
        };

        let spinner_instance = |role| state.spinner(role).map(|spinner| spinner.instance());
        let cube = Prop {
            role: Role::Cube,
            shape: Shape::Cuboid {
                width: cfg.cube_size,
                height: cfg.cube_size,
                depth: cfg.cube_size,
            },
            shading: Shading::Lit,
            surfaces: vec![Surface::textured(AssetId::NaviTexture)],
            placements: spinner_instance(Role::Cube).into_iter().collect(),
            casts_shadow: true,
            receives_shadow: false,
        };

        let cylinder = Prop {
            role: Role::Cylinder,
            shape: Shape::Cylinder {
                radius_top: cfg.cylinder_radius,
                radius_bottom: cfg.cylinder_radius,
                height: cfg.cylinder_height,
                segments: cfg.cylinder_segments,
            },
            shading: Shading::Lit,
            surfaces: vec![Surface {
                metalness: cfg.cylinder_metalness,
                roughness: cfg.cylinder_roughness,
                ..Surface::colour(cfg.cylinder_colour)
            }],
            placements: spinner_instance(Role::Cylinder).into_iter().collect(),
            casts_shadow: true,
            receives_shadow: false,
        };

        let lamp = Prop {
            role: Role::Lamp,
            shape: Shape::Sphere {
                radius: state.lamp.radius,
                width_segments: cfg.lamp_segments.0,
                height_segments: cfg.lamp_segments.1,
            },
            shading: Shading::Unlit,
            surfaces: lamp_surfaces(cfg.lamp_on_colour, cfg.lamp_off_colour),
            placements: vec![placed([
                state.lamp.position.x,
                state.lamp.position.y,
                state.lamp.position.z,
            ])],
            casts_shadow: false,
            receives_shadow: false,
        };

        let fireflies = Prop {
            role: Role::Firefly,
            shape: Shape::Sphere {
                radius: cfg.firefly_radius,
                width_segments: cfg.firefly_segments.0,
                height_segments: cfg.firefly_segments.1,
            },
            shading: Shading::Lit,
            surfaces: vec![Surface {
                emissive: cfg.firefly_emissive,
                emissive_intensity: cfg.firefly_emissive_intensity,
                ..Surface::colour(cfg.firefly_colour)
            }],
            placements: state.swarm.instances(),
            casts_shadow: false,
            receives_shadow: false,
        };

        let sun = Prop {
            role: Role::Sun,
            shape: Shape::Sphere {
                radius: cfg.sun_radius,
                width_segments: cfg.sun_segments.0,
                height_segments: cfg.sun_segments.1,
            },
            shading: Shading::Unlit,
            surfaces: vec![Surface::colour(cfg.sun_colour)],
            placements: vec![placed([
                state.sun.position.x,
                state.sun.position.y,
                state.sun.position.z,
            ])],
            casts_shadow: false,
            receives_shadow: false,
        };

        Self {
            props: vec![ground, cube, cylinder, lamp, fireflies, sun],
            lights: state.scene_lights(),
            background: AssetId::Skybox,
            models: cfg.models.clone(),
            camera: cfg.camera.clone(),
        }
    }

    pub fn prop(&self, role: Role) -> Option<&Prop> {
        self.props.iter().find(|prop| prop.role == role)
    }

    /// How many instances of `role` are placed.
    pub fn count(&self, role: Role) -> usize {
        self.props
            .iter()
            .filter(|prop| prop.role == role)
            .map(|prop| prop.placements.len())
            .sum()
    }

    /// Textures the props wait for.
    pub fn textures(&self) -> Vec<AssetId> {
        let mut textures: Vec<AssetId> = self
            .props
            .iter()
            .flat_map(|prop| prop.surfaces.iter().filter_map(|surface| surface.texture))
            .chain(std::iter::once(self.background))
            .collect();
        textures.sort();
        textures.dedup();
        textures
    }
}
