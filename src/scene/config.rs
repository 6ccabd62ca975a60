//! Every constant the grove is built from.
//!
//! Colours are sRGB `0xrrggbb` values, distances are world units and angles
//! are radians unless a field name says otherwise.

use std::f32::consts::FRAC_PI_4;

/// What a piece of the scene is. Used to find props and spinners again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Ground,
    Cube,
    Cylinder,
    Lamp,
    Firefly,
    Sun,
}

/// Files fetched after start-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetId {
    FloorTexture,
    Skybox,
    NaviTexture,
    MasterSword,
    Forest,
    Link,
}

impl AssetId {
    pub const ALL: [AssetId; 6] = [
        AssetId::FloorTexture,
        AssetId::Skybox,
        AssetId::NaviTexture,
        AssetId::MasterSword,
        AssetId::Forest,
        AssetId::Link,
    ];

    /// Path below the asset root.
    pub fn path(self) -> &'static str {
        match self {
            AssetId::FloorTexture => "textures/floor/acacia.jpg",
            AssetId::Skybox => "textures/skybox/Zelda.jpg",
            AssetId::NaviTexture => "textures/Navi.png",
            AssetId::MasterSword => "models/master_sword.glb",
            AssetId::Forest => "models/low_poly_forest.glb",
            AssetId::Link => "models/link.glb",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLightSpec {
    pub colour: u32,
    pub intensity: f32,
    pub range: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpotLightSpec {
    pub position: [f32; 3],
    pub colour: u32,
    pub intensity: f32,
    pub range: f32,
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FogSpec {
    pub colour: u32,
    pub near: f32,
    pub far: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraSpec {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub damping: f32,
}

/// Where a loaded glTF model is put.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPlacement {
    pub asset: AssetId,
    pub position: [f32; 3],
    pub scale: f32,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroveConfig {
    /// Fixed seed for the firefly scatter. `None` draws one from the OS.
    pub seed: Option<u64>,

    pub firefly_count: usize,
    pub firefly_area: f32,
    pub firefly_max_height: f32,
    pub firefly_speed: f32,
    pub firefly_radius: f32,
    pub firefly_segments: (u32, u32),
    pub firefly_colour: u32,
    pub firefly_emissive: u32,
    pub firefly_emissive_intensity: f32,
    pub firefly_light: PointLightSpec,

    pub lamp_position: [f32; 3],
    pub lamp_radius: f32,
    pub lamp_segments: (u32, u32),
    pub lamp_on_colour: u32,
    pub lamp_off_colour: u32,
    pub lamp_light: PointLightSpec,

    pub orbit_radius: f32,
    pub orbit_period_ms: f32,
    pub sun_radius: f32,
    pub sun_segments: (u32, u32),
    pub sun_colour: u32,
    pub sun_light_colour: u32,
    pub sun_light_intensity: f32,

    pub spin_delta: f32,

    pub ground_size: f32,
    pub ground_repeat: f32,
    pub ground_height: f32,

    pub cube_size: f32,
    pub cube_position: [f32; 3],

    pub cylinder_radius: f32,
    pub cylinder_height: f32,
    pub cylinder_segments: u32,
    pub cylinder_position: [f32; 3],
    pub cylinder_colour: u32,
    pub cylinder_metalness: f32,
    pub cylinder_roughness: f32,

    pub spot: SpotLightSpec,
    pub fog: FogSpec,
    pub camera: CameraSpec,
    pub models: Vec<ModelPlacement>,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            seed: None,

            firefly_count: 50,
            firefly_area: 100.0,
            firefly_max_height: 5.0,
            firefly_speed: 0.02,
            firefly_radius: 0.5,
            firefly_segments: (10, 10),
            firefly_colour: 0x000000,
            firefly_emissive: 0xffff99,
            firefly_emissive_intensity: 20.0,
            firefly_light: PointLightSpec {
                colour: 0xffff99,
                intensity: 10.0,
                range: 5.0,
            },

            lamp_position: [2.0, 24.0, -6.0],
            lamp_radius: 2.0,
            lamp_segments: (64, 64),
            lamp_on_colour: 0xffff00,
            lamp_off_colour: 0x555555,
            lamp_light: PointLightSpec {
                colour: 0xffff00,
                intensity: 15.0,
                range: 15.0,
            },

            orbit_radius: 500.0,
            orbit_period_ms: 30_000.0,
            sun_radius: 100.0,
            // a sphere this far away shows no facets at 128 segments
            sun_segments: (128, 128),
            sun_colour: 0xffcc00,
            sun_light_colour: 0xffffff,
            sun_light_intensity: 5.0,

            spin_delta: 0.01,

            ground_size: 150.0,
            ground_repeat: 10.0,
            ground_height: 1.0,

            cube_size: 5.0,
            cube_position: [8.0, 15.0, 3.0],

            cylinder_radius: 2.0,
            cylinder_height: 10.0,
            cylinder_segments: 32,
            cylinder_position: [-2.0, 15.0, -6.0],
            cylinder_colour: 0x3498db,
            cylinder_metalness: 0.5,
            cylinder_roughness: 0.5,

            spot: SpotLightSpec {
                position: [0.0, 80.0, -40.0],
                colour: 0xffffff,
                intensity: 50.0,
                range: 200.0,
                angle: FRAC_PI_4,
                penumbra: 0.5,
                decay: 1.0,
            },
            fog: FogSpec {
                colour: 0xffffff,
                near: 10.0,
                far: 150.0,
            },
            camera: CameraSpec {
                position: [0.0, 3.0, 10.0],
                target: [0.0, 0.0, 0.0],
                fov_degrees: 75.0,
                znear: 0.1,
                zfar: 1000.0,
                damping: 0.25,
            },
            models: vec![
                ModelPlacement {
                    asset: AssetId::MasterSword,
                    position: [0.0, 1.0, -40.0],
                    scale: 6.0,
                    casts_shadow: true,
                    receives_shadow: true,
                },
                ModelPlacement {
                    asset: AssetId::Forest,
                    position: [0.0, -90.0, -100.0],
                    scale: 0.1,
                    casts_shadow: false,
                    receives_shadow: false,
                },
                ModelPlacement {
                    asset: AssetId::Link,
                    position: [0.0, 2.0, 10.0],
                    scale: 15.0,
                    casts_shadow: false,
                    receives_shadow: false,
                },
            ],
        }
    }
}

impl GroveConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn placement(&self, asset: AssetId) -> Option<&ModelPlacement> {
        self.models.iter().find(|placement| placement.asset == asset)
    }
}
