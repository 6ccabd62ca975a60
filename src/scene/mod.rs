//! The firefly grove.
//!
//! [`GroveState`] is everything that changes while the scene runs. It knows
//! nothing about the GPU: the per-frame [`step`](GroveState::step), the click
//! toggle and the light list are plain data transformations. The
//! [`grove::GroveFlow`] owns the GPU side and mirrors the state into instance
//! buffers and the light uniform every frame.

use cgmath::Point3;
use instant::Duration;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    data_structures::colour::linear_rgb,
    flow::{FlowConstructor, GraphicsFlow},
    pipelines::light::{DirectionalLight, Fog, PointLight, SceneLights, SpotLight},
    resources::asset::AssetTracker,
    scene::{
        animator::{Orbit, Spinner},
        config::{AssetId, GroveConfig, Role},
        fireflies::Swarm,
        grove::{GroveEvent, GroveFlow},
        toggle::ToggleLight,
    },
};

pub mod animator;
pub mod assembly;
pub mod config;
pub mod fireflies;
pub mod grove;
pub mod toggle;

#[derive(Clone, Debug)]
pub struct GroveState {
    pub config: GroveConfig,
    pub swarm: Swarm,
    pub spinners: Vec<Spinner>,
    pub sun: Orbit,
    pub lamp: ToggleLight,
    pub assets: AssetTracker<AssetId>,
    pub elapsed: Duration,
    pub frames: u64,
}

impl GroveState {
    pub fn new<R: rand::Rng + ?Sized>(config: GroveConfig, rng: &mut R) -> Self {
        let swarm = Swarm::scatter(rng, &config);
        Self::with_swarm(config, swarm)
    }

    /// Build the state around an existing swarm instead of scattering one.
    pub fn with_swarm(config: GroveConfig, swarm: Swarm) -> Self {
        let spinners = vec![
            Spinner::new(Role::Cube, config.cube_position.into(), config.spin_delta),
            Spinner::new(Role::Cylinder, config.cylinder_position.into(), config.spin_delta),
        ];
        let sun = Orbit::new(config.orbit_radius, config.orbit_period_ms);
        let lamp = ToggleLight::new(&config);
        Self {
            config,
            swarm,
            spinners,
            sun,
            lamp,
            assets: AssetTracker::new(),
            elapsed: Duration::ZERO,
            frames: 0,
        }
    }

    pub fn from_config(config: GroveConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, &mut rng)
    }

    /// Advance the scene by one frame that took `dt`.
    pub fn step(&mut self, dt: Duration) {
        self.swarm.step();
        self.spinners.iter_mut().for_each(Spinner::step);
        self.elapsed += dt;
        // the orbit is periodic, wrapping keeps the f32 angle precise on long runs
        let period = f64::from(self.sun.period_ms);
        let elapsed_ms = (self.elapsed.as_secs_f64() * 1000.0) % period;
        self.sun.set_elapsed(elapsed_ms as f32);
        self.frames += 1;
    }

    pub fn spinner(&self, role: Role) -> Option<&Spinner> {
        self.spinners.iter().find(|spinner| spinner.role == role)
    }

    /// Every light of the grove as it should be uploaded this frame.
    pub fn scene_lights(&self) -> SceneLights {
        let cfg = &self.config;
        let firefly = &cfg.firefly_light;
        let points = self
            .swarm
            .positions()
            .map(|position| PointLight {
                position,
                colour: linear_rgb(firefly.colour),
                intensity: firefly.intensity,
                range: firefly.range,
                visible: true,
            })
            .chain(std::iter::once(self.lamp.point_light()))
            .collect();

        let spot = self
            .assets
            .is_loaded(AssetId::MasterSword)
            .then(|| {
                let target = cfg
                    .placement(AssetId::MasterSword)
                    .map(|placement| Point3::from(placement.position))
                    .unwrap_or(Point3::new(0.0, 0.0, 0.0));
                SpotLight {
                    position: cfg.spot.position.into(),
                    target,
                    colour: linear_rgb(cfg.spot.colour),
                    intensity: cfg.spot.intensity,
                    range: cfg.spot.range,
                    angle: cfg.spot.angle,
                    penumbra: cfg.spot.penumbra,
                    decay: cfg.spot.decay,
                    casts_shadow: true,
                }
            });

        SceneLights {
            ambient: [0.0; 3],
            fog: Fog {
                colour: linear_rgb(cfg.fog.colour),
                near: cfg.fog.near,
                far: cfg.fog.far,
            },
            sun: DirectionalLight {
                position: self.sun.position,
                colour: linear_rgb(cfg.sun_light_colour),
                intensity: cfg.sun_light_intensity,
                visible: true,
                casts_shadow: true,
            },
            spot,
            points,
        }
    }
}

impl Default for GroveState {
    fn default() -> Self {
        Self::from_config(GroveConfig::default())
    }
}

/// Open the grove window and run until it is closed.
pub fn run() -> anyhow::Result<()> {
    let grove: FlowConstructor<GroveState, GroveEvent> = Box::new(|ctx| {
        Box::pin(async move { Box::new(GroveFlow::new(ctx)) as Box<dyn GraphicsFlow<_, _>> })
    });
    crate::flow::run(vec![grove])
}
