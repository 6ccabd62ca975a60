//! The firefly swarm.
//!
//! Fireflies are scattered once and then drift along a fixed velocity
//! forever. There is no bounds check; a firefly that leaves the grove keeps
//! going.

use cgmath::{Point3, Vector3};
use rand::Rng;

use crate::{data_structures::instance::Instance, scene::config::GroveConfig};

#[derive(Clone, Debug, PartialEq)]
pub struct Firefly {
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
}

impl Firefly {
    fn scatter<R: Rng + ?Sized>(rng: &mut R, cfg: &GroveConfig) -> Self {
        let area = cfg.firefly_area;
        let speed = cfg.firefly_speed;
        let position = Point3::new(
            (rng.r#gen::<f32>() - 0.5) * area,
            rng.r#gen::<f32>() * cfg.firefly_max_height,
            (rng.r#gen::<f32>() - 0.5) * area,
        );
        let velocity = Vector3::new(
            (rng.r#gen::<f32>() - 0.5) * speed,
            (rng.r#gen::<f32>() - 0.5) * speed,
            (rng.r#gen::<f32>() - 0.5) * speed,
        );
        Self { position, velocity }
    }

    pub fn step(&mut self) {
        self.position += self.velocity;
    }

    pub fn instance(&self) -> Instance {
        Instance::from(Vector3::new(self.position.x, self.position.y, self.position.z))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Swarm {
    pub fireflies: Vec<Firefly>,
}

impl Swarm {
    pub fn from_fireflies(fireflies: Vec<Firefly>) -> Self {
        Self { fireflies }
    }

    /// Place `cfg.firefly_count` fireflies at random.
    pub fn scatter<R: Rng + ?Sized>(rng: &mut R, cfg: &GroveConfig) -> Self {
        let fireflies = (0..cfg.firefly_count)
            .map(|_| Firefly::scatter(rng, cfg))
            .collect();
        Self { fireflies }
    }

    pub fn step(&mut self) {
        self.fireflies.iter_mut().for_each(Firefly::step);
    }

    pub fn len(&self) -> usize {
        self.fireflies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fireflies.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.fireflies.iter().map(|firefly| firefly.position)
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.fireflies.iter().map(Firefly::instance).collect()
    }
}
