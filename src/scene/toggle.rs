//! The clickable lamp.

use cgmath::Point3;

use crate::{
    camera::Ray,
    data_structures::colour::linear_rgb,
    pipelines::light::PointLight,
    scene::config::GroveConfig,
};

/// Material slot of the proxy sphere while the lamp is on.
pub const SLOT_ON: usize = 0;
/// Material slot of the proxy sphere while the lamp is off.
pub const SLOT_OFF: usize = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct ToggleLight {
    on: bool,
    pub position: Point3<f32>,
    pub radius: f32,
    pub colour: u32,
    pub intensity: f32,
    pub range: f32,
}

impl ToggleLight {
    /// The lamp starts switched on.
    pub fn new(cfg: &GroveConfig) -> Self {
        let [x, y, z] = cfg.lamp_position;
        Self {
            on: true,
            position: Point3::new(x, y, z),
            radius: cfg.lamp_radius,
            colour: cfg.lamp_light.colour,
            intensity: cfg.lamp_light.intensity,
            range: cfg.lamp_light.range,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the lamp if `ray` hits its proxy sphere.
    ///
    /// Returns whether the lamp flipped. A miss leaves it as it was.
    pub fn handle_click(&mut self, ray: &Ray) -> bool {
        if ray.intersect_sphere(self.position, self.radius).is_none() {
            return false;
        }
        self.on = !self.on;
        log::info!("Lamp switched {}", if self.on { "on" } else { "off" });
        true
    }

    pub fn material_slot(&self) -> usize {
        if self.on { SLOT_ON } else { SLOT_OFF }
    }

    pub fn point_light(&self) -> PointLight {
        PointLight {
            position: self.position,
            colour: linear_rgb(self.colour),
            intensity: self.intensity,
            range: self.range,
            visible: self.on,
        }
    }
}
